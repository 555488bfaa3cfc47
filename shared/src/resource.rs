use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded file, referenced by post media and video jobs.
/// The upload pipeline itself lives outside this crate; records are
/// consumed read-only here.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub path: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}
