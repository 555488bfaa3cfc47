use serde::{Deserialize, Serialize};

use super::TaskAction;

/// Submit an AI task over free text and/or a referenced post.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskDescriptor {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Must not be empty.
    pub actions: Vec<TaskAction>,
}

/// Submit a transcode job for an uploaded file.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobDescriptor {
    pub file_id: String,
}
