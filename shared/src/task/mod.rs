pub mod handle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the fixed AI actions a task may request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    GenTitle,
    GenTags,
    Summarize,
    Safety,
}

/// Lifecycle state shared by AI tasks and video jobs.
///
/// `success` and `failed` are terminal; no transition ever leaves them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Success,
    Failed,
}

impl TaskStatus {
    #[inline]
    pub fn terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

/// What a task works on: free text, a post reference, or both.
/// A referenced post is re-read when the task runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskInput {
    pub post_id: Option<String>,
    pub text: Option<String>,
}

/// Outcome of the `safety` action: whether the text passed and which
/// sensitive words were hit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyVerdict {
    pub allowed: bool,
    #[serde(default)]
    pub hits: Vec<String>,
}

/// Per-action outputs, merged into the task in one write at success.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety: Option<SafetyVerdict>,
}

/// An asynchronous AI task record.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AiTask {
    pub id: String,
    pub status: TaskStatus,
    pub actions: Vec<TaskAction>,
    pub input: TaskInput,
    /// Populated exactly once, together with the `success` transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Refreshed on every persisted transition.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub play_url_mp4: String,
}

/// An asynchronous video transcode job record.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub id: String,
    /// The already-uploaded source file.
    pub file_id: String,
    pub status: TaskStatus,
    /// Monotonically non-decreasing, 0 to 100.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<VideoResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}
