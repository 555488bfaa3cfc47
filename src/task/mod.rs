//! The asynchronous AI task engine.
//!
//! A submitted task is persisted in `queued` state and handed to a
//! detached worker that owns every later transition of its record:
//! `queued -> processing -> success | failed`. Each transition is
//! persisted through the single-writer store, so pollers observe the
//! intermediate states in order. Failures inside the worker never
//! propagate to any caller; they terminate the task as `failed` and are
//! only observable by polling.

pub mod generate;

use chrono::Utc;
use nanoid::nanoid;
use showcase_shared::task::handle::SubmitTaskDescriptor;
use showcase_shared::task::{AiTask, SafetyVerdict, TaskAction, TaskInput, TaskResult, TaskStatus};

use crate::{moderation, store, Error};

/// Validate and enqueue a task, returning its id immediately.
///
/// The worker is spawned detached; the caller never observes the
/// computation's outcome synchronously.
pub async fn submit(descriptor: SubmitTaskDescriptor) -> crate::Result<String> {
    if descriptor.actions.is_empty() {
        return Err(Error::EmptyActions);
    }
    let mut actions: Vec<TaskAction> = Vec::new();
    for action in descriptor.actions {
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    let now = Utc::now();
    let task = AiTask {
        id: nanoid!(),
        status: TaskStatus::Queued,
        actions,
        input: TaskInput {
            post_id: descriptor.post_id,
            text: descriptor.text,
        },
        result: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    let id = task.id.clone();

    store::INSTANCE
        .update({
            let task = task.clone();
            move |data| {
                data.ai_tasks.push(task);
                Ok(())
            }
        })
        .await?;

    tokio::spawn(process(task));
    Ok(id)
}

/// Fetch a task record.
pub async fn get(task_id: &str) -> crate::Result<AiTask> {
    store::INSTANCE
        .read()
        .await
        .ai_tasks
        .iter()
        .find(|t| t.id == task_id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
}

/// Replace the persisted record for this task, refreshing `updated_at`.
async fn write_task(mut task: AiTask) -> crate::Result<AiTask> {
    task.updated_at = Utc::now();
    store::INSTANCE
        .update({
            let task = task.clone();
            move |data| {
                data.ai_tasks.retain(|t| t.id != task.id);
                data.ai_tasks.push(task);
                Ok(())
            }
        })
        .await?;
    Ok(task)
}

/// Background worker; the single owner of this task's transitions.
async fn process(mut task: AiTask) {
    task.status = TaskStatus::Processing;
    task = match write_task(task).await {
        Ok(task) => task,
        Err(err) => {
            tracing::error!("task transition could not be persisted: {err}");
            return;
        }
    };

    match run_actions(&task).await {
        Ok(result) => {
            task.status = TaskStatus::Success;
            task.result = Some(result);
        }
        Err(err) => {
            tracing::warn!("task {} failed: {err}", task.id);
            task.status = TaskStatus::Failed;
            task.error = Some(err.to_string());
        }
    }
    if let Err(err) = write_task(task).await {
        tracing::error!("task transition could not be persisted: {err}");
    }
}

/// Compute every requested action over the resolved input text and
/// merge the outputs into one result.
async fn run_actions(task: &AiTask) -> crate::Result<TaskResult> {
    let text = resolve_text(&task.input).await;

    let mut result = TaskResult::default();
    if task.actions.contains(&TaskAction::GenTitle) {
        result.title = Some(generate::title(&text).await?);
    }
    if task.actions.contains(&TaskAction::Summarize) {
        result.summary = Some(generate::summary(&text).await?);
    }
    if task.actions.contains(&TaskAction::GenTags) {
        result.tags = Some(generate::tags(&text).await);
    }
    if task.actions.contains(&TaskAction::Safety) {
        let outcome = moderation::check_text(&text).await;
        result.safety = Some(SafetyVerdict {
            allowed: outcome.allowed,
            hits: outcome.hits,
        });
    }
    Ok(result)
}

/// Re-read the referenced post and derive its text from title, body and
/// tags; fall back to the free-text input when there is no reference or
/// the post no longer exists.
async fn resolve_text(input: &TaskInput) -> String {
    if let Some(post_id) = &input.post_id {
        let data = store::INSTANCE.read().await;
        if let Some(post) = data.post(post_id) {
            return [
                post.title.clone().unwrap_or_default(),
                post.text.clone().unwrap_or_default(),
                post.tags.join(" "),
            ]
            .join(" ")
            .trim()
            .to_string();
        }
    }
    input.text.clone().unwrap_or_default()
}
