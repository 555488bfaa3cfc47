//! The asynchronous video transcode job engine.
//!
//! Same lifecycle shape as the AI task engine with a fixed progress
//! schedule instead of heterogeneous actions. Progress is persisted
//! after every step, so a concurrent poller observes each checkpoint in
//! order and never sees a regression.

use chrono::Utc;
use nanoid::nanoid;
use showcase_shared::task::handle::SubmitJobDescriptor;
use showcase_shared::task::{TaskStatus, VideoJob, VideoResult};

use crate::{store, Error};

/// Progress checkpoints persisted one by one while "transcoding".
const PROGRESS_SCHEDULE: [u8; 7] = [10, 25, 45, 65, 80, 92, 100];

#[cfg(not(test))]
const STEP_DELAY: std::time::Duration = std::time::Duration::from_millis(350);
#[cfg(test)]
const STEP_DELAY: std::time::Duration = std::time::Duration::from_millis(5);

/// Enqueue a transcode job for an uploaded file, returning its id
/// immediately; the work happens in a detached worker.
pub async fn submit(descriptor: SubmitJobDescriptor) -> crate::Result<String> {
    if descriptor.file_id.is_empty() {
        return Err(Error::EmptyFileId);
    }

    let now = Utc::now();
    let job = VideoJob {
        id: nanoid!(),
        file_id: descriptor.file_id,
        status: TaskStatus::Queued,
        progress: 0,
        result: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    let id = job.id.clone();

    store::INSTANCE
        .update({
            let job = job.clone();
            move |data| {
                data.video_jobs.push(job);
                Ok(())
            }
        })
        .await?;

    tokio::spawn(process(job));
    Ok(id)
}

/// Fetch a job record.
pub async fn status(job_id: &str) -> crate::Result<VideoJob> {
    store::INSTANCE
        .read()
        .await
        .video_jobs
        .iter()
        .find(|j| j.id == job_id)
        .cloned()
        .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
}

/// Replace the persisted record for this job, refreshing `updated_at`.
async fn write_job(mut job: VideoJob) -> crate::Result<VideoJob> {
    job.updated_at = Utc::now();
    store::INSTANCE
        .update({
            let job = job.clone();
            move |data| {
                data.video_jobs.retain(|j| j.id != job.id);
                data.video_jobs.push(job);
                Ok(())
            }
        })
        .await?;
    Ok(job)
}

/// Background worker; the single owner of this job's transitions.
async fn process(job: VideoJob) {
    let id = job.id.clone();
    if let Err(err) = transcode(job).await {
        mark_failed(&id, err).await;
    }
}

async fn transcode(mut job: VideoJob) -> crate::Result<()> {
    job.status = TaskStatus::Processing;
    job = write_job(job).await?;

    for checkpoint in PROGRESS_SCHEDULE {
        tokio::time::sleep(STEP_DELAY).await;
        job.progress = checkpoint;
        job = write_job(job).await?;
    }

    job.status = TaskStatus::Success;
    job.result = Some(VideoResult {
        play_url_mp4: format!("/files/{}", job.file_id),
    });
    write_job(job).await?;
    Ok(())
}

/// Terminate the job as `failed`; progress stops where it was.
async fn mark_failed(job_id: &str, err: Error) {
    tracing::warn!("video job {job_id} failed: {err}");
    let message = err.to_string();
    let job_id = job_id.to_string();
    let outcome = store::INSTANCE
        .update(move |data| {
            if let Some(job) = data.video_jobs.iter_mut().find(|j| j.id == job_id) {
                job.status = TaskStatus::Failed;
                job.error = Some(message);
                job.updated_at = Utc::now();
            }
            Ok(())
        })
        .await;
    if let Err(err) = outcome {
        tracing::error!("job failure could not be persisted: {err}");
    }
}
