use super::*;

use crate::{video, Error};
use chrono::Utc;
use nanoid::nanoid;
use serial_test::serial;
use showcase_shared::resource::FileRecord;
use showcase_shared::task::handle::SubmitJobDescriptor;
use showcase_shared::task::{TaskStatus, VideoJob};

fn job_for(file_id: &str) -> SubmitJobDescriptor {
    SubmitJobDescriptor {
        file_id: file_id.to_string(),
    }
}

async fn upload_stub(name: &str) -> String {
    let record = FileRecord {
        id: nanoid!(),
        name: name.to_string(),
        mime: "video/mp4".to_string(),
        size: 1024,
        path: format!("./data/uploads/{name}"),
        created_at: Utc::now(),
    };
    let id = record.id.clone();
    store::INSTANCE
        .update(move |data| {
            data.files.push(record);
            Ok(())
        })
        .await
        .unwrap();
    id
}

async fn wait_job(id: &str) -> (VideoJob, Vec<VideoJob>) {
    let mut samples = Vec::new();
    for _ in 0..400 {
        let job = video::status(id).await.unwrap();
        let terminal = job.status.terminal();
        samples.push(job.clone());
        if terminal {
            return (job, samples);
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    panic!("job {id} never reached a terminal state");
}

#[serial]
#[tokio::test]
async fn a_job_runs_the_whole_schedule_to_success() {
    reset_all().await;
    let file_id = upload_stub("clip.mp4").await;

    let job_id = video::submit(job_for(&file_id)).await.unwrap();
    let (done, samples) = wait_job(&job_id).await;

    assert_eq!(done.status, TaskStatus::Success);
    assert_eq!(done.progress, 100);
    assert_eq!(
        done.result.unwrap().play_url_mp4,
        format!("/files/{file_id}")
    );
    assert!(done.error.is_none());

    // polled progress never regresses
    for pair in samples.windows(2) {
        assert!(pair[0].progress <= pair[1].progress);
    }
    // and a job never returns to `queued` once it started processing
    let first_processing = samples
        .iter()
        .position(|j| j.status != TaskStatus::Queued)
        .unwrap();
    assert!(samples[first_processing..]
        .iter()
        .all(|j| j.status != TaskStatus::Queued));
}

#[serial]
#[tokio::test]
async fn terminal_jobs_never_change_again() {
    reset_all().await;
    let file_id = upload_stub("stable.mp4").await;

    let job_id = video::submit(job_for(&file_id)).await.unwrap();
    let (done, _) = wait_job(&job_id).await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let again = video::status(&job_id).await.unwrap();
    assert_eq!(again.status, done.status);
    assert_eq!(again.progress, 100);
    assert_eq!(again.updated_at, done.updated_at);
}

#[serial]
#[tokio::test]
async fn submission_validates_the_file_reference() {
    reset_all().await;
    assert!(matches!(video::submit(job_for("")).await, Err(Error::EmptyFileId)));
    assert!(matches!(
        video::status("no-such-job").await,
        Err(Error::JobNotFound(_))
    ));
}

#[serial]
#[tokio::test]
async fn concurrent_jobs_keep_their_own_records() {
    reset_all().await;
    let first_file = upload_stub("first.mp4").await;
    let second_file = upload_stub("second.mp4").await;

    let first = video::submit(job_for(&first_file)).await.unwrap();
    let second = video::submit(job_for(&second_file)).await.unwrap();
    assert_ne!(first, second);

    let (first_done, _) = wait_job(&first).await;
    let (second_done, _) = wait_job(&second).await;
    assert_eq!(
        first_done.result.unwrap().play_url_mp4,
        format!("/files/{first_file}")
    );
    assert_eq!(
        second_done.result.unwrap().play_url_mp4,
        format!("/files/{second_file}")
    );
}
