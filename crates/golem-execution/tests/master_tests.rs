mod common;

use common::{pull, start_master, task, test_config, wait_for_job};
use golem_execution::error::{ExecutionError, ExecutionResult};
use golem_execution::job::{JobMetadata, JobState, JobStatus};
use golem_execution::protocol::UnitOutcome;

#[tokio::test]
async fn test_list_jobs_in_creation_order() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;
    let (_system, master) = start_master(&config);

    let metadata = JobMetadata {
        owner: Some("alice".to_string()),
        label: Some("render".to_string()),
        job_type: Some("batch".to_string()),
    };
    let first = master
        .create_job(metadata, vec![task(1, &["true"]), task(2, &["false"])])
        .await?;
    let second = master
        .create_job(JobMetadata::default(), vec![task(0, &["true"])])
        .await?;
    wait_for_job(&master, second, |x| x.is_complete()).await?;

    let jobs = master.list_jobs().await?;
    assert_eq!(
        jobs.iter().map(|x| x.job_id).collect::<Vec<_>>(),
        vec![first, second]
    );
    assert_eq!(jobs[0].owner, "alice");
    assert_eq!(jobs[0].label, "render");
    assert_eq!(jobs[0].job_type, "batch");
    assert_eq!(jobs[0].state, JobState::Running);
    assert_eq!(jobs[0].progress.total, 3);
    assert_eq!(jobs[1].state, JobState::Complete);
    Ok(())
}

#[tokio::test]
async fn test_remove_job_falls_back_to_store() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;
    let (_system, master) = start_master(&config);

    let job_id = master
        .create_job(JobMetadata::default(), vec![task(1, &["true"])])
        .await?;
    assert!(matches!(
        master.remove_job(job_id).await,
        Err(ExecutionError::InvalidArgument(_))
    ));

    let unit = pull(&master).await?;
    master
        .job(job_id)
        .await?
        .record_outcome(unit, UnitOutcome::Finished)
        .await?;
    let completed = wait_for_job(&master, job_id, |x| x.is_complete()).await?;

    master.remove_job(job_id).await?;
    assert!(matches!(
        master.job(job_id).await,
        Err(ExecutionError::JobNotFound(_))
    ));
    let details = master.job_details(job_id).await?;
    assert_eq!(details, completed);
    assert_eq!(details.status, JobStatus::Success);
    assert_eq!(master.list_jobs().await?, vec![completed]);
    Ok(())
}

#[tokio::test]
async fn test_shutdown_stops_coordinators() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;
    let (system, master) = start_master(&config);

    let job_id = master
        .create_job(JobMetadata::default(), vec![task(5, &["true"])])
        .await?;
    let job = master.job(job_id).await?;
    master.shutdown().await?;
    system.join().await;

    assert!(job.is_stopped());
    assert!(master.job(job_id).await.is_err());
    Ok(())
}
