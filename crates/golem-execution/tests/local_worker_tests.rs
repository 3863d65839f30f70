#![cfg(unix)]

mod common;

use common::{start_master, task, test_config, wait_for_job, within};
use golem_execution::connection::Connection;
use golem_execution::error::ExecutionResult;
use golem_execution::id::JobId;
use golem_execution::job::{JobMetadata, JobStatus, Progress};
use golem_execution::local::{LocalWorker, LocalWorkerOptions};
use golem_execution::protocol::{MessageKind, WorkerMessage};

#[tokio::test]
async fn test_local_worker_runs_processes() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;
    let (_system, master) = start_master(&config);

    let (master_side, worker_side) = Connection::duplex("local-0", 16);
    let worker = LocalWorker::new(LocalWorkerOptions::new(&config, 2), worker_side);
    let worker = tokio::spawn(worker.run());
    let node_id = master.accept_worker(master_side).await?;
    assert_eq!(master.worker(node_id).await?.stats().capacity, 2);

    let job_id = master
        .create_job(
            JobMetadata::default(),
            vec![
                task(2, &["sh", "-c", "echo unit $GOLEM_SEQUENCE"]),
                task(1, &["sh", "-c", "echo oops >&2; exit 3"]),
                task(1, &["/nonexistent/golem-test-program"]),
            ],
        )
        .await?;
    let details = wait_for_job(&master, job_id, |x| x.is_complete()).await?;
    assert_eq!(details.status, JobStatus::Success);
    assert_eq!(
        details.progress,
        Progress {
            finished: 2,
            errored: 2,
            total: 4
        }
    );

    assert_eq!(master.kill_all(), 1);
    within(worker).await???;
    master.shutdown().await?;

    let out = tokio::fs::read_to_string(dir.path().join(format!("{job_id}.out.txt"))).await?;
    let mut lines = out.lines().collect::<Vec<_>>();
    lines.sort();
    assert_eq!(lines, vec!["unit 0", "unit 1"]);
    let err = tokio::fs::read_to_string(dir.path().join(format!("{job_id}.err.txt"))).await?;
    assert!(err.contains("oops"));
    Ok(())
}

#[tokio::test]
async fn test_local_worker_sends_hello() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;

    let (mut master_side, worker_side) = Connection::duplex("local-0", 4);
    let worker = LocalWorker::new(LocalWorkerOptions::new(&config, 3), worker_side);
    let worker = tokio::spawn(worker.run());

    let hello = within(master_side.recv()).await?;
    assert_eq!(hello.as_ref().map(|x| x.kind), Some(MessageKind::Hello));
    assert_eq!(hello.map(|x| x.body), Some("3".to_string()));

    master_side.send(WorkerMessage::restart()).await?;
    master_side.send(WorkerMessage::die()).await?;
    within(worker).await???;
    Ok(())
}

#[tokio::test]
async fn test_local_worker_reports_invalid_work_unit() -> ExecutionResult<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path(), 16)?;

    let (mut master_side, worker_side) = Connection::duplex("local-0", 4);
    let worker = LocalWorker::new(LocalWorkerOptions::new(&config, 1), worker_side);
    let worker = tokio::spawn(worker.run());
    let hello = within(master_side.recv()).await?;
    assert_eq!(hello.map(|x| x.kind), Some(MessageKind::Hello));

    let job_id = JobId::generate();
    master_side
        .send(WorkerMessage::new(MessageKind::Start, Some(job_id), "not a unit"))
        .await?;
    let reply = within(master_side.recv()).await?;
    assert_eq!(
        reply,
        Some(WorkerMessage::new(
            MessageKind::JobError,
            Some(job_id),
            "not a unit"
        ))
    );

    master_side.send(WorkerMessage::die()).await?;
    within(worker).await???;
    Ok(())
}
