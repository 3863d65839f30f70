use std::process::Stdio;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{ExecutionError, ExecutionResult};
use crate::protocol::{OutputStream, UnitOutcome, WorkUnit, WorkerMessage};

const OUTPUT_CHUNK_SIZE: usize = 8192;

/// Runs one work unit and streams its output and outcome to the master.
pub(super) async fn execute(unit: WorkUnit, sender: mpsc::Sender<WorkerMessage>) {
    let outcome = match run_process(&unit, &sender).await {
        Ok(true) => UnitOutcome::Finished,
        Ok(false) => UnitOutcome::Errored,
        Err(e) => {
            warn!(
                "failed to run work unit {} of job {}: {e}",
                unit.sequence, unit.job_id
            );
            let message = WorkerMessage::output(OutputStream::Stderr, unit.job_id, format!("{e}\n"));
            let _ = sender.send(message).await;
            UnitOutcome::Errored
        }
    };
    debug!("work unit {} of job {} {outcome}", unit.sequence, unit.job_id);
    match WorkerMessage::outcome(outcome, &unit) {
        Ok(message) => {
            if sender.send(message).await.is_err() {
                warn!("cannot report {outcome} for work unit {}: the master is gone", unit.sequence);
            }
        }
        Err(e) => warn!("failed to encode work unit {}: {e}", unit.sequence),
    }
}

/// Returns whether the process exited successfully.
async fn run_process(unit: &WorkUnit, sender: &mpsc::Sender<WorkerMessage>) -> ExecutionResult<bool> {
    let Some((program, args)) = unit.args.split_first() else {
        return Err(ExecutionError::invalid("the work unit has no command"));
    };
    let mut child = Command::new(program)
        .args(args)
        .env("GOLEM_JOB_ID", unit.job_id.to_string())
        .env("GOLEM_LINE_ID", unit.line_id.to_string())
        .env("GOLEM_SEQUENCE", unit.sequence.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    let stdout = forward(
        child.stdout.take(),
        OutputStream::Stdout,
        unit,
        sender.clone(),
    );
    let stderr = forward(
        child.stderr.take(),
        OutputStream::Stderr,
        unit,
        sender.clone(),
    );
    let (status, _, _) = tokio::join!(child.wait(), stdout, stderr);
    Ok(status?.success())
}

async fn forward<R>(
    reader: Option<R>,
    stream: OutputStream,
    unit: &WorkUnit,
    sender: mpsc::Sender<WorkerMessage>,
) where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buffer = vec![0u8; OUTPUT_CHUNK_SIZE];
    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buffer[..n]).into_owned();
                if sender
                    .send(WorkerMessage::output(stream, unit.job_id, chunk))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                warn!("failed to read output of work unit {}: {e}", unit.sequence);
                break;
            }
        }
    }
}
