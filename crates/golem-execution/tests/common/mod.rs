#![allow(dead_code)]

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use golem_common::config::AppConfig;
use golem_execution::connection::Connection;
use golem_execution::error::{ExecutionError, ExecutionResult};
use golem_execution::id::{JobId, NodeId};
use golem_execution::job::{JobDetails, Task};
use golem_execution::master::{Master, MasterOptions};
use golem_execution::protocol::{MessageKind, UnitOutcome, WorkUnit, WorkerMessage};
use golem_execution::store::MemoryJobStore;
use golem_server::actor::ActorSystem;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn test_config(log_dir: &Path, dispatch_queue_size: usize) -> ExecutionResult<AppConfig> {
    let mut config = AppConfig::load()?;
    config.job.log_dir = log_dir.to_string_lossy().into_owned();
    config.master.dispatch_queue_size = dispatch_queue_size;
    Ok(config)
}

pub fn start_master(config: &AppConfig) -> (ActorSystem, Master) {
    let mut system = ActorSystem::new();
    let options = MasterOptions::new(config, Arc::new(MemoryJobStore::new()));
    let master = Master::start(&mut system, options);
    (system, master)
}

pub fn task(count: u64, args: &[&str]) -> Task {
    Task::new(count, args.iter().map(|x| x.to_string()).collect())
}

pub async fn within<F, T>(future: F) -> ExecutionResult<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TIMEOUT, future)
        .await
        .map_err(|_| ExecutionError::internal("timed out"))
}

/// Polls the job until its details satisfy the predicate.
pub async fn wait_for_job(
    master: &Master,
    job_id: JobId,
    predicate: impl Fn(&JobDetails) -> bool,
) -> ExecutionResult<JobDetails> {
    within::<_, ExecutionResult<JobDetails>>(async {
        loop {
            let details = master.job_details(job_id).await?;
            if predicate(&details) {
                return Ok(details);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?
}

/// Pulls a work unit from the dispatch queue as a worker would.
pub async fn pull(master: &Master) -> ExecutionResult<WorkUnit> {
    within(master.dispatch_queue().pull())
        .await?
        .ok_or_else(|| ExecutionError::internal("the dispatch queue is closed"))
}

/// A scripted worker on the far side of an in-memory connection.
pub struct FakeWorker {
    pub connection: Connection,
}

impl FakeWorker {
    /// Connects a worker that has already sent `HELLO` to the master.
    pub async fn connect(
        master: &Master,
        name: &str,
        capacity: usize,
    ) -> ExecutionResult<(NodeId, Self)> {
        let (master_side, worker_side) = Connection::duplex(name, 16);
        worker_side.send(WorkerMessage::hello(capacity)).await?;
        let node_id = master.accept_worker(master_side).await?;
        Ok((
            node_id,
            Self {
                connection: worker_side,
            },
        ))
    }

    pub async fn recv(&mut self) -> ExecutionResult<WorkerMessage> {
        within(self.connection.recv())
            .await?
            .ok_or_else(|| ExecutionError::ConnectionClosed("master".to_string()))
    }

    /// Returns the next message if one arrives within a short time.
    pub async fn try_recv(&mut self) -> Option<WorkerMessage> {
        tokio::time::timeout(Duration::from_millis(100), self.connection.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn expect_start(&mut self) -> ExecutionResult<WorkUnit> {
        let message = self.recv().await?;
        if message.kind != MessageKind::Start {
            return Err(ExecutionError::internal(format!(
                "expected START but received {}",
                message.kind
            )));
        }
        message.work_unit()
    }

    pub async fn report(&self, unit: &WorkUnit, outcome: UnitOutcome) -> ExecutionResult<()> {
        self.connection
            .send(WorkerMessage::outcome(outcome, unit)?)
            .await
    }

    pub async fn send(&self, message: WorkerMessage) -> ExecutionResult<()> {
        self.connection.send(message).await
    }
}
