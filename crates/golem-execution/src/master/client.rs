use std::sync::Arc;

use golem_server::actor::{ActorHandle, ActorSystem};
use log::info;
use tokio::sync::{broadcast, oneshot};

use crate::connection::Connection;
use crate::error::{ExecutionError, ExecutionResult};
use crate::id::{JobId, NodeId};
use crate::job::{JobCoordinator, JobDetails, JobMetadata, Task};
use crate::master::actor::MasterActor;
use crate::master::event::MasterEvent;
use crate::master::options::MasterOptions;
use crate::protocol::WorkerMessage;
use crate::queue::DispatchQueue;
use crate::store::JobStore;
use crate::worker::WorkerHandle;

/// A cloneable client for the master.
///
/// The master ties job coordinators to worker handles through one shared
/// dispatch queue and keeps a registry of both.
#[derive(Clone)]
pub struct Master {
    handle: ActorHandle<MasterActor>,
    queue: DispatchQueue,
    broadcast: broadcast::Sender<WorkerMessage>,
    store: Arc<dyn JobStore>,
}

impl Master {
    pub fn start(system: &mut ActorSystem, options: MasterOptions) -> Self {
        let queue = options.queue.clone();
        let broadcast = options.broadcast.clone();
        let store = Arc::clone(&options.store);
        Self {
            handle: system.spawn(options),
            queue,
            broadcast,
            store,
        }
    }

    pub fn dispatch_queue(&self) -> &DispatchQueue {
        &self.queue
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<WorkerMessage> {
        self.broadcast.subscribe()
    }

    pub async fn create_job(&self, metadata: JobMetadata, tasks: Vec<Task>) -> ExecutionResult<JobId> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(MasterEvent::CreateJob {
                metadata,
                tasks,
                result: tx,
            })
            .await?;
        rx.await?
    }

    pub async fn job(&self, job_id: JobId) -> ExecutionResult<JobCoordinator> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(MasterEvent::GetJob { job_id, result: tx })
            .await?;
        rx.await?
    }

    /// Returns a copy of the job details from the coordinator if the job is registered,
    /// or from the job store otherwise.
    pub async fn job_details(&self, job_id: JobId) -> ExecutionResult<JobDetails> {
        match self.job(job_id).await {
            Ok(job) => job.snapshot().await,
            Err(ExecutionError::JobNotFound(_)) => self.store.get(&job_id),
            Err(e) => Err(e),
        }
    }

    pub async fn stop_job(&self, job_id: JobId) -> ExecutionResult<bool> {
        self.job(job_id).await?.stop().await
    }

    /// Lists all jobs in creation order.
    pub async fn list_jobs(&self) -> ExecutionResult<Vec<JobDetails>> {
        let (tx, rx) = oneshot::channel();
        self.handle.send(MasterEvent::ListJobs { result: tx }).await?;
        let mut jobs = self.store.all()?;
        for job in rx.await? {
            let snapshot = job.snapshot().await?;
            if let Some(x) = jobs.iter_mut().find(|x| x.job_id == snapshot.job_id) {
                *x = snapshot;
            }
        }
        Ok(jobs)
    }

    /// Removes a completed job from the registry.
    /// Its details remain available from the job store.
    pub async fn remove_job(&self, job_id: JobId) -> ExecutionResult<()> {
        let details = self.job_details(job_id).await?;
        if !details.is_complete() {
            return Err(ExecutionError::invalid(format!(
                "cannot remove job {job_id} that is not complete"
            )));
        }
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(MasterEvent::RemoveJob { job_id, result: tx })
            .await?;
        rx.await??.shutdown().await;
        Ok(())
    }

    /// Performs the handshake on a new worker connection and registers the worker.
    pub async fn accept_worker(&self, connection: Connection) -> ExecutionResult<NodeId> {
        let worker = WorkerHandle::connect(connection, self.clone()).await?;
        let node_id = worker.node_id();
        self.handle
            .send(MasterEvent::RegisterWorker { worker })
            .await?;
        Ok(node_id)
    }

    pub(crate) async fn deregister_worker(&self, node_id: NodeId) -> ExecutionResult<()> {
        self.handle
            .send(MasterEvent::DeregisterWorker { node_id })
            .await?;
        Ok(())
    }

    pub async fn worker(&self, node_id: NodeId) -> ExecutionResult<WorkerHandle> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(MasterEvent::GetWorker { node_id, result: tx })
            .await?;
        rx.await?
    }

    pub async fn workers(&self) -> ExecutionResult<Vec<WorkerHandle>> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(MasterEvent::ListWorkers { result: tx })
            .await?;
        Ok(rx.await?)
    }

    pub async fn resize_worker(&self, node_id: NodeId, capacity: usize) -> ExecutionResult<()> {
        self.worker(node_id).await?.resize(capacity).await
    }

    /// Sends a message to every connected worker.
    /// Returns the number of workers that were subscribed.
    pub fn broadcast(&self, message: WorkerMessage) -> usize {
        // The send fails only when there are no subscribers.
        self.broadcast.send(message).unwrap_or(0)
    }

    pub fn restart_all(&self) -> usize {
        let count = self.broadcast(WorkerMessage::restart());
        info!("asked {count} workers to restart");
        count
    }

    pub fn kill_all(&self) -> usize {
        let count = self.broadcast(WorkerMessage::die());
        info!("asked {count} workers to terminate");
        count
    }

    /// Stops the master, its job coordinators, and its worker handles.
    pub async fn shutdown(&self) -> ExecutionResult<()> {
        self.handle.send(MasterEvent::Shutdown).await?;
        self.handle.clone().wait_for_stop().await;
        Ok(())
    }
}
