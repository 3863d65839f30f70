use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};

use crate::connection::Connection;
use crate::id::{JobId, NodeId};
use crate::job::JobCoordinator;
use crate::master::Master;
use crate::protocol::{MessageKind, OutputStream, UnitOutcome, WorkUnit, WorkerMessage};
use crate::queue::DispatchQueue;
use crate::worker::handle::{WorkerControl, WorkerStats};

enum WorkerLoopEvent {
    Control(Option<WorkerControl>),
    Broadcast(Result<WorkerMessage, RecvError>),
    Inbound(Option<WorkerMessage>),
    Dispatch(WorkUnit),
}

/// The dispatch loop of one worker connection.
pub(super) struct WorkerMonitor {
    node_id: NodeId,
    hostname: String,
    connection: Connection,
    master: Master,
    queue: DispatchQueue,
    broadcast: broadcast::Receiver<WorkerMessage>,
    control: mpsc::Receiver<WorkerControl>,
    stats: WorkerStats,
    stats_sender: watch::Sender<WorkerStats>,
    /// Work units sent to the worker without a reported outcome.
    in_flight: HashMap<(JobId, u64), WorkUnit>,
    jobs: HashMap<JobId, JobCoordinator>,
}

impl WorkerMonitor {
    pub fn new(
        node_id: NodeId,
        hostname: String,
        connection: Connection,
        master: Master,
        control: mpsc::Receiver<WorkerControl>,
        stats_sender: watch::Sender<WorkerStats>,
    ) -> Self {
        let stats = *stats_sender.borrow();
        Self {
            node_id,
            hostname,
            connection,
            queue: master.dispatch_queue().clone(),
            broadcast: master.subscribe(),
            master,
            control,
            stats,
            stats_sender,
            in_flight: HashMap::new(),
            jobs: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        let reason = loop {
            let WorkerStats { capacity, running } = self.stats;
            let event = tokio::select! {
                biased;
                x = self.control.recv() => WorkerLoopEvent::Control(x),
                x = self.broadcast.recv() => WorkerLoopEvent::Broadcast(x),
                x = self.connection.recv() => WorkerLoopEvent::Inbound(x),
                Some(x) = self.queue.pull(), if running < capacity => WorkerLoopEvent::Dispatch(x),
            };
            match event {
                WorkerLoopEvent::Control(Some(WorkerControl::Resize { capacity })) => {
                    info!(
                        "worker {} on {} is resized from capacity {} to {capacity}",
                        self.node_id, self.hostname, self.stats.capacity
                    );
                    self.stats.capacity = capacity;
                    self.publish_stats();
                }
                WorkerLoopEvent::Control(Some(WorkerControl::Shutdown)) => {
                    break "shutdown requested";
                }
                WorkerLoopEvent::Control(None) => break "all handles dropped",
                WorkerLoopEvent::Broadcast(Ok(message)) => {
                    debug!("sending {} to {}", message.kind, self.hostname);
                    if self.connection.send(message).await.is_err() {
                        break "connection closed";
                    }
                }
                WorkerLoopEvent::Broadcast(Err(RecvError::Lagged(n))) => {
                    warn!("{} missed {n} broadcast messages", self.hostname);
                }
                // The sender lives in every `Master` client, including ours,
                // so the channel stays open for the lifetime of the loop.
                WorkerLoopEvent::Broadcast(Err(RecvError::Closed)) => {
                    break "broadcast channel closed";
                }
                WorkerLoopEvent::Inbound(Some(message)) => self.handle_message(message).await,
                WorkerLoopEvent::Inbound(None) => break "connection closed",
                WorkerLoopEvent::Dispatch(unit) => {
                    if !self.dispatch(unit).await {
                        break "connection closed";
                    }
                }
            }
        };
        self.teardown(reason).await;
    }

    /// Sends a work unit to the worker. Returns `false` if the connection is closed.
    async fn dispatch(&mut self, unit: WorkUnit) -> bool {
        let message = match WorkerMessage::start(&unit) {
            Ok(x) => x,
            Err(e) => {
                warn!("failed to encode work unit {} of job {}: {e}", unit.sequence, unit.job_id);
                self.route_outcome(unit, UnitOutcome::Errored).await;
                return true;
            }
        };
        if let Err(e) = self.connection.send(message).await {
            warn!(
                "failed to send work unit {} of job {}: {e}",
                unit.sequence, unit.job_id
            );
            self.route_outcome(unit, UnitOutcome::Errored).await;
            return false;
        }
        self.stats.running += 1;
        self.publish_stats();
        debug!(
            "sent work unit {} of job {} to {} ({}/{})",
            unit.sequence, unit.job_id, self.hostname, self.stats.running, self.stats.capacity
        );
        self.in_flight.insert((unit.job_id, unit.sequence), unit.clone());
        let host = self.hostname.clone();
        if let Some(job) = self.lookup(unit.job_id).await {
            if let Err(e) = job.record_submission(unit, host).await {
                warn!("failed to record submission: {e}");
            }
        }
        true
    }

    async fn handle_message(&mut self, message: WorkerMessage) {
        match message.kind {
            MessageKind::Checkin => debug!("{} checks in", self.hostname),
            MessageKind::Cout | MessageKind::Cerror => {
                let stream = if message.kind == MessageKind::Cout {
                    OutputStream::Stdout
                } else {
                    OutputStream::Stderr
                };
                let Some(job_id) = message.job_id else {
                    warn!("{} sent {} without a job ID", self.hostname, message.kind);
                    return;
                };
                if let Some(job) = self.lookup(job_id).await {
                    if let Err(e) = job.append_output(stream, message.body).await {
                        warn!("failed to append output for job {job_id}: {e}");
                        self.jobs.remove(&job_id);
                    }
                }
            }
            MessageKind::JobFinished | MessageKind::JobError => {
                self.stats.running = self.stats.running.saturating_sub(1);
                self.publish_stats();
                let outcome = if message.kind == MessageKind::JobFinished {
                    UnitOutcome::Finished
                } else {
                    UnitOutcome::Errored
                };
                let unit = match message.work_unit() {
                    Ok(x) => x,
                    Err(e) => {
                        warn!("{} sent {} with an invalid work unit: {e}", self.hostname, message.kind);
                        return;
                    }
                };
                self.in_flight.remove(&(unit.job_id, unit.sequence));
                debug!(
                    "{} reports {outcome} for work unit {} of job {} ({}/{})",
                    self.hostname, unit.sequence, unit.job_id, self.stats.running, self.stats.capacity
                );
                self.route_outcome(unit, outcome).await;
            }
            MessageKind::Hello => warn!("{} sent HELLO after the handshake", self.hostname),
            MessageKind::Start | MessageKind::Restart | MessageKind::Die => {
                warn!("{} sent unexpected message {}", self.hostname, message.kind);
            }
        }
    }

    async fn route_outcome(&mut self, unit: WorkUnit, outcome: UnitOutcome) {
        let job_id = unit.job_id;
        if let Some(job) = self.lookup(job_id).await {
            if let Err(e) = job.record_outcome(unit, outcome).await {
                warn!("failed to record outcome for job {job_id}: {e}");
                self.jobs.remove(&job_id);
            }
        }
    }

    async fn lookup(&mut self, job_id: JobId) -> Option<JobCoordinator> {
        if let Some(job) = self.jobs.get(&job_id) {
            return Some(job.clone());
        }
        match self.master.job(job_id).await {
            Ok(job) => {
                self.jobs.insert(job_id, job.clone());
                Some(job)
            }
            Err(e) => {
                warn!("dropping message for job {job_id} from {}: {e}", self.hostname);
                None
            }
        }
    }

    fn publish_stats(&self) {
        self.stats_sender.send_replace(self.stats);
    }

    async fn teardown(mut self, reason: &str) {
        info!(
            "worker {} on {} is disconnected: {reason}",
            self.node_id, self.hostname
        );
        if !self.in_flight.is_empty() {
            warn!(
                "{} work units in flight on {} are lost",
                self.in_flight.len(),
                self.hostname
            );
        }
        let lost = std::mem::take(&mut self.in_flight);
        for (_, unit) in lost {
            self.route_outcome(unit, UnitOutcome::Errored).await;
        }
        self.stats.running = 0;
        self.publish_stats();
        if let Err(e) = self.master.deregister_worker(self.node_id).await {
            debug!("failed to deregister worker {}: {e}", self.node_id);
        }
    }
}
