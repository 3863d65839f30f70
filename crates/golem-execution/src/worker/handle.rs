use log::{info, warn};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::connection::Connection;
use crate::error::{ExecutionError, ExecutionResult};
use crate::id::NodeId;
use crate::master::Master;
use crate::protocol::MessageKind;
use crate::worker::monitor::WorkerMonitor;

const WORKER_CONTROL_CHANNEL_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub capacity: usize,
    pub running: usize,
}

#[derive(Debug)]
pub(super) enum WorkerControl {
    Resize { capacity: usize },
    Shutdown,
}

/// The master side of one worker connection.
///
/// The dispatch loop owns the connection and the worker stats.
/// This handle only sends control messages and observes the stats.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    node_id: NodeId,
    hostname: String,
    control: mpsc::Sender<WorkerControl>,
    stats: watch::Receiver<WorkerStats>,
}

impl WorkerHandle {
    /// Waits for the `HELLO` handshake and starts the dispatch loop.
    pub async fn connect(mut connection: Connection, master: Master) -> ExecutionResult<Self> {
        let hostname = connection.peer().to_string();
        let Some(message) = connection.recv().await else {
            return Err(ExecutionError::HandshakeFailed(format!(
                "{hostname} closed the connection before the handshake"
            )));
        };
        if message.kind != MessageKind::Hello {
            warn!("{hostname} sent {} instead of HELLO", message.kind);
            return Err(ExecutionError::HandshakeFailed(format!(
                "expected HELLO from {hostname} but received {}",
                message.kind
            )));
        }
        let capacity = message.capacity()?;
        let node_id = NodeId::generate();
        info!("{hostname} says hello with capacity {capacity} and is assigned node {node_id}");

        let stats = WorkerStats {
            capacity,
            running: 0,
        };
        let (control_tx, control_rx) = mpsc::channel(WORKER_CONTROL_CHANNEL_SIZE);
        let (stats_tx, stats_rx) = watch::channel(stats);
        let monitor = WorkerMonitor::new(
            node_id,
            hostname.clone(),
            connection,
            master,
            control_rx,
            stats_tx,
        );
        tokio::spawn(monitor.run());
        Ok(Self {
            node_id,
            hostname,
            control: control_tx,
            stats: stats_rx,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the latest published stats. The value may be stale by the time it is used.
    pub fn stats(&self) -> WorkerStats {
        *self.stats.borrow()
    }

    /// Waits until the published stats satisfy the predicate.
    pub async fn wait_for_stats(
        &self,
        predicate: impl FnMut(&WorkerStats) -> bool,
    ) -> ExecutionResult<WorkerStats> {
        let mut stats = self.stats.clone();
        let value = stats
            .wait_for(predicate)
            .await
            .map_err(|_| ExecutionError::ConnectionClosed(self.hostname.clone()))?;
        Ok(*value)
    }

    pub async fn resize(&self, capacity: usize) -> ExecutionResult<()> {
        self.control
            .send(WorkerControl::Resize { capacity })
            .await
            .map_err(|_| ExecutionError::ConnectionClosed(self.hostname.clone()))
    }

    pub async fn shutdown(&self) -> ExecutionResult<()> {
        self.control
            .send(WorkerControl::Shutdown)
            .await
            .map_err(|_| ExecutionError::ConnectionClosed(self.hostname.clone()))
    }

    /// Returns whether the dispatch loop is still running.
    pub fn is_connected(&self) -> bool {
        !self.control.is_closed()
    }
}
