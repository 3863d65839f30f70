use tokio::sync::mpsc;

use crate::error::{ExecutionError, ExecutionResult};
use crate::protocol::WorkerMessage;

/// One end of a message connection between the master and a worker.
///
/// Framing and transport are the concern of whoever builds the connection.
/// [`Connection::duplex`] creates an in-process pair.
#[derive(Debug)]
pub struct Connection {
    peer: String,
    inbound: mpsc::Receiver<WorkerMessage>,
    outbound: mpsc::Sender<WorkerMessage>,
}

impl Connection {
    pub fn new(
        peer: impl Into<String>,
        inbound: mpsc::Receiver<WorkerMessage>,
        outbound: mpsc::Sender<WorkerMessage>,
    ) -> Self {
        Self {
            peer: peer.into(),
            inbound,
            outbound,
        }
    }

    /// Creates two connected endpoints.
    /// The first endpoint belongs to the master and sees `peer` as its peer name.
    /// The second endpoint belongs to the worker.
    pub fn duplex(peer: impl Into<String>, buffer: usize) -> (Connection, Connection) {
        let buffer = buffer.max(1);
        let (to_master, from_worker) = mpsc::channel(buffer);
        let (to_worker, from_master) = mpsc::channel(buffer);
        (
            Connection::new(peer, from_worker, to_worker),
            Connection::new("master", from_master, to_master),
        )
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Returns `None` once the peer has closed the connection.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.inbound.recv().await
    }

    pub async fn send(&self, message: WorkerMessage) -> ExecutionResult<()> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| ExecutionError::ConnectionClosed(self.peer.clone()))
    }

    /// Returns a sender that can be moved into tasks writing to the peer.
    pub fn sender(&self) -> mpsc::Sender<WorkerMessage> {
        self.outbound.clone()
    }
}
