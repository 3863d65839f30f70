use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{ExecutionError, ExecutionResult};
use crate::protocol::WorkUnit;

/// The bounded queue shared by all job coordinators (producers)
/// and all worker handles (consumers).
///
/// The receiving end is guarded by an async mutex so that concurrent pullers
/// are served one at a time. Both [`DispatchQueue::submit`] and
/// [`DispatchQueue::pull`] are cancel safe and can be used in `tokio::select!`.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<WorkUnit>,
    receiver: Arc<Mutex<mpsc::Receiver<WorkUnit>>>,
}

impl DispatchQueue {
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(size.max(1));
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Waits until there is room in the queue and enqueues the work unit.
    pub async fn submit(&self, unit: WorkUnit) -> ExecutionResult<()> {
        self.sender
            .send(unit)
            .await
            .map_err(|_| ExecutionError::internal("the dispatch queue is closed"))
    }

    /// Waits for the next work unit.
    pub async fn pull(&self) -> Option<WorkUnit> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
