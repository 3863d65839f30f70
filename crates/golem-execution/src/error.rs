use std::sync::PoisonError;

use golem_common::error::CommonError;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;

use crate::id::{JobId, NodeId};

pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("worker not found: {0}")]
    WorkerNotFound(NodeId),
    #[error("timed out stopping job {0}")]
    StopTimeout(JobId),
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("error in common: {0}")]
    CommonError(#[from] CommonError),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ExecutionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ExecutionError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ExecutionError::InternalError(message.into())
    }
}

impl<T> From<mpsc::error::SendError<T>> for ExecutionError {
    fn from(error: mpsc::error::SendError<T>) -> Self {
        ExecutionError::InternalError(format!("failed to send message: {error}"))
    }
}

impl From<oneshot::error::RecvError> for ExecutionError {
    fn from(error: oneshot::error::RecvError) -> Self {
        ExecutionError::InternalError(format!("failed to receive reply: {error}"))
    }
}

impl From<JoinError> for ExecutionError {
    fn from(error: JoinError) -> Self {
        ExecutionError::InternalError(error.to_string())
    }
}

impl<T> From<PoisonError<T>> for ExecutionError {
    fn from(error: PoisonError<T>) -> Self {
        ExecutionError::InternalError(error.to_string())
    }
}
