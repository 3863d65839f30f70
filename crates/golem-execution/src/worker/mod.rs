mod handle;
mod monitor;

pub use handle::{WorkerHandle, WorkerStats};
