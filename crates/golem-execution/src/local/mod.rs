//! An in-process worker that runs work units as child processes.

mod executor;
mod options;
mod worker;

pub use options::LocalWorkerOptions;
pub use worker::LocalWorker;
