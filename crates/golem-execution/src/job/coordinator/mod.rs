mod actor;
mod client;
mod event;
mod options;
mod submitter;
mod writer;

pub use client::JobCoordinator;
pub use options::JobCoordinatorOptions;
