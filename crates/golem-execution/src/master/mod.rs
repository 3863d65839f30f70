mod actor;
mod client;
mod event;
mod options;

pub use client::Master;
pub use options::MasterOptions;
