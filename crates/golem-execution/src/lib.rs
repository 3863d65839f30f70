pub mod connection;
pub mod error;
pub mod id;
pub mod job;
pub mod local;
pub mod master;
pub mod protocol;
pub mod queue;
pub mod store;
pub mod worker;
