pub mod cache;
pub mod client;
pub mod envelope;
pub mod retry;
pub mod transport;
