pub mod agenda;
pub mod connection;
pub mod conversation;
pub mod execution;
pub mod flow;
pub mod insight;
pub mod log_entry;
pub mod server;
