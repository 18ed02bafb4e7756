//! Agenda tasks and calendar events.

pub mod events;
pub mod handlers;
pub mod tasks;

pub use events::{EventStore, NewEvent};
pub use tasks::{NewTask, TaskPatch, TaskStore};
