// Follow-up flows: definition store, status controller, import/export.
// Flow runs live in `execution`; this module only rolls their results up
// into each flow's analytics.

pub mod handlers;
pub mod store;
pub mod transfer;

pub use store::{FlowPatch, FlowStore, NewFlow};
