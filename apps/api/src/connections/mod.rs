// Channel integrations: per-kind form schema, submission gating, and the
// disconnected → pending → connected lifecycle driven by a connection probe.

pub mod handlers;
pub mod registry;
pub mod schema;

pub use registry::{ConnectionProbe, ConnectionRegistry, DemoProbe};
