// Flow runs: one tokio task per execution, advanced by timer suspension,
// cancellable at step boundaries. Step outcomes come from a pluggable
// `OutcomeSource` so tests can script success and failure.

pub mod handlers;
pub mod outcome;
#[cfg(test)]
pub mod scripted;
pub mod simulator;
pub mod store;

pub use outcome::{OutcomeSource, RandomOutcome};
#[cfg(test)]
pub use scripted::ScriptedOutcome;
pub use simulator::ExecutionSimulator;
pub use store::ExecutionStore;
