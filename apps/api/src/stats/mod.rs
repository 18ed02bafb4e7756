pub mod aggregator;
pub mod calendar;
pub mod handlers;
