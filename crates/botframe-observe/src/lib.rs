//! Observability setup for botframe processes.

pub mod tracing_setup;
