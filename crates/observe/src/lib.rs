//! Process wide observability setup.

pub mod tracing;
