//! Deep size traversal.
//!
//! # Counting Invariant
//! A traversal owns its visited set and frontier. An object's shallow size is
//! added the first time the object is popped, and the object is marked
//! visited before any of its references are pushed, so shared sub-objects
//! and back-edges are filtered on a later pop and counted once.
//!
//! Nothing survives a call: two calls on the same root are independent and
//! may run concurrently.
pub mod deep_size;
pub mod report;
pub mod stats;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use deep_size::{Traversal, deep_size, deep_size_each, deep_size_report};
pub use report::{DeepSizeReport, format_report};
pub use stats::TraversalStats;
#[cfg(feature = "telemetry")]
pub use telemetry::TypeUsage;
