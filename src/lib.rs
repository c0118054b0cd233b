//! Deep object size measurement over an introspectable object graph.
//!
//! [`traversal::deep_size`] walks every object reachable from a root exactly
//! once and sums the shallow sizes reported by a
//! [`provider::ShallowSizeProvider`]. The graph is reached through the
//! [`introspect::Introspect`] capability, which [`heap::Heap`] implements.
pub mod dump;
pub mod heap;
pub mod introspect;
pub mod provider;
pub mod traversal;

pub use heap::{Heap, ObjectHandle};
pub use introspect::Introspect;
pub use provider::ShallowSizeProvider;
pub use traversal::{DeepSizeReport, deep_size, deep_size_each, deep_size_report};
