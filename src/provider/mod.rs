//! Shallow size providers.
//!
//! A provider answers one question: how many bytes does this object occupy
//! on its own, ignoring everything it references. The traversal engine
//! consumes providers through [`ShallowSizeProvider`]; the process-wide
//! provider lives in [`registry`].
pub mod layout;
pub mod registry;

pub use layout::{LayoutConfig, LayoutConfigError, LayoutSizer};
pub use registry::RegistrationError;

use crate::introspect::Introspect;

/// Intrinsic byte size of a single object.
///
/// Providers are queried, never mutated, and may be shared across threads.
pub trait ShallowSizeProvider<S: Introspect + ?Sized>: Send + Sync {
    fn shallow_size(&self, space: &S, object: S::Handle) -> u64;
}

impl<S, F> ShallowSizeProvider<S> for F
where
    S: Introspect + ?Sized,
    F: Fn(&S, S::Handle) -> u64 + Send + Sync,
{
    fn shallow_size(&self, space: &S, object: S::Handle) -> u64 {
        self(space, object)
    }
}
