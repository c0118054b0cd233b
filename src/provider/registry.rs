//! Process-wide shallow size provider.
//!
//! A host installs its provider once, before any measurement. Until then
//! every shallow size is `0` and every deep size is the sum of zeros.
use std::{fmt, sync::OnceLock};

use tracing::debug;

use crate::{
    heap::{Heap, ObjectHandle},
    provider::ShallowSizeProvider,
    traversal::{self, DeepSizeReport},
};

static PROVIDER: OnceLock<Box<dyn ShallowSizeProvider<Heap>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// A provider is already installed; the first one stays in place.
    AlreadyRegistered,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::AlreadyRegistered => {
                write!(f, "a shallow size provider is already registered")
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Installs `provider` for the rest of the process.
pub fn register<P>(provider: P) -> Result<(), RegistrationError>
where
    P: ShallowSizeProvider<Heap> + 'static,
{
    PROVIDER
        .set(Box::new(provider))
        .map_err(|_| RegistrationError::AlreadyRegistered)?;
    debug!("shallow size provider registered");
    Ok(())
}

pub fn is_registered() -> bool {
    PROVIDER.get().is_some()
}

/// The installed provider, `None` until [`register`] succeeds.
pub fn installed() -> Option<&'static dyn ShallowSizeProvider<Heap>> {
    PROVIDER.get().map(|provider| provider.as_ref())
}

/// Shallow size of one object through the installed provider, `0` without one.
pub fn shallow_size(heap: &Heap, object: ObjectHandle) -> u64 {
    installed().map_or(0, |provider| provider.shallow_size(heap, object))
}

/// Deep size of `root` through the installed provider.
pub fn deep_size(heap: &Heap, root: Option<ObjectHandle>) -> u64 {
    traversal::deep_size(heap, root, installed())
}

pub fn deep_size_report(heap: &Heap, root: Option<ObjectHandle>) -> DeepSizeReport {
    traversal::deep_size_report(heap, root, installed())
}
