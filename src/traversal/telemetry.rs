//! Per-type size breakdown.
//!
//! Gated behind `#[cfg(feature = "telemetry")]`. When the feature is
//! disabled a traversal only keeps its [`TraversalStats`](super::TraversalStats).

use std::{collections::HashMap, hash::Hash};

use serde::Serialize;

use crate::introspect::Introspect;

const UNKNOWN_TYPE: &str = "<unknown>";

/// Objects and bytes attributed to one type by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    pub type_name: String,
    pub count: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    count: u64,
    bytes: u64,
}

/// Accumulates per-type counts while a traversal runs.
pub(crate) struct TypeHistogram<T> {
    buckets: HashMap<Option<T>, Bucket>,
}

impl<T: Copy + Eq + Hash> TypeHistogram<T> {
    pub(crate) fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn record(&mut self, ty: Option<T>, bytes: u64) {
        let bucket = self.buckets.entry(ty).or_default();
        bucket.count += 1;
        bucket.bytes += bytes;
    }

    /// Resolves type names and sorts by bytes descending, then by name.
    pub(crate) fn finish<S>(self, space: &S) -> Vec<TypeUsage>
    where
        S: Introspect<Type = T> + ?Sized,
    {
        let mut usage: Vec<TypeUsage> = self
            .buckets
            .into_iter()
            .map(|(ty, bucket)| TypeUsage {
                type_name: ty.map_or_else(
                    || UNKNOWN_TYPE.to_string(),
                    |ty| space.type_name(ty).into_owned(),
                ),
                count: bucket.count,
                bytes: bucket.bytes,
            })
            .collect();
        usage.sort_by(|a, b| {
            b.bytes
                .cmp(&a.bytes)
                .then_with(|| a.type_name.cmp(&b.type_name))
        });
        usage
    }
}
