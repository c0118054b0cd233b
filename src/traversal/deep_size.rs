use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::debug;

#[cfg(feature = "telemetry")]
use crate::traversal::telemetry::TypeHistogram;
use crate::{
    introspect::Introspect,
    provider::ShallowSizeProvider,
    traversal::{report::DeepSizeReport, stats::TraversalStats},
};

/// State of a single deep size computation.
///
/// `run` consumes the traversal, so its visited set cannot leak into another
/// call.
pub struct Traversal<'a, S: Introspect + ?Sized> {
    space: &'a S,
    provider: Option<&'a dyn ShallowSizeProvider<S>>,
    visited: HashSet<S::Handle>,
    frontier: Vec<Option<S::Handle>>,
    fields: HashMap<S::Type, Vec<S::Field>>,
    stats: TraversalStats,
    #[cfg(feature = "telemetry")]
    histogram: TypeHistogram<S::Type>,
}

impl<'a, S: Introspect + ?Sized> Traversal<'a, S> {
    /// Creates a traversal over `space`.
    ///
    /// Without a provider every object is still visited, but sizes as `0`.
    pub fn new(space: &'a S, provider: Option<&'a dyn ShallowSizeProvider<S>>) -> Self {
        Self {
            space,
            provider,
            visited: HashSet::new(),
            frontier: Vec::with_capacity(16),
            fields: HashMap::new(),
            stats: TraversalStats::default(),
            #[cfg(feature = "telemetry")]
            histogram: TypeHistogram::new(),
        }
    }

    /// Walks everything reachable from `root` and sums shallow sizes.
    pub fn run(mut self, root: Option<S::Handle>) -> DeepSizeReport {
        let mut total_bytes = 0u64;
        self.frontier.push(root);

        while let Some(current) = self.frontier.pop() {
            let Some(object) = current else {
                self.stats.null_pops += 1;
                continue;
            };

            // Mark before expanding so cycles and shared nodes are sized once.
            if !self.visited.insert(object) {
                self.stats.revisits += 1;
                continue;
            }

            let size = self.shallow_size(object);
            total_bytes += size;
            self.stats.objects += 1;

            let ty = self.space.type_of(object);
            #[cfg(feature = "telemetry")]
            self.histogram.record(ty, size);

            if let Some(ty) = ty {
                self.expand(object, ty);
            }
        }

        debug!(
            total_bytes,
            objects = self.stats.objects,
            peak_frontier = self.stats.peak_frontier,
            "deep size computed"
        );

        DeepSizeReport {
            total_bytes,
            stats: self.stats,
            #[cfg(feature = "telemetry")]
            by_type: self.histogram.finish(self.space),
        }
    }

    fn shallow_size(&self, object: S::Handle) -> u64 {
        self.provider
            .map_or(0, |provider| provider.shallow_size(self.space, object))
    }

    fn expand(&mut self, object: S::Handle, ty: S::Type) {
        let space = self.space;

        if space.is_reference_array(ty) {
            self.stats.arrays_scanned += 1;
            for element in space.elements(object) {
                // Null elements are filtered when popped.
                self.frontier.push(element);
                self.stats.references_pushed += 1;
            }
        }

        // Arrays are objects too: their fields are walked like any other.
        let fields = self
            .fields
            .entry(ty)
            .or_insert_with(|| space.fields_of(ty));
        for field in fields.iter() {
            self.stats.fields_read += 1;
            if let Some(target) = space.value_of(*field, object) {
                self.frontier.push(Some(target));
                self.stats.references_pushed += 1;
            }
        }

        self.stats.peak_frontier = self.stats.peak_frontier.max(self.frontier.len());
    }
}

/// Total shallow size of every distinct object reachable from `root`.
///
/// A `None` root measures `0`. A `None` provider visits the graph but
/// measures `0`.
pub fn deep_size<S: Introspect + ?Sized>(
    space: &S,
    root: Option<S::Handle>,
    provider: Option<&dyn ShallowSizeProvider<S>>,
) -> u64 {
    deep_size_report(space, root, provider).total_bytes
}

/// Like [`deep_size`], also returning traversal statistics.
pub fn deep_size_report<S: Introspect + ?Sized>(
    space: &S,
    root: Option<S::Handle>,
    provider: Option<&dyn ShallowSizeProvider<S>>,
) -> DeepSizeReport {
    Traversal::new(space, provider).run(root)
}

/// Measures every root independently, in parallel.
///
/// Objects shared between roots are counted once per root.
pub fn deep_size_each<S>(
    space: &S,
    roots: &[Option<S::Handle>],
    provider: Option<&dyn ShallowSizeProvider<S>>,
) -> Vec<u64>
where
    S: Introspect + Sync + ?Sized,
    S::Handle: Send + Sync,
{
    roots
        .par_iter()
        .map(|root| deep_size(space, *root, provider))
        .collect()
}
