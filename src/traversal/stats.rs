use serde::Serialize;

/// Counters collected by one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    /// Distinct objects sized.
    pub objects: u64,
    /// Reference arrays whose elements were pushed.
    pub arrays_scanned: u64,
    /// Field reads attempted, successful or not.
    pub fields_read: u64,
    pub references_pushed: u64,
    /// Null entries popped from the frontier.
    pub null_pops: u64,
    /// Pops of objects that were already visited.
    pub revisits: u64,
    /// Largest frontier depth reached.
    pub peak_frontier: usize,
}
