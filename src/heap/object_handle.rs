/// Handle to an object on the [`Heap`](crate::heap::Heap).
///
/// An `ObjectHandle` is a lightweight, copyable slot index. Two handles are
/// equal exactly when they denote the same object, which makes the handle the
/// identity key used by the traversal's visited set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub(crate) u32);

impl ObjectHandle {
    /// Returns the raw heap slot index backing this handle.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
