//! Structural introspection capability.
//!
//! The traversal engine never looks at concrete object layouts. It asks an
//! [`Introspect`] implementation for an object's type, the fields that type
//! and its ancestors declare, and the reference currently held by a field.
//! Implementations are best-effort: a field that cannot be read simply
//! yields no reference.
use std::{borrow::Cow, hash::Hash};

pub mod heap_introspect;

/// Field enumeration and field reads over an object graph.
pub trait Introspect {
    /// Object identity. Two handles are the same object iff they are equal.
    type Handle: Copy + Eq + Hash;
    /// Runtime type of an object.
    type Type: Copy + Eq + Hash;
    /// Accessor for one declared field.
    type Field: Copy;

    /// Runtime type of `object`, `None` if the handle does not resolve.
    fn type_of(&self, object: Self::Handle) -> Option<Self::Type>;

    /// Human-readable type name, used for reporting only.
    fn type_name(&self, ty: Self::Type) -> Cow<'_, str>;

    /// `true` for arrays whose components are references.
    fn is_reference_array(&self, ty: Self::Type) -> bool;

    /// Components of a reference array. Null components are yielded as `None`.
    fn elements(&self, object: Self::Handle) -> impl Iterator<Item = Option<Self::Handle>> + '_;

    /// Instance fields declared by `ty` and every ancestor of it, most
    /// specific type first. Static fields are excluded.
    fn fields_of(&self, ty: Self::Type) -> Vec<Self::Field>;

    /// Reference held by `field` in `object`.
    ///
    /// `None` covers null, primitive fields and reads that failed for any
    /// reason. Callers cannot tell these apart and must not need to.
    fn value_of(&self, field: Self::Field, object: Self::Handle) -> Option<Self::Handle>;
}
