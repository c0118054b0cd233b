//! Reflective object heap.
//!
//! The heap is a slot store of typed objects. Every object is either an
//! instance of a class type, whose fields are declared across a single
//! inheritance chain rooted at `Object`, or an array of primitive or
//! reference components. Objects are addressed by [`ObjectHandle`], which is
//! also their identity.
pub mod heap_error;
pub mod heap_object;
pub mod object_handle;
pub mod object_heap;
pub mod type_registry;
pub mod value;

pub use heap_error::{AccessError, HeapError};
pub use heap_object::HeapObject;
pub use object_handle::ObjectHandle;
pub use object_heap::{Access, Heap};
pub use type_registry::{
    Component, FieldDecl, FieldRef, FieldType, MAX_DECLARED_FIELDS, TypeDescriptor, TypeId,
    TypeKind, TypeRegistry, Visibility,
};
pub use value::{PrimitiveType, Value};
