use crate::heap::{type_registry::TypeId, value::Value};

/// Objects that live on the [`Heap`](crate::heap::Heap).
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// Class instance with one slot per instance field of its type chain.
    Instance { ty: TypeId, fields: Vec<Value> },
    /// Array of primitive or reference components.
    Array { ty: TypeId, elements: Vec<Value> },
}

impl HeapObject {
    pub fn type_id(&self) -> TypeId {
        match self {
            HeapObject::Instance { ty, .. } | HeapObject::Array { ty, .. } => *ty,
        }
    }

    /// Array elements, empty for instances.
    pub fn elements(&self) -> &[Value] {
        match self {
            HeapObject::Array { elements, .. } => elements,
            HeapObject::Instance { .. } => &[],
        }
    }
}
