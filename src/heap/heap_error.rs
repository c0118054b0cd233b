//! Error types for heap construction and field access.

use std::fmt;

use crate::heap::{object_handle::ObjectHandle, type_registry::Visibility};

/// Error raised while declaring types or mutating heap objects.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapError {
    DuplicateType(String),
    InvalidTypeName(String),
    UnknownType(String),
    /// Classes may only extend other classes.
    InvalidParent {
        ty: String,
        parent: String,
    },
    DuplicateField {
        ty: String,
        field: String,
    },
    TooManyFields {
        ty: String,
        count: usize,
    },
    UnknownField {
        ty: String,
        field: String,
    },
    /// Static fields live in the static table, never in an instance.
    StaticField {
        ty: String,
        field: String,
    },
    TypeMismatch {
        expected: String,
        found: &'static str,
    },
    /// Instances can only be allocated for class types.
    NotAClass(String),
    NotAnInstance(ObjectHandle),
    NotAnArray(ObjectHandle),
    IndexOutOfBounds {
        handle: ObjectHandle,
        index: usize,
        len: usize,
    },
    DanglingHandle(ObjectHandle),
    /// Every object handle is in use.
    HeapFull,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::DuplicateType(name) => write!(f, "type `{}` is already declared", name),
            HeapError::InvalidTypeName(name) => write!(f, "invalid type name `{}`", name),
            HeapError::UnknownType(name) => write!(f, "unknown type `{}`", name),
            HeapError::InvalidParent { ty, parent } => {
                write!(f, "type `{}` cannot extend `{}`", ty, parent)
            }
            HeapError::DuplicateField { ty, field } => {
                write!(f, "field `{}` is declared twice in `{}`", field, ty)
            }
            HeapError::TooManyFields { ty, count } => write!(
                f,
                "type `{}` declares {} fields, more than a class can hold",
                ty, count
            ),
            HeapError::UnknownField { ty, field } => {
                write!(f, "type `{}` has no field `{}`", ty, field)
            }
            HeapError::StaticField { ty, field } => {
                write!(f, "`{}.{}` is static and has no instance slot", ty, field)
            }
            HeapError::TypeMismatch { expected, found } => {
                write!(f, "expected {} value, found {}", expected, found)
            }
            HeapError::NotAClass(name) => write!(f, "`{}` is not a class type", name),
            HeapError::NotAnInstance(handle) => write!(f, "object {} is not an instance", handle),
            HeapError::NotAnArray(handle) => write!(f, "object {} is not an array", handle),
            HeapError::IndexOutOfBounds { handle, index, len } => write!(
                f,
                "index {} out of bounds for array {} of length {}",
                index, handle, len
            ),
            HeapError::DanglingHandle(handle) => write!(f, "dangling handle {}", handle),
            HeapError::HeapFull => write!(f, "heap has no free object handles"),
        }
    }
}

impl std::error::Error for HeapError {}

/// Reason a field read was refused by the heap.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessError {
    /// Checked access to a non-public field.
    IllegalAccess {
        field: String,
        visibility: Visibility,
    },
    /// Sealed fields stay closed even under forced access.
    Inaccessible { field: String },
    /// The field is not declared anywhere in the object's type chain.
    NotAMember { field: String, ty: String },
    StaticField { field: String },
    UnknownField,
    NotAnInstance(ObjectHandle),
    DanglingHandle(ObjectHandle),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::IllegalAccess { field, visibility } => {
                write!(f, "cannot access {} field `{}`", visibility, field)
            }
            AccessError::Inaccessible { field } => {
                write!(f, "field `{}` is sealed and cannot be opened", field)
            }
            AccessError::NotAMember { field, ty } => {
                write!(f, "field `{}` is not a member of `{}`", field, ty)
            }
            AccessError::StaticField { field } => {
                write!(f, "field `{}` is static", field)
            }
            AccessError::UnknownField => write!(f, "unknown field reference"),
            AccessError::NotAnInstance(handle) => write!(f, "object {} is not an instance", handle),
            AccessError::DanglingHandle(handle) => write!(f, "dangling handle {}", handle),
        }
    }
}

impl std::error::Error for AccessError {}
