use std::fmt;

use serde::{Deserialize, Serialize};

use crate::heap::object_handle::ObjectHandle;

/// Primitive field and array component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Float,
    Long,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Float,
        PrimitiveType::Long,
        PrimitiveType::Double,
    ];

    /// Storage width in bytes.
    pub fn width(self) -> u64 {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Byte => 1,
            PrimitiveType::Char | PrimitiveType::Short => 2,
            PrimitiveType::Int | PrimitiveType::Float => 4,
            PrimitiveType::Long | PrimitiveType::Double => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Long => "long",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    /// Zero value stored in freshly allocated slots of this type.
    pub fn zero(self) -> Value {
        match self {
            PrimitiveType::Boolean => Value::Bool(false),
            PrimitiveType::Float | PrimitiveType::Double => Value::Float(0.0),
            _ => Value::Int(0),
        }
    }

    /// Returns `true` when `value` can be stored in a slot of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PrimitiveType::Boolean => matches!(value, Value::Bool(_)),
            PrimitiveType::Float | PrimitiveType::Double => {
                matches!(value, Value::Float(_) | Value::Int(_))
            }
            _ => matches!(value, Value::Int(_)),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value held in a field slot or array element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Absent reference.
    Null,
    /// Reference to another heap object.
    Ref(ObjectHandle),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Returns the referenced handle, if this value is a non-null reference.
    pub fn as_ref(&self) -> Option<ObjectHandle> {
        match self {
            Value::Ref(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Returns `true` for values a reference slot may hold.
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Null | Value::Ref(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Ref(_) => "ref",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Ref(handle) => write!(f, "{}", handle),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<ObjectHandle> for Value {
    fn from(handle: ObjectHandle) -> Self {
        Value::Ref(handle)
    }
}

impl From<Option<ObjectHandle>> for Value {
    fn from(handle: Option<ObjectHandle>) -> Self {
        handle.map_or(Value::Null, Value::Ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_widths() {
        assert_eq!(PrimitiveType::Boolean.width(), 1);
        assert_eq!(PrimitiveType::Char.width(), 2);
        assert_eq!(PrimitiveType::Int.width(), 4);
        assert_eq!(PrimitiveType::Double.width(), 8);
    }

    #[test]
    fn test_primitive_label_lookup() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_label(p.label()), Some(p));
        }
        assert_eq!(PrimitiveType::from_label("ref"), None);
    }

    #[test]
    fn test_accepts() {
        assert!(PrimitiveType::Int.accepts(&Value::Int(3)));
        assert!(!PrimitiveType::Int.accepts(&Value::Null));
        assert!(PrimitiveType::Double.accepts(&Value::Int(3)));
        assert!(!PrimitiveType::Boolean.accepts(&Value::Int(1)));
    }

    #[test]
    fn test_value_as_ref() {
        let h = ObjectHandle(4);
        assert_eq!(Value::Ref(h).as_ref(), Some(h));
        assert_eq!(Value::Null.as_ref(), None);
        assert_eq!(Value::Int(4).as_ref(), None);
        assert_eq!(Value::from(None), Value::Null);
    }
}
