use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    heap::{FieldType, Heap, HeapObject, ObjectHandle},
    provider::ShallowSizeProvider,
};

const DEFAULT_OBJECT_HEADER_BYTES: u64 = 12;
const DEFAULT_ARRAY_HEADER_BYTES: u64 = 16;
const DEFAULT_REFERENCE_BYTES: u64 = 4;
const DEFAULT_ALIGNMENT: u64 = 8;

/// Memory layout parameters used by [`LayoutSizer`].
///
/// Defaults model a 64-bit runtime with compressed references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub object_header_bytes: u64,
    pub array_header_bytes: u64,
    pub reference_bytes: u64,
    pub alignment: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            object_header_bytes: DEFAULT_OBJECT_HEADER_BYTES,
            array_header_bytes: DEFAULT_ARRAY_HEADER_BYTES,
            reference_bytes: DEFAULT_REFERENCE_BYTES,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl LayoutConfig {
    /// 64-bit layout with full-width references and 16-byte headers.
    pub fn uncompressed() -> Self {
        Self {
            object_header_bytes: 16,
            array_header_bytes: 24,
            reference_bytes: 8,
            alignment: 8,
        }
    }

    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            return Err(LayoutConfigError::InvalidAlignment(self.alignment));
        }
        if self.reference_bytes == 0 {
            return Err(LayoutConfigError::ZeroReferenceWidth);
        }
        Ok(())
    }

    pub fn from_json(source: &str) -> Result<Self, LayoutConfigError> {
        let config: LayoutConfig =
            serde_json::from_str(source).map_err(|e| LayoutConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn align(&self, bytes: u64) -> u64 {
        bytes.div_ceil(self.alignment) * self.alignment
    }

    fn width(&self, ty: FieldType) -> u64 {
        match ty {
            FieldType::Primitive(p) => p.width(),
            FieldType::Reference => self.reference_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutConfigError {
    InvalidAlignment(u64),
    ZeroReferenceWidth,
    Parse(String),
}

impl fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutConfigError::InvalidAlignment(a) => {
                write!(f, "alignment must be a non-zero power of two, got {}", a)
            }
            LayoutConfigError::ZeroReferenceWidth => write!(f, "reference width must be non-zero"),
            LayoutConfigError::Parse(msg) => write!(f, "invalid layout config: {}", msg),
        }
    }
}

impl std::error::Error for LayoutConfigError {}

/// Shallow size provider computing sizes from a [`LayoutConfig`].
///
/// Instances cost a header plus the width of every instance field across the
/// type chain; arrays cost an array header plus `len * component width`.
/// Both are rounded up to the configured alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutSizer {
    config: LayoutConfig,
}

impl LayoutSizer {
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Shallow size of `object`, `0` for a handle the heap does not hold.
    pub fn size_of(&self, heap: &Heap, object: ObjectHandle) -> u64 {
        let Some(obj) = heap.get(object) else {
            return 0;
        };
        let types = heap.types();
        match obj {
            HeapObject::Instance { ty, .. } => {
                let fields: u64 = types
                    .instance_fields(*ty)
                    .map(|(_, decl)| self.config.width(decl.field_type()))
                    .sum();
                self.config.align(self.config.object_header_bytes + fields)
            }
            HeapObject::Array { ty, elements } => {
                let width = types
                    .get(*ty)
                    .and_then(|desc| desc.component())
                    .map_or(self.config.reference_bytes, |c| {
                        self.config.width(c.field_type())
                    });
                self.config
                    .align(self.config.array_header_bytes + elements.len() as u64 * width)
            }
        }
    }
}

impl ShallowSizeProvider<Heap> for LayoutSizer {
    fn shallow_size(&self, heap: &Heap, object: ObjectHandle) -> u64 {
        self.size_of(heap, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Component, FieldDecl, PrimitiveType, TypeId, Value};

    fn point_heap() -> (Heap, ObjectHandle) {
        let mut heap = Heap::new();
        let point = heap
            .declare_class(
                "Point",
                None,
                vec![
                    FieldDecl::primitive("x", PrimitiveType::Int),
                    FieldDecl::primitive("y", PrimitiveType::Int),
                    FieldDecl::reference("label"),
                    FieldDecl::primitive("ORIGIN", PrimitiveType::Long).as_static(),
                ],
            )
            .unwrap();
        let h = heap.alloc_instance(point).unwrap();
        (heap, h)
    }

    #[test]
    fn test_instance_size_compressed() {
        let (heap, h) = point_heap();
        // 12 header + 4 + 4 + 4 ref = 24
        assert_eq!(LayoutSizer::default().size_of(&heap, h), 24);
    }

    #[test]
    fn test_instance_size_uncompressed() {
        let (heap, h) = point_heap();
        // 16 header + 4 + 4 + 8 ref = 32
        let sizer = LayoutSizer::new(LayoutConfig::uncompressed()).unwrap();
        assert_eq!(sizer.size_of(&heap, h), 32);
    }

    #[test]
    fn test_empty_object_is_header_aligned() {
        let mut heap = Heap::new();
        let h = heap.alloc_instance(TypeId::OBJECT).unwrap();
        assert_eq!(LayoutSizer::default().size_of(&heap, h), 16);
    }

    #[test]
    fn test_inherited_fields_are_counted() {
        let mut heap = Heap::new();
        let base = heap
            .declare_class(
                "Base",
                None,
                vec![FieldDecl::primitive("id", PrimitiveType::Long).private()],
            )
            .unwrap();
        let derived = heap
            .declare_class(
                "Derived",
                Some(base),
                vec![FieldDecl::primitive("flag", PrimitiveType::Boolean)],
            )
            .unwrap();
        let h = heap.alloc_instance(derived).unwrap();
        // 12 + 8 + 1 = 21 -> 24
        assert_eq!(LayoutSizer::default().size_of(&heap, h), 24);
    }

    #[test]
    fn test_array_sizes() {
        let mut heap = Heap::new();
        let longs = heap
            .alloc_array_with_len(Component::Primitive(PrimitiveType::Long), 3)
            .unwrap();
        let bytes = heap
            .alloc_array(
                Component::Primitive(PrimitiveType::Byte),
                vec![Value::Int(1); 5],
            )
            .unwrap();
        let refs = heap
            .alloc_array_with_len(Component::Object(TypeId::OBJECT), 3)
            .unwrap();
        let sizer = LayoutSizer::default();
        assert_eq!(sizer.size_of(&heap, longs), 40);
        assert_eq!(sizer.size_of(&heap, bytes), 24);
        assert_eq!(sizer.size_of(&heap, refs), 32);
    }

    #[test]
    fn test_unknown_handle_is_zero() {
        let heap = Heap::new();
        assert_eq!(LayoutSizer::default().size_of(&heap, ObjectHandle(7)), 0);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut config = LayoutConfig::default();
        config.alignment = 6;
        assert_eq!(
            LayoutSizer::new(config).unwrap_err(),
            LayoutConfigError::InvalidAlignment(6)
        );
        config.alignment = 8;
        config.reference_bytes = 0;
        assert_eq!(config.validate(), Err(LayoutConfigError::ZeroReferenceWidth));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LayoutConfig::from_json(r#"{ "reference_bytes": 8 }"#).unwrap();
        assert_eq!(config.reference_bytes, 8);
        assert_eq!(config.object_header_bytes, 12);
        assert!(matches!(
            LayoutConfig::from_json(r#"{ "header": 8 }"#),
            Err(LayoutConfigError::Parse(_))
        ));
        assert_eq!(
            LayoutConfig::from_json(r#"{ "alignment": 3 }"#),
            Err(LayoutConfigError::InvalidAlignment(3))
        );
    }
}
