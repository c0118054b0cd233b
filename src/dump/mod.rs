//! JSON heap dumps.
//!
//! A dump lists class types (parents before children) and objects. Object
//! `i` of the dump becomes the `i`-th allocation of the loaded heap, and
//! references are written as `{ "ref": i }`.
use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::heap::{
    Component, FieldDecl, FieldRef, FieldType, Heap, HeapError, PrimitiveType, TypeId, Value,
    Visibility,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeapDump {
    #[serde(default)]
    pub types: Vec<TypeDump>,
    #[serde(default)]
    pub objects: Vec<ObjectDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDump {
    pub name: String,
    /// Defaults to `Object`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDump {
    pub name: String,
    /// A primitive name or `ref`.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub sealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ObjectDump {
    Instance {
        #[serde(rename = "type")]
        ty: String,
        /// Keyed by field name, or by `Owner.name` to reach an ancestor
        /// field hidden by a subclass field of the same name.
        #[serde(default)]
        fields: BTreeMap<String, ValueDump>,
    },
    Array {
        /// A primitive name, a type name, or an array name such as `int[]`.
        component: String,
        #[serde(default)]
        elements: Vec<ValueDump>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueDump {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Ref {
        #[serde(rename = "ref")]
        target: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DumpError {
    Parse(String),
    UnknownType(String),
    UnknownFieldType {
        ty: String,
        field: String,
        field_type: String,
    },
    DanglingReference {
        object: usize,
        target: usize,
    },
    /// Type declaration rejected by the registry.
    Heap(HeapError),
    /// Field or element write rejected for dump object `index`.
    Object {
        index: usize,
        source: HeapError,
    },
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpError::Parse(msg) => write!(f, "invalid heap dump: {}", msg),
            DumpError::UnknownType(name) => write!(f, "unknown type `{}`", name),
            DumpError::UnknownFieldType {
                ty,
                field,
                field_type,
            } => write!(
                f,
                "field `{}.{}` has unknown type `{}`",
                ty, field, field_type
            ),
            DumpError::DanglingReference { object, target } => write!(
                f,
                "object {} references missing object {}",
                object, target
            ),
            DumpError::Heap(err) => write!(f, "{}", err),
            DumpError::Object { index, source } => write!(f, "object {}: {}", index, source),
        }
    }
}

impl std::error::Error for DumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DumpError::Heap(err) | DumpError::Object { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<HeapError> for DumpError {
    fn from(err: HeapError) -> Self {
        DumpError::Heap(err)
    }
}

impl HeapDump {
    pub fn from_json(source: &str) -> Result<Self, DumpError> {
        serde_json::from_str(source).map_err(|e| DumpError::Parse(e.to_string()))
    }

    /// Builds a heap holding every type and object of the dump.
    pub fn load(&self) -> Result<Heap, DumpError> {
        let mut heap = Heap::new();

        for ty in &self.types {
            let parent = match &ty.parent {
                Some(name) => Some(
                    heap.types()
                        .lookup(name)
                        .ok_or_else(|| DumpError::UnknownType(name.clone()))?,
                ),
                None => None,
            };
            let fields = ty
                .fields
                .iter()
                .map(|field| field_decl(&ty.name, field))
                .collect::<Result<Vec<_>, _>>()?;
            heap.declare_class(ty.name.clone(), parent, fields)?;
        }

        // Allocate everything first so references may point forward.
        let mut handles = Vec::with_capacity(self.objects.len());
        for (index, object) in self.objects.iter().enumerate() {
            let handle = match object {
                ObjectDump::Instance { ty, .. } => {
                    let ty = resolve_type(&mut heap, ty)?;
                    heap.alloc_instance(ty)
                }
                ObjectDump::Array {
                    component,
                    elements,
                } => {
                    let component = resolve_component(&mut heap, component)?;
                    heap.alloc_array_with_len(component, elements.len())
                }
            };
            handles.push(handle.map_err(|source| DumpError::Object { index, source })?);
        }

        for (index, (object, &handle)) in self.objects.iter().zip(&handles).enumerate() {
            match object {
                ObjectDump::Instance { fields, .. } => {
                    for (key, value) in fields {
                        let value = to_value(&heap, index, *value)?;
                        let written = match key.rsplit_once('.') {
                            Some((owner, name)) => {
                                let field = qualified_field(&heap, owner, name)
                                    .map_err(|source| DumpError::Object { index, source })?;
                                heap.set_field(handle, field, value)
                            }
                            None => heap.set(handle, key, value),
                        };
                        written.map_err(|source| DumpError::Object { index, source })?;
                    }
                }
                ObjectDump::Array { elements, .. } => {
                    for (i, value) in elements.iter().enumerate() {
                        let value = to_value(&heap, index, *value)?;
                        heap.set_element(handle, i, value)
                            .map_err(|source| DumpError::Object { index, source })?;
                    }
                }
            }
        }

        Ok(heap)
    }
}

fn field_decl(owner: &str, field: &FieldDump) -> Result<FieldDecl, DumpError> {
    let ty = if field.ty == "ref" {
        FieldType::Reference
    } else {
        let primitive =
            PrimitiveType::from_label(&field.ty).ok_or_else(|| DumpError::UnknownFieldType {
                ty: owner.to_string(),
                field: field.name.clone(),
                field_type: field.ty.clone(),
            })?;
        FieldType::Primitive(primitive)
    };

    let mut decl = FieldDecl::new(field.name.clone(), ty).with_visibility(field.visibility);
    if field.is_static {
        decl = decl.as_static();
    }
    if field.sealed {
        decl = decl.sealed();
    }
    Ok(decl)
}

fn qualified_field(heap: &Heap, owner: &str, name: &str) -> Result<FieldRef, HeapError> {
    let types = heap.types();
    let owner_ty = types
        .lookup(owner)
        .ok_or_else(|| HeapError::UnknownType(owner.to_string()))?;
    types
        .declared_field(owner_ty, name)
        .ok_or_else(|| HeapError::UnknownField {
            ty: owner.to_string(),
            field: name.to_string(),
        })
}

fn resolve_type(heap: &mut Heap, name: &str) -> Result<TypeId, DumpError> {
    if let Some(ty) = heap.types().lookup(name) {
        return Ok(ty);
    }
    match name.strip_suffix("[]") {
        Some(inner) => {
            let component = resolve_component(heap, inner)?;
            Ok(heap.types_mut().array_of(component)?)
        }
        None => Err(DumpError::UnknownType(name.to_string())),
    }
}

fn resolve_component(heap: &mut Heap, name: &str) -> Result<Component, DumpError> {
    match PrimitiveType::from_label(name) {
        Some(primitive) => Ok(Component::Primitive(primitive)),
        None => Ok(Component::Object(resolve_type(heap, name)?)),
    }
}

fn to_value(heap: &Heap, object: usize, value: ValueDump) -> Result<Value, DumpError> {
    Ok(match value {
        ValueDump::Null => Value::Null,
        ValueDump::Bool(v) => Value::Bool(v),
        ValueDump::Int(v) => Value::Int(v),
        ValueDump::Float(v) => Value::Float(v),
        ValueDump::Ref { target } => heap
            .handle_at(target)
            .map(Value::Ref)
            .ok_or(DumpError::DanglingReference { object, target })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_dump_parses_every_shape() {
        let values: Vec<ValueDump> =
            serde_json::from_str(r#"[null, true, 3, 2.5, { "ref": 4 }]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ValueDump::Null,
                ValueDump::Bool(true),
                ValueDump::Int(3),
                ValueDump::Float(2.5),
                ValueDump::Ref { target: 4 },
            ]
        );
    }

    #[test]
    fn test_resolve_nested_array_names() {
        let mut heap = Heap::new();
        let ty = resolve_type(&mut heap, "int[][]").unwrap();
        assert_eq!(heap.types().name_of(ty), "int[][]");
        assert_eq!(
            resolve_type(&mut heap, "Missing[]"),
            Err(DumpError::UnknownType("Missing".to_string()))
        );
    }

    #[test]
    fn test_field_decl_flags() {
        let field = FieldDump {
            name: "x".to_string(),
            ty: "ref".to_string(),
            visibility: Visibility::Private,
            is_static: true,
            sealed: true,
        };
        let decl = field_decl("T", &field).unwrap();
        assert_eq!(decl.field_type(), FieldType::Reference);
        assert_eq!(decl.visibility(), Visibility::Private);
        assert!(decl.is_static());
        assert!(decl.is_sealed());

        let bad = FieldDump {
            ty: "quad".to_string(),
            ..field
        };
        assert!(matches!(
            field_decl("T", &bad),
            Err(DumpError::UnknownFieldType { .. })
        ));
    }
}
