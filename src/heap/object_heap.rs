use std::collections::HashMap;

use crate::heap::{
    heap_error::{AccessError, HeapError},
    heap_object::HeapObject,
    object_handle::ObjectHandle,
    type_registry::{Component, FieldDecl, FieldRef, FieldType, TypeId, TypeRegistry, Visibility},
    value::Value,
};

/// Access mode for reflective field reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Honors visibility: only public fields are readable.
    Checked,
    /// Bypasses visibility. Sealed fields remain closed.
    Forced,
}

/// Slot store of typed objects.
///
/// Objects are never freed: a handle stays valid for the lifetime of the heap.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    types: TypeRegistry,
    objects: Vec<HeapObject>,
    statics: HashMap<FieldRef, Value>,
}

impl Heap {
    /// Creates an empty heap whose registry only knows `Object`.
    pub fn new() -> Self {
        Self::with_types(TypeRegistry::new())
    }

    pub fn with_types(types: TypeRegistry) -> Self {
        Self {
            types,
            objects: Vec::new(),
            statics: HashMap::new(),
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Shorthand for [`TypeRegistry::declare_class`].
    pub fn declare_class(
        &mut self,
        name: impl Into<String>,
        parent: Option<TypeId>,
        fields: Vec<FieldDecl>,
    ) -> Result<TypeId, HeapError> {
        self.types.declare_class(name, parent, fields)
    }

    /// Allocates an instance with every slot zeroed (references are null).
    pub fn alloc_instance(&mut self, ty: TypeId) -> Result<ObjectHandle, HeapError> {
        let desc = self
            .types
            .get(ty)
            .ok_or_else(|| HeapError::UnknownType(format!("#{}", ty.index())))?;
        if desc.is_array() {
            return Err(HeapError::NotAClass(desc.name().to_string()));
        }

        let mut fields = vec![Value::Null; desc.instance_slot_count() as usize];
        for (field, decl) in self.types.instance_fields(ty) {
            if let (FieldType::Primitive(p), Some(slot)) =
                (decl.field_type(), self.types.slot_of(field))
            {
                fields[slot as usize] = p.zero();
            }
        }

        self.push(HeapObject::Instance { ty, fields })
    }

    /// Allocates an array holding `elements`.
    pub fn alloc_array(
        &mut self,
        component: Component,
        elements: Vec<Value>,
    ) -> Result<ObjectHandle, HeapError> {
        let ty = self.types.array_of(component)?;
        let expected = component.field_type();
        for element in &elements {
            self.check_value(expected, element)?;
        }
        self.push(HeapObject::Array { ty, elements })
    }

    /// Allocates an array of `len` zeroed (or null) elements.
    pub fn alloc_array_with_len(
        &mut self,
        component: Component,
        len: usize,
    ) -> Result<ObjectHandle, HeapError> {
        let zero = match component {
            Component::Primitive(p) => p.zero(),
            Component::Object(_) => Value::Null,
        };
        self.alloc_array(component, vec![zero; len])
    }

    fn push(&mut self, object: HeapObject) -> Result<ObjectHandle, HeapError> {
        let index = u32::try_from(self.objects.len()).map_err(|_| HeapError::HeapFull)?;
        self.objects.push(object);
        Ok(ObjectHandle(index))
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&HeapObject> {
        self.objects.get(handle.0 as usize)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        (handle.0 as usize) < self.objects.len()
    }

    pub fn type_of(&self, handle: ObjectHandle) -> Option<TypeId> {
        self.get(handle).map(HeapObject::type_id)
    }

    /// Returns the handle of the object allocated `index`-th.
    pub fn handle_at(&self, index: usize) -> Option<ObjectHandle> {
        (index < self.objects.len()).then_some(ObjectHandle(index as u32))
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        (0..self.objects.len() as u32).map(ObjectHandle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Writes `value` into the field named `name`, resolved from the
    /// object's own type upward.
    pub fn set(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), HeapError> {
        let ty = self
            .type_of(handle)
            .ok_or(HeapError::DanglingHandle(handle))?;
        let field = self
            .types
            .resolve_field(ty, name)
            .ok_or_else(|| HeapError::UnknownField {
                ty: self.types.name_of(ty).to_string(),
                field: name.to_string(),
            })?;
        self.set_field(handle, field, value)
    }

    /// Writes `value` into a specific declared field, including ancestor
    /// fields shadowed by the object's own type.
    pub fn set_field(
        &mut self,
        handle: ObjectHandle,
        field: FieldRef,
        value: impl Into<Value>,
    ) -> Result<(), HeapError> {
        let value = value.into();
        let ty = match self.get(handle) {
            Some(HeapObject::Instance { ty, .. }) => *ty,
            Some(HeapObject::Array { .. }) => return Err(HeapError::NotAnInstance(handle)),
            None => return Err(HeapError::DanglingHandle(handle)),
        };

        let decl = self
            .types
            .field(field)
            .ok_or_else(|| HeapError::UnknownField {
                ty: self.types.name_of(ty).to_string(),
                field: format!("#{}", field.index()),
            })?;
        if !self.types.is_subtype(ty, field.owner()) {
            return Err(HeapError::UnknownField {
                ty: self.types.name_of(ty).to_string(),
                field: decl.name().to_string(),
            });
        }
        let slot = self
            .types
            .slot_of(field)
            .ok_or_else(|| HeapError::StaticField {
                ty: self.types.name_of(field.owner()).to_string(),
                field: decl.name().to_string(),
            })?;
        self.check_value(decl.field_type(), &value)?;

        if let Some(HeapObject::Instance { fields, .. }) = self.objects.get_mut(handle.0 as usize) {
            fields[slot as usize] = value;
        }
        Ok(())
    }

    /// Writes `value` into the array element at `index`.
    pub fn set_element(
        &mut self,
        handle: ObjectHandle,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), HeapError> {
        let value = value.into();
        let (ty, len) = match self.get(handle) {
            Some(HeapObject::Array { ty, elements }) => (*ty, elements.len()),
            Some(HeapObject::Instance { .. }) => return Err(HeapError::NotAnArray(handle)),
            None => return Err(HeapError::DanglingHandle(handle)),
        };
        if index >= len {
            return Err(HeapError::IndexOutOfBounds { handle, index, len });
        }
        if let Some(component) = self.types.get(ty).and_then(|desc| desc.component()) {
            self.check_value(component.field_type(), &value)?;
        }

        if let Some(HeapObject::Array { elements, .. }) = self.objects.get_mut(handle.0 as usize) {
            elements[index] = value;
        }
        Ok(())
    }

    pub fn element(&self, handle: ObjectHandle, index: usize) -> Result<Value, HeapError> {
        match self.get(handle) {
            Some(HeapObject::Array { elements, .. }) => {
                elements
                    .get(index)
                    .copied()
                    .ok_or(HeapError::IndexOutOfBounds {
                        handle,
                        index,
                        len: elements.len(),
                    })
            }
            Some(HeapObject::Instance { .. }) => Err(HeapError::NotAnArray(handle)),
            None => Err(HeapError::DanglingHandle(handle)),
        }
    }

    /// Writes a class-level field. Statics are never part of an instance.
    pub fn set_static(&mut self, field: FieldRef, value: impl Into<Value>) -> Result<(), HeapError> {
        let value = value.into();
        let decl = self
            .types
            .field(field)
            .ok_or_else(|| HeapError::UnknownType(format!("#{}", field.owner().index())))?;
        if !decl.is_static() {
            return Err(HeapError::UnknownField {
                ty: self.types.name_of(field.owner()).to_string(),
                field: decl.name().to_string(),
            });
        }
        self.check_value(decl.field_type(), &value)?;
        self.statics.insert(field, value);
        Ok(())
    }

    pub fn static_value(&self, field: FieldRef) -> Option<Value> {
        self.statics.get(&field).copied()
    }

    /// Reads an instance field the way reflection would.
    ///
    /// Sealed fields always fail. Non-public fields fail under
    /// [`Access::Checked`] and are opened under [`Access::Forced`].
    pub fn read_field(
        &self,
        handle: ObjectHandle,
        field: FieldRef,
        access: Access,
    ) -> Result<Value, AccessError> {
        let (ty, fields) = match self.get(handle) {
            Some(HeapObject::Instance { ty, fields }) => (*ty, fields),
            Some(HeapObject::Array { .. }) => return Err(AccessError::NotAnInstance(handle)),
            None => return Err(AccessError::DanglingHandle(handle)),
        };
        let decl = self.types.field(field).ok_or(AccessError::UnknownField)?;

        if decl.is_static() {
            return Err(AccessError::StaticField {
                field: decl.name().to_string(),
            });
        }
        if !self.types.is_subtype(ty, field.owner()) {
            return Err(AccessError::NotAMember {
                field: decl.name().to_string(),
                ty: self.types.name_of(ty).to_string(),
            });
        }
        if decl.is_sealed() {
            return Err(AccessError::Inaccessible {
                field: decl.name().to_string(),
            });
        }
        if access == Access::Checked && decl.visibility() != Visibility::Public {
            return Err(AccessError::IllegalAccess {
                field: decl.name().to_string(),
                visibility: decl.visibility(),
            });
        }

        self.types
            .slot_of(field)
            .and_then(|slot| fields.get(slot as usize).copied())
            .ok_or(AccessError::UnknownField)
    }

    fn check_value(&self, expected: FieldType, value: &Value) -> Result<(), HeapError> {
        match (expected, value) {
            (FieldType::Reference, Value::Null) => Ok(()),
            (FieldType::Reference, Value::Ref(target)) => {
                if self.contains(*target) {
                    Ok(())
                } else {
                    Err(HeapError::DanglingHandle(*target))
                }
            }
            (FieldType::Primitive(p), v) if p.accepts(v) => Ok(()),
            (expected, v) => Err(HeapError::TypeMismatch {
                expected: expected.label().to_string(),
                found: v.type_name(),
            }),
        }
    }
}
