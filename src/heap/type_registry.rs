use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::heap::{heap_error::HeapError, value::PrimitiveType};

/// Most fields a single class may declare, statics included.
pub const MAX_DECLARED_FIELDS: usize = u16::MAX as usize;

/// Index of a type in the [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// The root of the type hierarchy. Every chain ends here.
    pub const OBJECT: TypeId = TypeId(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(PrimitiveType),
    Reference,
}

impl FieldType {
    pub fn label(self) -> &'static str {
        match self {
            FieldType::Primitive(p) => p.label(),
            FieldType::Reference => "ref",
        }
    }
}

/// A field declared by a class type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    name: String,
    ty: FieldType,
    visibility: Visibility,
    is_static: bool,
    sealed: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            sealed: false,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Reference)
    }

    pub fn primitive(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self::new(name, FieldType::Primitive(ty))
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    /// Marks the field as class-level. Static fields have no instance slot.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the field as sealed: not even forced access can read it.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// Array component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Primitive(PrimitiveType),
    Object(TypeId),
}

impl Component {
    pub fn field_type(self) -> FieldType {
        match self {
            Component::Primitive(p) => FieldType::Primitive(p),
            Component::Object(_) => FieldType::Reference,
        }
    }
}

/// Accessor for one declared field: the declaring type plus the declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    owner: TypeId,
    index: u16,
}

impl FieldRef {
    /// `None` when `index` does not fit a field index.
    pub(crate) fn new(owner: TypeId, index: usize) -> Option<Self> {
        let index = u16::try_from(index).ok()?;
        Some(Self { owner, index })
    }

    pub fn owner(self) -> TypeId {
        self.owner
    }

    pub fn index(self) -> u16 {
        self.index
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Class {
        parent: Option<TypeId>,
        fields: Vec<FieldDecl>,
    },
    Array {
        component: Component,
    },
}

/// Runtime type with its instance slot layout.
///
/// Instance slots are laid out root-most ancestor first, so a subclass
/// layout always extends its parent's layout.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: String,
    kind: TypeKind,
    slots: Vec<Option<u32>>,
    instance_slots: u32,
}

impl TypeDescriptor {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Direct supertype. Arrays extend `Object`; `Object` has no parent.
    pub fn parent(&self) -> Option<TypeId> {
        match &self.kind {
            TypeKind::Class { parent, .. } => *parent,
            TypeKind::Array { .. } => Some(TypeId::OBJECT),
        }
    }

    pub fn declared_fields(&self) -> &[FieldDecl] {
        match &self.kind {
            TypeKind::Class { fields, .. } => fields,
            TypeKind::Array { .. } => &[],
        }
    }

    pub fn component(&self) -> Option<Component> {
        match &self.kind {
            TypeKind::Array { component } => Some(*component),
            TypeKind::Class { .. } => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// Number of instance slots across the whole ancestor chain.
    pub fn instance_slot_count(&self) -> u32 {
        self.instance_slots
    }

    /// Instance slot of the declared field at `index`, `None` for statics.
    pub fn slot_of(&self, index: u16) -> Option<u32> {
        self.slots.get(index as usize).copied().flatten()
    }
}

/// Walks a type and its supertypes, most specific first.
pub struct Ancestors<'a> {
    registry: &'a TypeRegistry,
    next: Option<TypeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.registry.get(self.next?)?;
        self.next = descriptor.parent();
        Some(descriptor)
    }
}

/// Registry of every type known to a heap.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
    arrays: HashMap<Component, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry holding only the root type `Object`.
    pub fn new() -> Self {
        let root = TypeDescriptor {
            id: TypeId::OBJECT,
            name: String::from("Object"),
            kind: TypeKind::Class {
                parent: None,
                fields: Vec::new(),
            },
            slots: Vec::new(),
            instance_slots: 0,
        };
        let mut by_name = HashMap::new();
        by_name.insert(root.name.clone(), TypeId::OBJECT);
        Self {
            types: vec![root],
            by_name,
            arrays: HashMap::new(),
        }
    }

    /// Declares a class type. A missing parent means `Object`.
    pub fn declare_class(
        &mut self,
        name: impl Into<String>,
        parent: Option<TypeId>,
        fields: Vec<FieldDecl>,
    ) -> Result<TypeId, HeapError> {
        let name = name.into();
        if name.is_empty() || name.contains('[') || name.contains(']') {
            return Err(HeapError::InvalidTypeName(name));
        }
        if self.by_name.contains_key(&name) {
            return Err(HeapError::DuplicateType(name));
        }

        let parent = parent.unwrap_or(TypeId::OBJECT);
        let parent_desc = self
            .get(parent)
            .ok_or_else(|| HeapError::UnknownType(format!("#{}", parent.0)))?;
        if parent_desc.is_array() {
            return Err(HeapError::InvalidParent {
                ty: name,
                parent: parent_desc.name.clone(),
            });
        }

        if fields.len() > MAX_DECLARED_FIELDS {
            return Err(HeapError::TooManyFields {
                ty: name,
                count: fields.len(),
            });
        }
        let mut seen = HashSet::with_capacity(fields.len());
        if let Some(dup) = fields.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(HeapError::DuplicateField {
                field: dup.name.clone(),
                ty: name,
            });
        }

        let mut next_slot = parent_desc.instance_slots;
        let slots = fields
            .iter()
            .map(|field| {
                if field.is_static {
                    None
                } else {
                    next_slot += 1;
                    Some(next_slot - 1)
                }
            })
            .collect();

        let id = TypeId(self.types.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.types.push(TypeDescriptor {
            id,
            name,
            kind: TypeKind::Class {
                parent: Some(parent),
                fields,
            },
            slots,
            instance_slots: next_slot,
        });
        Ok(id)
    }

    /// Returns the array type for `component`, creating it on first use.
    pub fn array_of(&mut self, component: Component) -> Result<TypeId, HeapError> {
        if let Some(id) = self.arrays.get(&component) {
            return Ok(*id);
        }

        let name = match component {
            Component::Primitive(p) => format!("{}[]", p.label()),
            Component::Object(ty) => {
                let desc = self
                    .get(ty)
                    .ok_or_else(|| HeapError::UnknownType(format!("#{}", ty.0)))?;
                format!("{}[]", desc.name)
            }
        };

        let id = TypeId(self.types.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.arrays.insert(component, id);
        self.types.push(TypeDescriptor {
            id,
            name,
            kind: TypeKind::Array { component },
            slots: Vec::new(),
            instance_slots: 0,
        });
        Ok(id)
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.0 as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map_or("<unknown>", |desc| desc.name())
    }

    pub fn ancestors(&self, id: TypeId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: Some(id),
        }
    }

    pub fn is_subtype(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.ancestors(ty).any(|desc| desc.id == ancestor)
    }

    pub fn field(&self, field: FieldRef) -> Option<&FieldDecl> {
        self.get(field.owner)?
            .declared_fields()
            .get(field.index as usize)
    }

    /// Finds `name` on `ty` or its nearest ancestor declaring it.
    ///
    /// A subclass field shadows an ancestor field of the same name.
    pub fn resolve_field(&self, ty: TypeId, name: &str) -> Option<FieldRef> {
        self.ancestors(ty).find_map(|desc| {
            desc.declared_fields()
                .iter()
                .position(|f| f.name == name)
                .and_then(|index| FieldRef::new(desc.id, index))
        })
    }

    /// Looks up a field declared directly by `owner`.
    pub fn declared_field(&self, owner: TypeId, name: &str) -> Option<FieldRef> {
        let index = self
            .get(owner)?
            .declared_fields()
            .iter()
            .position(|f| f.name == name)?;
        FieldRef::new(owner, index)
    }

    /// Instance slot backing `field`, `None` for statics and unknown fields.
    pub fn slot_of(&self, field: FieldRef) -> Option<u32> {
        self.get(field.owner)?.slot_of(field.index)
    }

    /// Every instance field of `ty` and its ancestors, most specific type first.
    pub fn instance_fields(
        &self,
        ty: TypeId,
    ) -> impl Iterator<Item = (FieldRef, &FieldDecl)> + '_ {
        self.ancestors(ty).flat_map(|desc| {
            desc.declared_fields()
                .iter()
                .enumerate()
                .filter(|(_, field)| !field.is_static)
                .filter_map(move |(index, field)| Some((FieldRef::new(desc.id, index)?, field)))
        })
    }
}
