use std::borrow::Cow;

use tracing::trace;

use crate::{
    heap::{Access, Component, FieldRef, Heap, ObjectHandle, TypeId, Value},
    introspect::Introspect,
};

impl Introspect for Heap {
    type Handle = ObjectHandle;
    type Type = TypeId;
    type Field = FieldRef;

    fn type_of(&self, object: ObjectHandle) -> Option<TypeId> {
        Heap::type_of(self, object)
    }

    fn type_name(&self, ty: TypeId) -> Cow<'_, str> {
        Cow::Borrowed(self.types().name_of(ty))
    }

    fn is_reference_array(&self, ty: TypeId) -> bool {
        matches!(
            self.types().get(ty).and_then(|desc| desc.component()),
            Some(Component::Object(_))
        )
    }

    fn elements(&self, object: ObjectHandle) -> impl Iterator<Item = Option<ObjectHandle>> + '_ {
        self.get(object)
            .map_or(&[][..], |obj| obj.elements())
            .iter()
            .map(Value::as_ref)
    }

    fn fields_of(&self, ty: TypeId) -> Vec<FieldRef> {
        self.types()
            .instance_fields(ty)
            .map(|(field, _)| field)
            .collect()
    }

    fn value_of(&self, field: FieldRef, object: ObjectHandle) -> Option<ObjectHandle> {
        match self.read_field(object, field, Access::Forced) {
            Ok(value) => value.as_ref(),
            Err(err) => {
                trace!(object = %object, error = %err, "field read refused");
                None
            }
        }
    }
}
