// Entity trait: identity + history + guarded field access

use crate::error::{CapabilityReason, EntityError, EntityResult};
use crate::event::{Event, FieldValue};
use crate::field::EntityField;

/// A uniquely identified record with validated fields and an audit trail.
pub trait Entity {
    type Id: Clone + PartialEq + std::fmt::Debug;
    type Field: EntityField;

    fn id(&self) -> &Self::Id;

    /// Copy of the audit log, oldest first
    fn history(&self) -> Vec<Event<Self::Field>>;

    fn read_field(&self, field: Self::Field) -> FieldValue;

    fn read_by_name(&self, name: &str) -> Option<FieldValue> {
        Self::Field::lookup(name).map(|field| self.read_field(field))
    }

    /// Direct write by field name.
    ///
    /// Entities expose no setters, so this always fails with a capability error
    /// naming the operation to use instead. State is never touched.
    fn assign(&mut self, name: &str, value: FieldValue) -> EntityResult<()> {
        Err(refuse_assignment::<Self::Field>(name, &value))
    }
}

/// Capability error for a direct write to `name` on an entity with fields `F`
pub fn refuse_assignment<F: EntityField>(name: &str, value: &FieldValue) -> EntityError {
    let reason = match F::lookup(name) {
        Some(field) => field.access().capability_reason(),
        None => CapabilityReason::UnknownField,
    };
    tracing::warn!(entity = F::ENTITY, field = name, %value, "direct assignment refused");
    EntityError::capability(F::ENTITY, name, reason)
}
