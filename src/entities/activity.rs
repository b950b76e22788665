// 🏃 Activity Entity - a named physical activity with a duration
//
// Base for Race, generic over its field enum like Publication.

use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::registry::IdRegistry;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

/// Generated activity ids (races included)
pub type ActivityRegistry = IdRegistry<String>;

const DURATION_RULES: &[ValidationRule] = &[ValidationRule::AtLeast(1.0)];

pub trait ActivityFields: EntityField {
    const ID: Self;
    const NAME: Self;
    const DURATION_MIN: Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityField {
    Id,
    Name,
    DurationMin,
}

impl EntityField for ActivityField {
    const ENTITY: &'static str = "activity";

    fn definition(self) -> FieldDefinition {
        match self {
            ActivityField::Id => FieldDefinition::new(FieldType::Identifier)
                .with_rules(&[ValidationRule::NonEmpty])
                .with_description("Generated UUID"),
            ActivityField::Name => FieldDefinition::new(FieldType::Text)
                .controlled_by("update_name")
                .with_rules(&[ValidationRule::NonEmpty]),
            ActivityField::DurationMin => FieldDefinition::new(FieldType::Integer)
                .controlled_by("update_duration")
                .with_rules(DURATION_RULES)
                .with_description("Minutes, at least 1"),
        }
    }
}

impl ActivityFields for ActivityField {
    const ID: Self = ActivityField::Id;
    const NAME: Self = ActivityField::Name;
    const DURATION_MIN: Self = ActivityField::DurationMin;
}

#[derive(Debug)]
pub struct Activity<F = ActivityField> {
    id: String,
    name: String,
    duration_min: u32,
    log: AuditLog<F>,
}

impl Activity<ActivityField> {
    pub fn new(registry: &ActivityRegistry, name: &str, duration_min: u32) -> EntityResult<Self> {
        Self::build(registry, name, duration_min, Vec::new())
    }
}

impl<F: ActivityFields> Activity<F> {
    pub(crate) fn build(
        registry: &ActivityRegistry,
        name: &str,
        duration_min: u32,
        extra: Vec<(F, FieldValue)>,
    ) -> EntityResult<Self> {
        let name = name.trim();
        F::NAME.check(&name.into())?;
        F::DURATION_MIN.check(&duration_min.into())?;

        let id = uuid::Uuid::new_v4().to_string();
        if !registry.claim(id.clone()) {
            return Err(EntityError::validation(
                F::ENTITY,
                F::ID.name(),
                format!("activity {} is already registered", id),
            )
            .logged());
        }

        let mut activity = Activity {
            log: AuditLog::new(id.clone()),
            id,
            name: name.to_string(),
            duration_min,
        };

        let mut snapshot = vec![
            (F::ID, FieldValue::from(&activity.id)),
            (F::NAME, FieldValue::from(name)),
            (F::DURATION_MIN, FieldValue::from(duration_min)),
        ];
        snapshot.extend(extra);
        activity.record_event(EventKind::Created { snapshot }, None);

        tracing::info!(entity = F::ENTITY, id = %activity.id, name, duration_min, "activity logged");
        Ok(activity)
    }

    pub(crate) fn record_event(&mut self, kind: EventKind<F>, detail: Option<String>) {
        self.log.record(SYSTEM_ACTOR, kind, detail);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_min(&self) -> u32 {
        self.duration_min
    }

    pub fn audit_log(&self) -> AuditLog<F> {
        self.log.clone()
    }

    pub fn update_name(&mut self, name: &str) -> EntityResult<()> {
        let name = name.trim();
        F::NAME.check(&name.into())?;

        let before = std::mem::replace(&mut self.name, name.to_string());
        self.record_event(
            EventKind::FieldUpdate {
                field: F::NAME,
                before: before.into(),
                after: name.into(),
            },
            None,
        );
        Ok(())
    }

    pub fn update_duration(&mut self, duration_min: u32) -> EntityResult<()> {
        F::DURATION_MIN.check(&duration_min.into())?;

        let before = std::mem::replace(&mut self.duration_min, duration_min);
        self.record_event(
            EventKind::FieldUpdate {
                field: F::DURATION_MIN,
                before: before.into(),
                after: duration_min.into(),
            },
            None,
        );
        Ok(())
    }

    pub(crate) fn id_string(&self) -> &String {
        &self.id
    }

    pub(crate) fn snapshot(&self) -> Vec<Event<F>> {
        self.log.snapshot()
    }
}

impl Entity for Activity<ActivityField> {
    type Id = String;
    type Field = ActivityField;

    fn id(&self) -> &String {
        &self.id
    }

    fn history(&self) -> Vec<Event<ActivityField>> {
        self.log.snapshot()
    }

    fn read_field(&self, field: ActivityField) -> FieldValue {
        match field {
            ActivityField::Id => (&self.id).into(),
            ActivityField::Name => (&self.name).into(),
            ActivityField::DurationMin => self.duration_min.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTag;

    #[test]
    fn test_new_activity_gets_registered_uuid() {
        let registry = ActivityRegistry::new();
        let walk = Activity::new(&registry, "Caminata", 30).unwrap();
        let swim = Activity::new(&registry, "Natación", 45).unwrap();

        assert_ne!(walk.id(), swim.id());
        assert!(uuid::Uuid::parse_str(walk.id()).is_ok());
        assert!(registry.contains(&walk.id().to_string()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_construction_rules() {
        let registry = ActivityRegistry::new();

        assert!(Activity::new(&registry, "  ", 30).unwrap_err().is_validation());
        assert!(Activity::new(&registry, "Yoga", 0).unwrap_err().is_validation());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_duration() {
        let registry = ActivityRegistry::new();
        let mut walk = Activity::new(&registry, "Caminata", 30).unwrap();

        walk.update_duration(45).unwrap();
        assert_eq!(walk.duration_min(), 45);

        let last = walk.history().pop().unwrap();
        assert_eq!(last.tag(), EventTag::FieldUpdate);
        assert_eq!(last.before(), Some(FieldValue::from(30_u32)));
        assert_eq!(last.after(), Some(FieldValue::from(45_u32)));

        assert!(walk.update_duration(0).unwrap_err().is_validation());
        assert!(walk.update_name("").unwrap_err().is_validation());
        assert_eq!(walk.history().len(), 2);
    }

    #[test]
    fn test_id_not_assignable() {
        let registry = ActivityRegistry::new();
        let mut walk = Activity::new(&registry, "Caminata", 30).unwrap();
        let id = walk.id().to_string();

        assert!(walk.assign("id", FieldValue::from("x")).unwrap_err().is_capability());
        assert!(walk.assign("calories", FieldValue::from(100_u32)).unwrap_err().is_capability());
        assert_eq!(walk.id(), id);
    }
}
