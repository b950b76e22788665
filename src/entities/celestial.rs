// 🌌 Celestial Body Entity - a named mass
//
// Base for Planet. Updates with an unchanged value are accepted as no-ops and
// leave no event, so `modifications()` counts real changes only.

use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::registry::IdRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

/// Generated celestial body ids (planets included)
pub type CelestialRegistry = IdRegistry<String>;

/// Events shown on a body's sheet
pub const SHEET_EVENTS: usize = 3;

pub trait CelestialFields: EntityField {
    const ID: Self;
    const NAME: Self;
    const MASS_KG: Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CelestialField {
    Id,
    Name,
    MassKg,
}

impl EntityField for CelestialField {
    const ENTITY: &'static str = "celestial_body";

    fn definition(self) -> FieldDefinition {
        match self {
            CelestialField::Id => FieldDefinition::new(FieldType::Identifier)
                .with_rules(&[ValidationRule::NonEmpty]),
            CelestialField::Name => FieldDefinition::new(FieldType::Text)
                .controlled_by("update_name")
                .with_rules(&[ValidationRule::NonEmpty]),
            CelestialField::MassKg => FieldDefinition::new(FieldType::Number)
                .controlled_by("update_mass")
                .with_rules(&[ValidationRule::Positive])
                .with_description("Mass in kilograms"),
        }
    }
}

impl CelestialFields for CelestialField {
    const ID: Self = CelestialField::Id;
    const NAME: Self = CelestialField::Name;
    const MASS_KG: Self = CelestialField::MassKg;
}

/// Current values plus the most recent events
#[derive(Debug, Clone, Serialize)]
pub struct BodySheet<F> {
    pub id: String,
    pub name: String,
    pub mass_kg: f64,
    pub last_mass_update: Option<DateTime<Utc>>,
    pub modifications: usize,
    pub recent_events: Vec<Event<F>>,
}

#[derive(Debug)]
pub struct CelestialBody<F = CelestialField> {
    id: String,
    name: String,
    mass_kg: f64,
    last_mass_update: Option<DateTime<Utc>>,
    log: AuditLog<F>,
}

impl CelestialBody<CelestialField> {
    pub fn new(registry: &CelestialRegistry, name: &str, mass_kg: f64) -> EntityResult<Self> {
        Self::build(registry, name, mass_kg, Vec::new())
    }
}

impl<F: CelestialFields> CelestialBody<F> {
    pub(crate) fn build(
        registry: &CelestialRegistry,
        name: &str,
        mass_kg: f64,
        extra: Vec<(F, FieldValue)>,
    ) -> EntityResult<Self> {
        let name = name.trim();
        F::NAME.check(&name.into())?;
        F::MASS_KG.check(&mass_kg.into())?;

        let id = uuid::Uuid::new_v4().to_string();
        if !registry.claim(id.clone()) {
            return Err(EntityError::validation(
                F::ENTITY,
                F::ID.name(),
                format!("celestial body {} is already registered", id),
            )
            .logged());
        }

        let mut body = CelestialBody {
            log: AuditLog::new(id.clone()),
            id,
            name: name.to_string(),
            mass_kg,
            last_mass_update: None,
        };

        let mut snapshot = vec![
            (F::ID, FieldValue::from(&body.id)),
            (F::NAME, FieldValue::from(name)),
            (F::MASS_KG, FieldValue::from(mass_kg)),
        ];
        snapshot.extend(extra);
        body.record_event(EventKind::Created { snapshot });

        tracing::info!(entity = F::ENTITY, id = %body.id, name, mass_kg, "celestial body catalogued");
        Ok(body)
    }

    pub(crate) fn record_event(&mut self, kind: EventKind<F>) {
        self.log.record(SYSTEM_ACTOR, kind, None);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    /// Time of the last accepted mass change (None if never changed)
    pub fn last_mass_update(&self) -> Option<DateTime<Utc>> {
        self.last_mass_update
    }

    /// Accepted changes since creation
    pub fn modifications(&self) -> usize {
        self.log.len().saturating_sub(1)
    }

    pub fn audit_log(&self) -> AuditLog<F> {
        self.log.clone()
    }

    pub fn sheet(&self) -> BodySheet<F> {
        BodySheet {
            id: self.id.clone(),
            name: self.name.clone(),
            mass_kg: self.mass_kg,
            last_mass_update: self.last_mass_update,
            modifications: self.modifications(),
            recent_events: self.log.recent(SHEET_EVENTS),
        }
    }

    /// Returns Ok(false) if the name was already `name`
    pub fn update_name(&mut self, name: &str) -> EntityResult<bool> {
        let name = name.trim();
        F::NAME.check(&name.into())?;
        if name == self.name {
            return Ok(false);
        }

        let before = std::mem::replace(&mut self.name, name.to_string());
        self.record_event(EventKind::FieldUpdate {
            field: F::NAME,
            before: before.into(),
            after: name.into(),
        });
        Ok(true)
    }

    /// Returns Ok(false) if the mass was already `mass_kg`
    pub fn update_mass(&mut self, mass_kg: f64) -> EntityResult<bool> {
        F::MASS_KG.check(&mass_kg.into())?;
        if mass_kg == self.mass_kg {
            return Ok(false);
        }

        let before = std::mem::replace(&mut self.mass_kg, mass_kg);
        self.last_mass_update = Some(Utc::now());
        self.record_event(EventKind::FieldUpdate {
            field: F::MASS_KG,
            before: before.into(),
            after: mass_kg.into(),
        });
        Ok(true)
    }

    pub(crate) fn id_string(&self) -> &String {
        &self.id
    }

    pub(crate) fn snapshot(&self) -> Vec<Event<F>> {
        self.log.snapshot()
    }
}

impl Entity for CelestialBody<CelestialField> {
    type Id = String;
    type Field = CelestialField;

    fn id(&self) -> &String {
        &self.id
    }

    fn history(&self) -> Vec<Event<CelestialField>> {
        self.log.snapshot()
    }

    fn read_field(&self, field: CelestialField) -> FieldValue {
        match field {
            CelestialField::Id => (&self.id).into(),
            CelestialField::Name => (&self.name).into(),
            CelestialField::MassKg => self.mass_kg.into(),
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
    fn test_new_body_trims_name() {
        let registry = CelestialRegistry::new();
        let moon = CelestialBody::new(&registry, "  Luna ", 7.342e22).unwrap();

        assert_eq!(moon.name(), "Luna");
        assert_eq!(moon.modifications(), 0);
        assert!(moon.last_mass_update().is_none());
        assert!(registry.contains(&moon.id().to_string()));
    }

    #[test]
    fn test_construction_rules() {
        let registry = CelestialRegistry::new();

        assert!(CelestialBody::new(&registry, "", 1.0).unwrap_err().is_validation());
        assert!(CelestialBody::new(&registry, "Ceres", 0.0).unwrap_err().is_validation());
        assert!(CelestialBody::new(&registry, "Ceres", f64::NAN).unwrap_err().is_validation());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unchanged_values_leave_no_event() {
        let registry = CelestialRegistry::new();
        let mut ceres = CelestialBody::new(&registry, "Ceres", 9.39e20).unwrap();

        assert!(!ceres.update_name(" Ceres ").unwrap());
        assert!(!ceres.update_mass(9.39e20).unwrap());
        assert_eq!(ceres.history().len(), 1);

        assert!(ceres.update_mass(9.38e20).unwrap());
        assert!(ceres.last_mass_update().is_some());
        assert_eq!(ceres.modifications(), 1);
    }

    #[test]
    fn test_sheet_keeps_last_three_events() {
        let registry = CelestialRegistry::new();
        let mut body = CelestialBody::new(&registry, "Vesta", 2.59e20).unwrap();

        body.update_name("4 Vesta").unwrap();
        body.update_mass(2.6e20).unwrap();
        body.update_mass(2.7e20).unwrap();
        body.update_name("Vesta").unwrap();

        let sheet = body.sheet();
        assert_eq!(sheet.modifications, 4);
        assert_eq!(sheet.recent_events.len(), SHEET_EVENTS);
        assert_eq!(sheet.recent_events[2].field(), Some(CelestialField::Name));
        assert!(sheet
            .recent_events
            .iter()
            .all(|e| e.tag() == EventTag::FieldUpdate));
    }

    #[test]
    fn test_mass_not_assignable() {
        let registry = CelestialRegistry::new();
        let mut body = CelestialBody::new(&registry, "Vesta", 2.59e20).unwrap();

        assert!(body.assign("mass_kg", FieldValue::from(1.0)).unwrap_err().is_capability());
        assert_eq!(body.mass_kg(), 2.59e20);
    }
}
