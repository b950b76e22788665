// 🪐 Planet Entity - a celestial body with a radius and an orbit
//
// Distance comparison is a compile-time capability: anything implementing
// `OrbitsSun` can be compared, nothing else type-checks.

use super::celestial::{BodySheet, CelestialBody, CelestialField, CelestialFields, CelestialRegistry};
use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::EntityResult;
use crate::event::{Event, EventKind, FieldValue};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use serde::Serialize;
use std::cmp::Ordering;
use std::f64::consts::PI;
use strum::{Display, EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanetField {
    Id,
    Name,
    MassKg,
    RadiusKm,
    SunDistanceKm,
}

impl EntityField for PlanetField {
    const ENTITY: &'static str = "planet";

    fn definition(self) -> FieldDefinition {
        match self {
            PlanetField::Id => CelestialField::Id.definition(),
            PlanetField::Name => CelestialField::Name.definition(),
            PlanetField::MassKg => CelestialField::MassKg.definition(),
            PlanetField::RadiusKm => FieldDefinition::new(FieldType::Number)
                .controlled_by("update_radius")
                .with_rules(&[ValidationRule::Positive]),
            PlanetField::SunDistanceKm => FieldDefinition::new(FieldType::Number)
                .controlled_by("update_sun_distance")
                .with_rules(&[ValidationRule::Positive])
                .with_description("Mean distance to the Sun in km"),
        }
    }
}

impl CelestialFields for PlanetField {
    const ID: Self = PlanetField::Id;
    const NAME: Self = PlanetField::Name;
    const MASS_KG: Self = PlanetField::MassKg;
}

// ============================================================================
// ORBIT COMPARISON
// ============================================================================

/// Bodies with a known mean distance to the Sun
pub trait OrbitsSun {
    fn sun_distance_km(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Proximity {
    Closer,
    Farther,
    Equidistant,
}

// ============================================================================
// PLANET ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Planet {
    body: CelestialBody<PlanetField>,
    radius_km: f64,
    sun_distance_km: f64,
}

impl Planet {
    pub fn new(
        registry: &CelestialRegistry,
        name: &str,
        mass_kg: f64,
        radius_km: f64,
        sun_distance_km: f64,
    ) -> EntityResult<Self> {
        PlanetField::RadiusKm.check(&radius_km.into())?;
        PlanetField::SunDistanceKm.check(&sun_distance_km.into())?;

        let extra = vec![
            (PlanetField::RadiusKm, FieldValue::from(radius_km)),
            (PlanetField::SunDistanceKm, FieldValue::from(sun_distance_km)),
        ];
        let body = CelestialBody::build(registry, name, mass_kg, extra)?;

        Ok(Planet {
            body,
            radius_km,
            sun_distance_km,
        })
    }

    pub fn body(&self) -> &CelestialBody<PlanetField> {
        &self.body
    }

    pub fn name(&self) -> &str {
        self.body.name()
    }

    pub fn mass_kg(&self) -> f64 {
        self.body.mass_kg()
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Sphere volume: 4/3 · π · r³
    pub fn volume_km3(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius_km.powi(3)
    }

    pub fn density_kg_km3(&self) -> f64 {
        self.mass_kg() / self.volume_km3()
    }

    pub fn audit_log(&self) -> AuditLog<PlanetField> {
        self.body.audit_log()
    }

    pub fn sheet(&self) -> BodySheet<PlanetField> {
        self.body.sheet()
    }

    /// How this planet's orbit relates to `other`'s
    pub fn compare_distance<T: OrbitsSun>(&self, other: &T) -> Proximity {
        match self.sun_distance_km.partial_cmp(&other.sun_distance_km()) {
            Some(Ordering::Less) => Proximity::Closer,
            Some(Ordering::Greater) => Proximity::Farther,
            _ => Proximity::Equidistant,
        }
    }

    pub fn update_name(&mut self, name: &str) -> EntityResult<bool> {
        self.body.update_name(name)
    }

    pub fn update_mass(&mut self, mass_kg: f64) -> EntityResult<bool> {
        self.body.update_mass(mass_kg)
    }

    pub fn update_radius(&mut self, radius_km: f64) -> EntityResult<bool> {
        PlanetField::RadiusKm.check(&radius_km.into())?;
        if radius_km == self.radius_km {
            return Ok(false);
        }

        let before = std::mem::replace(&mut self.radius_km, radius_km);
        self.body.record_event(EventKind::FieldUpdate {
            field: PlanetField::RadiusKm,
            before: before.into(),
            after: radius_km.into(),
        });
        Ok(true)
    }

    pub fn update_sun_distance(&mut self, sun_distance_km: f64) -> EntityResult<bool> {
        PlanetField::SunDistanceKm.check(&sun_distance_km.into())?;
        if sun_distance_km == self.sun_distance_km {
            return Ok(false);
        }

        let before = std::mem::replace(&mut self.sun_distance_km, sun_distance_km);
        self.body.record_event(EventKind::FieldUpdate {
            field: PlanetField::SunDistanceKm,
            before: before.into(),
            after: sun_distance_km.into(),
        });
        tracing::info!(planet = self.name(), from = before, to = sun_distance_km, "orbit updated");
        Ok(true)
    }
}

impl OrbitsSun for Planet {
    fn sun_distance_km(&self) -> f64 {
        self.sun_distance_km
    }
}

impl Entity for Planet {
    type Id = String;
    type Field = PlanetField;

    fn id(&self) -> &String {
        self.body.id_string()
    }

    fn history(&self) -> Vec<Event<PlanetField>> {
        self.body.snapshot()
    }

    fn read_field(&self, field: PlanetField) -> FieldValue {
        match field {
            PlanetField::Id => self.body.id().into(),
            PlanetField::Name => self.body.name().into(),
            PlanetField::MassKg => self.body.mass_kg().into(),
            PlanetField::RadiusKm => self.radius_km.into(),
            PlanetField::SunDistanceKm => self.sun_distance_km.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
