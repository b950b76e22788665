// 🏁 Race Entity - an activity over a measured distance
//
// Every change of duration or distance leaves a checkpoint.

use super::activity::{Activity, ActivityField, ActivityFields, ActivityRegistry};
use super::round2;
use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::EntityResult;
use crate::event::{Event, EventKind, FieldValue};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RaceField {
    Id,
    Name,
    DurationMin,
    DistanceKm,
}

impl EntityField for RaceField {
    const ENTITY: &'static str = "race";

    fn definition(self) -> FieldDefinition {
        match self {
            RaceField::Id => ActivityField::Id.definition(),
            RaceField::Name => ActivityField::Name.definition(),
            RaceField::DurationMin => ActivityField::DurationMin.definition(),
            RaceField::DistanceKm => FieldDefinition::new(FieldType::Number)
                .controlled_by("record_distance")
                .with_rules(&[ValidationRule::Positive]),
        }
    }
}

impl ActivityFields for RaceField {
    const ID: Self = RaceField::Id;
    const NAME: Self = RaceField::Name;
    const DURATION_MIN: Self = RaceField::DurationMin;
}

/// Distance and duration as they stood after a change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub distance_km: f64,
    pub duration_min: u32,
}

#[derive(Debug)]
pub struct Race {
    activity: Activity<RaceField>,
    distance_km: f64,
    checkpoints: Vec<Checkpoint>,
}

impl Race {
    pub fn new(
        registry: &ActivityRegistry,
        name: &str,
        duration_min: u32,
        distance_km: f64,
    ) -> EntityResult<Self> {
        RaceField::DistanceKm.check(&distance_km.into())?;

        let extra = vec![(RaceField::DistanceKm, FieldValue::from(distance_km))];
        let activity = Activity::build(registry, name, duration_min, extra)?;

        let mut race = Race {
            activity,
            distance_km,
            checkpoints: Vec::new(),
        };
        race.checkpoint();
        Ok(race)
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(Checkpoint {
            timestamp: Utc::now(),
            distance_km: self.distance_km,
            duration_min: self.activity.duration_min(),
        });
    }

    pub fn activity(&self) -> &Activity<RaceField> {
        &self.activity
    }

    pub fn name(&self) -> &str {
        self.activity.name()
    }

    pub fn duration_min(&self) -> u32 {
        self.activity.duration_min()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints.clone()
    }

    pub fn audit_log(&self) -> AuditLog<RaceField> {
        self.activity.audit_log()
    }

    /// Minutes per kilometre, 2 decimals
    pub fn pace_min_per_km(&self) -> f64 {
        round2(f64::from(self.duration_min()) / self.distance_km)
    }

    pub fn update_name(&mut self, name: &str) -> EntityResult<()> {
        self.activity.update_name(name)
    }

    pub fn update_duration(&mut self, duration_min: u32) -> EntityResult<()> {
        self.activity.update_duration(duration_min)?;
        self.checkpoint();
        Ok(())
    }

    pub fn record_distance(&mut self, distance_km: f64) -> EntityResult<()> {
        RaceField::DistanceKm.check(&distance_km.into())?;

        let before = std::mem::replace(&mut self.distance_km, distance_km);
        self.activity.record_event(
            EventKind::FieldUpdate {
                field: RaceField::DistanceKm,
                before: before.into(),
                after: distance_km.into(),
            },
            None,
        );
        self.checkpoint();

        tracing::info!(race = %self.activity.id(), distance_km, pace = self.pace_min_per_km(), "distance recorded");
        Ok(())
    }
}

impl Entity for Race {
    type Id = String;
    type Field = RaceField;

    fn id(&self) -> &String {
        self.activity.id_string()
    }

    fn history(&self) -> Vec<Event<RaceField>> {
        self.activity.snapshot()
    }

    fn read_field(&self, field: RaceField) -> FieldValue {
        match field {
            RaceField::Id => self.activity.id().into(),
            RaceField::Name => self.activity.name().into(),
            RaceField::DurationMin => self.activity.duration_min().into(),
            RaceField::DistanceKm => self.distance_km.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
