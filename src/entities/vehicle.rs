// 🚗 Vehicle Entity - a registered plate with a weight and an operating status
//
// "The plate is IDENTITY for the parking, the weight is a VALUE"
//
// - plate is normalized (trimmed, upper-case), must match the configured pattern,
//   and is unique within its registry
// - weight changes are refused while the vehicle is disabled
// - every event carries the user who performed the operation

use crate::audit::AuditLog;
use crate::config::VehicleSettings;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::registry::IdRegistry;
use crate::status::EnabledStatus;
use anyhow::Context;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

const STATUS_RULES: &[ValidationRule] = &[ValidationRule::OneOf(EnabledStatus::NAMES)];

// ============================================================================
// PLATE REGISTRY
// ============================================================================

/// Accepted plate format
#[derive(Debug, Clone)]
pub struct PlatePattern(Regex);

impl PlatePattern {
    pub fn new(pattern: &str) -> anyhow::Result<Self> {
        let regex = Regex::new(pattern).with_context(|| format!("Invalid plate pattern: {}", pattern))?;
        Ok(PlatePattern(regex))
    }

    pub fn is_match(&self, plate: &str) -> bool {
        self.0.is_match(plate)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Plates already registered, plus the format new plates must follow
#[derive(Debug, Clone)]
pub struct PlateRegistry {
    plates: IdRegistry<String>,
    pattern: PlatePattern,
}

impl PlateRegistry {
    pub fn new(pattern: PlatePattern) -> Self {
        PlateRegistry {
            plates: IdRegistry::new(),
            pattern,
        }
    }

    pub fn from_settings(settings: &VehicleSettings) -> anyhow::Result<Self> {
        Ok(Self::new(PlatePattern::new(&settings.plate_pattern)?))
    }

    pub fn pattern(&self) -> &PlatePattern {
        &self.pattern
    }

    /// Normalized lookup
    pub fn contains(&self, plate: &str) -> bool {
        self.plates.contains(&normalize_plate(plate))
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    fn claim(&self, plate: &str) -> bool {
        self.plates.claim(plate.to_string())
    }
}

pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

// ============================================================================
// VEHICLE FIELDS
// ============================================================================

pub trait VehicleFields: EntityField {
    const ID: Self;
    const PLATE: Self;
    const WEIGHT_KG: Self;
    const STATUS: Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleField {
    Id,
    Plate,
    WeightKg,
    Status,
}

impl EntityField for VehicleField {
    const ENTITY: &'static str = "vehicle";

    fn definition(self) -> FieldDefinition {
        match self {
            VehicleField::Id => FieldDefinition::new(FieldType::Identifier)
                .with_rules(&[ValidationRule::NonEmpty]),
            VehicleField::Plate => FieldDefinition::new(FieldType::Text)
                .with_rules(&[ValidationRule::NonEmpty])
                .with_description("Registration plate, fixed once registered"),
            VehicleField::WeightKg => FieldDefinition::new(FieldType::Number)
                .controlled_by("update_weight")
                .with_rules(&[ValidationRule::Positive]),
            VehicleField::Status => FieldDefinition::new(FieldType::Status)
                .controlled_by("enable/disable")
                .with_rules(STATUS_RULES),
        }
    }
}

impl VehicleFields for VehicleField {
    const ID: Self = VehicleField::Id;
    const PLATE: Self = VehicleField::Plate;
    const WEIGHT_KG: Self = VehicleField::WeightKg;
    const STATUS: Self = VehicleField::Status;
}

// ============================================================================
// VEHICLE SHEET
// ============================================================================

/// Current values plus the latest audit mark
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSheet<F> {
    pub id: String,
    pub plate: String,
    pub weight_kg: f64,
    pub status: EnabledStatus,
    pub last_adjusted_at: DateTime<Utc>,
    pub status_changes: u32,
    pub last_event: Option<Event<F>>,
}

// ============================================================================
// VEHICLE ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Vehicle<F = VehicleField> {
    id: String,
    plate: String,
    weight_kg: f64,
    status: EnabledStatus,
    last_adjusted_at: DateTime<Utc>,
    status_changes: u32,
    log: AuditLog<F>,
}

impl Vehicle<VehicleField> {
    pub fn new(registry: &PlateRegistry, plate: &str, weight_kg: f64, actor: &str) -> EntityResult<Self> {
        Self::build(registry, plate, weight_kg, actor, Vec::new())
    }
}

impl<F: VehicleFields> Vehicle<F> {
    pub(crate) fn build(
        registry: &PlateRegistry,
        plate: &str,
        weight_kg: f64,
        actor: &str,
        extra: Vec<(F, FieldValue)>,
    ) -> EntityResult<Self> {
        let plate = normalize_plate(plate);
        F::PLATE.check(&(&plate).into())?;
        if !registry.pattern().is_match(&plate) {
            return Err(EntityError::validation(
                F::ENTITY,
                F::PLATE.name(),
                format!("'{}' does not match the plate format {}", plate, registry.pattern().as_str()),
            )
            .logged());
        }
        F::WEIGHT_KG.check(&weight_kg.into())?;

        if !registry.claim(&plate) {
            return Err(EntityError::validation(
                F::ENTITY,
                F::PLATE.name(),
                format!("plate {} is already registered", plate),
            )
            .logged());
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut vehicle = Vehicle {
            log: AuditLog::new(id.clone()),
            id,
            plate,
            weight_kg,
            status: EnabledStatus::default(),
            last_adjusted_at: Utc::now(),
            status_changes: 0,
        };

        let mut snapshot = vec![
            (F::ID, FieldValue::from(&vehicle.id)),
            (F::PLATE, FieldValue::from(&vehicle.plate)),
            (F::WEIGHT_KG, FieldValue::from(weight_kg)),
            (F::STATUS, FieldValue::from(vehicle.status)),
        ];
        snapshot.extend(extra);
        vehicle.record_event(actor, EventKind::Created { snapshot }, None);

        tracing::info!(entity = F::ENTITY, plate = %vehicle.plate, weight_kg, actor, "vehicle registered");
        Ok(vehicle)
    }

    pub(crate) fn record_event(&mut self, actor: &str, kind: EventKind<F>, detail: Option<String>) {
        self.log.record(actor, kind, detail);
    }

    /// State error unless the vehicle is enabled
    pub(crate) fn ensure_enabled(&self, operation: &str) -> EntityResult<()> {
        if self.status.is_enabled() {
            return Ok(());
        }
        Err(EntityError::state(
            F::ENTITY,
            format!("{} refused, vehicle {} is {}", operation, self.plate, self.status),
        )
        .logged())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn status(&self) -> EnabledStatus {
        self.status
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    /// Creation time or the last accepted weight update
    pub fn last_adjusted_at(&self) -> DateTime<Utc> {
        self.last_adjusted_at
    }

    /// Number of accepted enable/disable transitions
    pub fn status_changes(&self) -> u32 {
        self.status_changes
    }

    pub fn audit_log(&self) -> AuditLog<F> {
        self.log.clone()
    }

    pub fn sheet(&self) -> VehicleSheet<F> {
        VehicleSheet {
            id: self.id.clone(),
            plate: self.plate.clone(),
            weight_kg: self.weight_kg,
            status: self.status,
            last_adjusted_at: self.last_adjusted_at,
            status_changes: self.status_changes,
            last_event: self.log.last(),
        }
    }

    pub(crate) fn id_string(&self) -> &String {
        &self.id
    }

    pub(crate) fn snapshot(&self) -> Vec<Event<F>> {
        self.log.snapshot()
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    pub fn update_weight(&mut self, weight_kg: f64, actor: &str) -> EntityResult<()> {
        self.ensure_enabled("weight update")?;
        F::WEIGHT_KG.check(&weight_kg.into())?;

        let before = std::mem::replace(&mut self.weight_kg, weight_kg);
        self.last_adjusted_at = Utc::now();
        self.record_event(
            actor,
            EventKind::FieldUpdate {
                field: F::WEIGHT_KG,
                before: before.into(),
                after: weight_kg.into(),
            },
            None,
        );
        Ok(())
    }

    /// Returns true if the status changed
    pub fn enable(&mut self, reason: &str, actor: &str) -> bool {
        self.transition(EnabledStatus::Enabled, reason, actor)
    }

    /// Returns true if the status changed
    pub fn disable(&mut self, reason: &str, actor: &str) -> bool {
        self.transition(EnabledStatus::Disabled, reason, actor)
    }

    fn transition(&mut self, target: EnabledStatus, reason: &str, actor: &str) -> bool {
        if self.status == target {
            tracing::debug!(plate = %self.plate, status = %target, "vehicle already in requested status");
            return false;
        }

        let before = std::mem::replace(&mut self.status, target);
        self.status_changes += 1;
        self.record_event(
            actor,
            EventKind::StatusChange {
                field: F::STATUS,
                before: before.into(),
                after: target.into(),
            },
            Some(reason.to_string()),
        );
        tracing::info!(plate = %self.plate, from = %before, to = %target, reason, actor, "vehicle status changed");
        true
    }
}

impl Entity for Vehicle<VehicleField> {
    type Id = String;
    type Field = VehicleField;

    fn id(&self) -> &String {
        &self.id
    }

    fn history(&self) -> Vec<Event<VehicleField>> {
        self.log.snapshot()
    }

    fn read_field(&self, field: VehicleField) -> FieldValue {
        match field {
            VehicleField::Id => (&self.id).into(),
            VehicleField::Plate => (&self.plate).into(),
            VehicleField::WeightKg => self.weight_kg.into(),
            VehicleField::Status => self.status.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
