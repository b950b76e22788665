// 🌾 Parcel Entity - a plot of land with a crop and a lifecycle status
//
// "The parcel number is IDENTITY, the crop is a VALUE"
//
// - id never changes and is unique within its registry
// - area_ha changes only through rectify_area (rounded to 2 decimals)
// - crop changes only through update_crop, and only while active

use super::round2;
use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::registry::IdRegistry;
use crate::status::ActiveStatus;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

/// Parcel numbers already in use
pub type ParcelRegistry = IdRegistry<u32>;

const STATUS_RULES: &[ValidationRule] = &[ValidationRule::OneOf(ActiveStatus::NAMES)];

// ============================================================================
// PARCEL FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParcelField {
    Id,
    AreaHa,
    Crop,
    Status,
}

impl EntityField for ParcelField {
    const ENTITY: &'static str = "parcel";

    fn definition(self) -> FieldDefinition {
        match self {
            ParcelField::Id => FieldDefinition::new(FieldType::Identifier)
                .with_rules(&[ValidationRule::Positive])
                .with_description("Parcel number, unique and fixed"),
            ParcelField::AreaHa => FieldDefinition::new(FieldType::Number)
                .controlled_by("rectify_area")
                .with_rules(&[ValidationRule::Positive])
                .with_description("Surface in hectares, 2 decimals"),
            ParcelField::Crop => FieldDefinition::new(FieldType::Text)
                .controlled_by("update_crop")
                .with_rules(&[ValidationRule::NonEmpty])
                .with_description("Crop currently planted"),
            ParcelField::Status => FieldDefinition::new(FieldType::Status)
                .controlled_by("activate/deactivate")
                .with_rules(STATUS_RULES),
        }
    }
}

// ============================================================================
// PARCEL ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Parcel {
    id: u32,
    area_ha: f64,
    crop: String,
    status: ActiveStatus,
    log: AuditLog<ParcelField>,
}

impl Parcel {
    /// Register a new active parcel.
    ///
    /// Fails without claiming the id if any value is invalid or the id is taken.
    pub fn new(registry: &ParcelRegistry, id: u32, area_ha: f64, crop: &str) -> EntityResult<Self> {
        let area_ha = round2(area_ha);
        let crop = crop.trim();

        ParcelField::Id.check(&id.into())?;
        ParcelField::AreaHa.check(&area_ha.into())?;
        ParcelField::Crop.check(&crop.into())?;

        if !registry.claim(id) {
            return Err(EntityError::validation(
                ParcelField::ENTITY,
                ParcelField::Id.name(),
                format!("parcel {} is already registered", id),
            )
            .logged());
        }

        let mut parcel = Parcel {
            id,
            area_ha,
            crop: crop.to_string(),
            status: ActiveStatus::default(),
            log: AuditLog::new(id.to_string()),
        };

        let snapshot = vec![
            (ParcelField::Id, FieldValue::from(id)),
            (ParcelField::AreaHa, FieldValue::from(area_ha)),
            (ParcelField::Crop, FieldValue::from(crop)),
            (ParcelField::Status, FieldValue::from(parcel.status)),
        ];
        parcel.record(EventKind::Created { snapshot }, None);

        tracing::info!(id, area_ha, crop, "parcel registered");
        Ok(parcel)
    }

    fn record(&mut self, kind: EventKind<ParcelField>, detail: Option<String>) {
        self.log.record(SYSTEM_ACTOR, kind, detail);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn area_ha(&self) -> f64 {
        self.area_ha
    }

    pub fn crop(&self) -> &str {
        &self.crop
    }

    pub fn status(&self) -> ActiveStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Owned copy of the event log
    pub fn audit_log(&self) -> AuditLog<ParcelField> {
        self.log.clone()
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Replace the crop. The parcel must be active and the crop must actually change.
    pub fn update_crop(&mut self, crop: &str) -> EntityResult<()> {
        if !self.is_active() {
            return Err(EntityError::state(
                ParcelField::ENTITY,
                format!("parcel {} is inactive, crop cannot change", self.id),
            )
            .logged());
        }

        let crop = crop.trim();
        ParcelField::Crop.check(&crop.into())?;

        if crop.to_lowercase() == self.crop.to_lowercase() {
            return Err(EntityError::validation(
                ParcelField::ENTITY,
                ParcelField::Crop.name(),
                format!("crop is already '{}'", self.crop),
            )
            .logged());
        }

        let before = std::mem::replace(&mut self.crop, crop.to_string());
        self.record(
            EventKind::FieldUpdate {
                field: ParcelField::Crop,
                before: before.into(),
                after: crop.into(),
            },
            None,
        );
        Ok(())
    }

    /// Returns true if the status changed
    pub fn activate(&mut self, reason: &str) -> bool {
        self.transition(ActiveStatus::Active, reason)
    }

    /// Returns true if the status changed
    pub fn deactivate(&mut self, reason: &str) -> bool {
        self.transition(ActiveStatus::Inactive, reason)
    }

    fn transition(&mut self, target: ActiveStatus, reason: &str) -> bool {
        if self.status == target {
            tracing::debug!(id = self.id, status = %target, "parcel already in requested status");
            return false;
        }

        let before = std::mem::replace(&mut self.status, target);
        self.record(
            EventKind::StatusChange {
                field: ParcelField::Status,
                before: before.into(),
                after: target.into(),
            },
            Some(reason.to_string()),
        );
        tracing::info!(id = self.id, from = %before, to = %target, reason, "parcel status changed");
        true
    }

    /// Correct the surveyed area
    pub fn rectify_area(&mut self, area_ha: f64, reason: &str) -> EntityResult<()> {
        let area_ha = round2(area_ha);
        ParcelField::AreaHa.check(&area_ha.into())?;

        let before = std::mem::replace(&mut self.area_ha, area_ha);
        self.record(
            EventKind::FieldUpdate {
                field: ParcelField::AreaHa,
                before: before.into(),
                after: area_ha.into(),
            },
            Some(reason.to_string()),
        );
        Ok(())
    }
}

impl Entity for Parcel {
    type Id = u32;
    type Field = ParcelField;

    fn id(&self) -> &u32 {
        &self.id
    }

    fn history(&self) -> Vec<Event<ParcelField>> {
        self.log.snapshot()
    }

    fn read_field(&self, field: ParcelField) -> FieldValue {
        match field {
            ParcelField::Id => self.id.into(),
            ParcelField::AreaHa => self.area_ha.into(),
            ParcelField::Crop => (&self.crop).into(),
            ParcelField::Status => self.status.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
