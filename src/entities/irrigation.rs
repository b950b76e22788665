// 💧 Irrigated Parcel - a parcel plus the irrigation system that waters it
//
// The irrigation system is a dependent sub-resource with its own log:
// - water_l changes only through load_water / irrigate
// - irrigation is refused while the parcel is inactive or the system disabled
// - deactivating the parcel forces the system to disabled

use super::parcel::{Parcel, ParcelField, ParcelRegistry};
use crate::audit::AuditLog;
use crate::config::IrrigationSettings;
use crate::consumption::{allocate, Allocation, ConsumptionPolicy};
use crate::entity::{refuse_assignment, Entity};
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::status::{ActiveStatus, EnabledStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

const STATUS_RULES: &[ValidationRule] = &[ValidationRule::OneOf(EnabledStatus::NAMES)];

// ============================================================================
// IRRIGATION FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IrrigationField {
    Status,
    RateLHa,
    ThresholdL,
    WaterL,
}

impl EntityField for IrrigationField {
    const ENTITY: &'static str = "irrigated_parcel";

    fn definition(self) -> FieldDefinition {
        match self {
            IrrigationField::Status => FieldDefinition::new(FieldType::Status)
                .controlled_by("enable_irrigation/disable_irrigation")
                .with_rules(STATUS_RULES),
            IrrigationField::RateLHa => FieldDefinition::new(FieldType::Number)
                .controlled_by("configure_rate")
                .with_rules(&[ValidationRule::Positive])
                .with_description("Liters applied per hectare"),
            IrrigationField::ThresholdL => FieldDefinition::new(FieldType::Number)
                .controlled_by("configure_threshold")
                .with_rules(&[ValidationRule::NonNegative])
                .with_description("Liters that must remain after irrigating"),
            IrrigationField::WaterL => FieldDefinition::new(FieldType::Number)
                .controlled_by("load_water/irrigate")
                .with_rules(&[ValidationRule::NonNegative])
                .with_description("Liters available"),
        }
    }
}

// ============================================================================
// IRRIGATION RUN
// ============================================================================

/// One applied irrigation, kept for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationRun {
    pub timestamp: DateTime<Utc>,
    pub requested_l: f64,
    pub applied_l: f64,
    pub balance_before_l: f64,
    pub balance_after_l: f64,
    pub policy: ConsumptionPolicy,
}

// ============================================================================
// IRRIGATION SYSTEM
// ============================================================================

/// Read-only view of the irrigation sub-resource. Mutated only by its parcel.
#[derive(Debug)]
pub struct IrrigationSystem {
    status: EnabledStatus,
    rate_l_ha: f64,
    threshold_l: f64,
    water_l: f64,
    runs: Vec<IrrigationRun>,
    log: AuditLog<IrrigationField>,
}

impl IrrigationSystem {
    pub fn status(&self) -> EnabledStatus {
        self.status
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    pub fn rate_l_ha(&self) -> f64 {
        self.rate_l_ha
    }

    pub fn threshold_l(&self) -> f64 {
        self.threshold_l
    }

    pub fn water_l(&self) -> f64 {
        self.water_l
    }

    pub fn audit_log(&self) -> AuditLog<IrrigationField> {
        self.log.clone()
    }

    fn record(&mut self, kind: EventKind<IrrigationField>, detail: Option<String>) {
        self.log.record(SYSTEM_ACTOR, kind, detail);
    }

    fn set_status(&mut self, target: EnabledStatus, detail: Option<String>) -> bool {
        if self.status == target {
            return false;
        }

        let before = std::mem::replace(&mut self.status, target);
        self.record(
            EventKind::StatusChange {
                field: IrrigationField::Status,
                before: before.into(),
                after: target.into(),
            },
            detail,
        );
        tracing::info!(from = %before, to = %target, "irrigation status changed");
        true
    }
}

// ============================================================================
// IRRIGATED PARCEL
// ============================================================================

#[derive(Debug)]
pub struct IrrigatedParcel {
    parcel: Parcel,
    irrigation: IrrigationSystem,
}

impl IrrigatedParcel {
    /// Register a parcel with irrigation configured from `settings`.
    pub fn new(
        registry: &ParcelRegistry,
        id: u32,
        area_ha: f64,
        crop: &str,
        settings: &IrrigationSettings,
    ) -> EntityResult<Self> {
        IrrigationField::RateLHa.check(&settings.default_rate_l_ha.into())?;
        IrrigationField::ThresholdL.check(&settings.default_threshold_l.into())?;

        let parcel = Parcel::new(registry, id, area_ha, crop)?;

        let status = match parcel.status() {
            ActiveStatus::Active => EnabledStatus::Enabled,
            ActiveStatus::Inactive => EnabledStatus::Disabled,
        };
        let mut irrigation = IrrigationSystem {
            status,
            rate_l_ha: settings.default_rate_l_ha,
            threshold_l: settings.default_threshold_l,
            water_l: 0.0,
            runs: Vec::new(),
            log: AuditLog::new(id.to_string()),
        };

        let snapshot = vec![
            (IrrigationField::Status, FieldValue::from(status)),
            (IrrigationField::RateLHa, FieldValue::from(irrigation.rate_l_ha)),
            (IrrigationField::ThresholdL, FieldValue::from(irrigation.threshold_l)),
            (IrrigationField::WaterL, FieldValue::from(0.0)),
        ];
        irrigation.record(EventKind::Created { snapshot }, None);

        Ok(IrrigatedParcel { parcel, irrigation })
    }

    pub fn parcel(&self) -> &Parcel {
        &self.parcel
    }

    pub fn irrigation(&self) -> &IrrigationSystem {
        &self.irrigation
    }

    /// Liters one irrigation asks for: area × rate
    pub fn demand_l(&self) -> f64 {
        self.parcel.area_ha() * self.irrigation.rate_l_ha
    }

    /// Applied irrigations, oldest first
    pub fn irrigation_runs(&self) -> Vec<IrrigationRun> {
        self.irrigation.runs.clone()
    }

    // ------------------------------------------------------------------------
    // Parcel operations
    // ------------------------------------------------------------------------

    pub fn update_crop(&mut self, crop: &str) -> EntityResult<()> {
        self.parcel.update_crop(crop)
    }

    pub fn rectify_area(&mut self, area_ha: f64, reason: &str) -> EntityResult<()> {
        self.parcel.rectify_area(area_ha, reason)
    }

    /// Reactivating the parcel leaves irrigation disabled until enabled again
    pub fn activate(&mut self, reason: &str) -> bool {
        self.parcel.activate(reason)
    }

    /// Deactivate the parcel, forcing irrigation off
    pub fn deactivate(&mut self, reason: &str) -> bool {
        if !self.parcel.deactivate(reason) {
            return false;
        }

        self.irrigation.set_status(
            EnabledStatus::Disabled,
            Some(format!("parcel deactivated: {}", reason)),
        );
        true
    }

    // ------------------------------------------------------------------------
    // Irrigation operations
    // ------------------------------------------------------------------------

    pub fn configure_rate(&mut self, l_ha: f64) -> EntityResult<()> {
        IrrigationField::RateLHa.check(&l_ha.into())?;

        let before = std::mem::replace(&mut self.irrigation.rate_l_ha, l_ha);
        self.irrigation.record(
            EventKind::FieldUpdate {
                field: IrrigationField::RateLHa,
                before: before.into(),
                after: l_ha.into(),
            },
            None,
        );
        Ok(())
    }

    pub fn configure_threshold(&mut self, liters: f64) -> EntityResult<()> {
        IrrigationField::ThresholdL.check(&liters.into())?;

        let before = std::mem::replace(&mut self.irrigation.threshold_l, liters);
        self.irrigation.record(
            EventKind::FieldUpdate {
                field: IrrigationField::ThresholdL,
                before: before.into(),
                after: liters.into(),
            },
            None,
        );
        Ok(())
    }

    /// Returns Ok(false) if irrigation was already enabled
    pub fn enable_irrigation(&mut self) -> EntityResult<bool> {
        if !self.parcel.is_active() {
            return Err(self.inactive_error("irrigation cannot be enabled"));
        }
        Ok(self.irrigation.set_status(EnabledStatus::Enabled, None))
    }

    /// Returns false if irrigation was already disabled
    pub fn disable_irrigation(&mut self) -> bool {
        self.irrigation.set_status(EnabledStatus::Disabled, None)
    }

    /// Add water to the reserve
    pub fn load_water(&mut self, liters: f64) -> EntityResult<()> {
        let before = self.irrigation.water_l;
        let after = before + liters;

        if !(liters > 0.0) || !after.is_finite() {
            return Err(EntityError::validation(
                IrrigationField::ENTITY,
                IrrigationField::WaterL.name(),
                format!("load must be a finite amount greater than 0, got {}", liters),
            )
            .logged());
        }

        self.irrigation.water_l = after;
        self.irrigation.record(
            EventKind::ResourceLoad {
                field: IrrigationField::WaterL,
                amount: liters,
                before,
                after,
            },
            None,
        );
        tracing::info!(parcel = self.parcel.id(), liters, balance = after, "water loaded");
        Ok(())
    }

    /// Irrigate the whole parcel once under `policy`.
    ///
    /// Fails with a state error (recording nothing) when irrigation is not possible at all.
    /// A request the policy refuses returns an allocation with nothing applied and is
    /// logged as a rejection.
    pub fn irrigate(&mut self, policy: ConsumptionPolicy) -> EntityResult<Allocation> {
        if !self.parcel.is_active() {
            return Err(self.inactive_error("irrigation refused"));
        }
        if !self.irrigation.is_enabled() {
            return Err(EntityError::state(
                IrrigationField::ENTITY,
                format!("irrigation is disabled on parcel {}", self.parcel.id()),
            )
            .logged());
        }
        if !(self.irrigation.rate_l_ha > 0.0) {
            return Err(EntityError::state(
                IrrigationField::ENTITY,
                format!("irrigation rate must be greater than 0, got {}", self.irrigation.rate_l_ha),
            )
            .logged());
        }

        let demand = self.demand_l();
        let allocation = allocate(self.irrigation.water_l, demand, self.irrigation.threshold_l, policy);

        if !(allocation.after >= 0.0) {
            return Err(EntityError::state(
                IrrigationField::ENTITY,
                format!("irrigation would leave a negative balance ({} L)", allocation.after),
            )
            .logged());
        }

        if allocation.is_rejected() {
            self.irrigation.record(
                EventKind::Rejected {
                    field: IrrigationField::WaterL,
                    requested: demand,
                    balance: allocation.before,
                    policy,
                },
                Some(format!(
                    "balance {} L cannot cover {} L above the {} L threshold",
                    allocation.before, demand, self.irrigation.threshold_l
                )),
            );
            tracing::warn!(
                parcel = self.parcel.id(),
                requested = demand,
                balance = allocation.before,
                %policy,
                "irrigation rejected by policy"
            );
            return Ok(allocation);
        }

        self.irrigation.water_l = allocation.after;
        self.irrigation.record(
            EventKind::ResourceConsumption {
                field: IrrigationField::WaterL,
                requested: allocation.requested,
                applied: allocation.applied,
                before: allocation.before,
                after: allocation.after,
                policy,
            },
            allocation.is_partial().then(|| "partial".to_string()),
        );
        self.irrigation.runs.push(IrrigationRun {
            timestamp: Utc::now(),
            requested_l: allocation.requested,
            applied_l: allocation.applied,
            balance_before_l: allocation.before,
            balance_after_l: allocation.after,
            policy,
        });

        tracing::info!(
            parcel = self.parcel.id(),
            requested = allocation.requested,
            applied = allocation.applied,
            balance = allocation.after,
            %policy,
            "irrigation applied"
        );
        Ok(allocation)
    }

    fn inactive_error(&self, what: &str) -> EntityError {
        EntityError::state(
            IrrigationField::ENTITY,
            format!("parcel {} is inactive, {}", self.parcel.id(), what),
        )
        .logged()
    }
}

impl Entity for IrrigatedParcel {
    type Id = u32;
    type Field = IrrigationField;

    fn id(&self) -> &u32 {
        Entity::id(&self.parcel)
    }

    fn history(&self) -> Vec<Event<IrrigationField>> {
        self.irrigation.log.snapshot()
    }

    fn read_field(&self, field: IrrigationField) -> FieldValue {
        match field {
            IrrigationField::Status => self.irrigation.status.into(),
            IrrigationField::RateLHa => self.irrigation.rate_l_ha.into(),
            IrrigationField::ThresholdL => self.irrigation.threshold_l.into(),
            IrrigationField::WaterL => self.irrigation.water_l.into(),
        }
    }

    /// Parcel field names are routed to the parcel's own guard
    fn assign(&mut self, name: &str, value: FieldValue) -> EntityResult<()> {
        if IrrigationField::lookup(name).is_none() && ParcelField::lookup(name).is_some() {
            return self.parcel.assign(name, value);
        }
        Err(refuse_assignment::<IrrigationField>(name, &value))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityReason;
    use crate::event::EventTag;

    fn wheat_parcel(registry: &ParcelRegistry, id: u32) -> IrrigatedParcel {
        IrrigatedParcel::new(registry, id, 10.50, "Trigo", &IrrigationSettings::default()).unwrap()
    }

    #[test]
    fn test_new_parcel_has_enabled_irrigation() {
        let registry = ParcelRegistry::new();
        let plot = wheat_parcel(&registry, 1);

        assert!(plot.parcel().is_active());
        assert!(plot.irrigation().is_enabled());
        assert_eq!(plot.irrigation().rate_l_ha(), 1000.0);
        assert_eq!(plot.irrigation().water_l(), 0.0);
        assert_eq!(plot.history()[0].tag(), EventTag::Creation);
    }

    #[test]
    fn test_invalid_settings_claim_nothing() {
        let registry = ParcelRegistry::new();
        let settings = IrrigationSettings {
            default_rate_l_ha: 0.0,
            ..IrrigationSettings::default()
        };

        let err = IrrigatedParcel::new(&registry, 1, 10.5, "Trigo", &settings).unwrap_err();
        assert!(err.is_validation());
        assert!(!registry.contains(&1));
    }

    #[test]
    fn test_strict_irrigation_applies_full_demand() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);

        plot.update_crop("Maíz").unwrap();
        plot.configure_rate(1500.0).unwrap();
        plot.configure_threshold(2000.0).unwrap();
        plot.load_water(20000.0).unwrap();

        assert_eq!(plot.demand_l(), 15750.0);

        let allocation = plot.irrigate(ConsumptionPolicy::Strict).unwrap();
        assert_eq!(allocation.applied, 15750.0);
        assert_eq!(allocation.after, 4250.0);
        assert_eq!(plot.irrigation().water_l(), 4250.0);

        let runs = plot.irrigation_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].balance_before_l, 20000.0);
        assert_eq!(runs[0].policy, ConsumptionPolicy::Strict);

        let last = plot.history().pop().unwrap();
        assert_eq!(last.tag(), EventTag::ResourceConsumption);
        assert_eq!(last.after(), Some(FieldValue::from(4250.0)));
    }

    #[test]
    fn test_strict_rejection_records_event_and_keeps_balance() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);
        plot.configure_rate(1500.0).unwrap();
        plot.configure_threshold(2000.0).unwrap();
        plot.load_water(3000.0).unwrap();

        let allocation = plot.irrigate(ConsumptionPolicy::Strict).unwrap();
        assert!(allocation.is_rejected());
        assert_eq!(plot.irrigation().water_l(), 3000.0);
        assert!(plot.irrigation_runs().is_empty());
        assert_eq!(plot.irrigation().audit_log().count_tag(EventTag::Rejection), 1);
    }

    #[test]
    fn test_partial_irrigation_stops_at_threshold() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 2);
        plot.configure_rate(1500.0).unwrap();
        plot.configure_threshold(2000.0).unwrap();
        plot.load_water(3000.0).unwrap();

        let allocation = plot.irrigate(ConsumptionPolicy::Partial).unwrap();
        assert_eq!(allocation.requested, 15750.0);
        assert_eq!(allocation.applied, 1000.0);
        assert_eq!(plot.irrigation().water_l(), 2000.0);

        let last = plot.history().pop().unwrap();
        assert_eq!(last.detail.as_deref(), Some("partial"));
    }

    #[test]
    fn test_partial_at_threshold_is_rejected() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 3);
        plot.configure_rate(1500.0).unwrap();
        plot.configure_threshold(2000.0).unwrap();
        plot.load_water(2000.0).unwrap();

        let allocation = plot.irrigate(ConsumptionPolicy::Partial).unwrap();
        assert!(allocation.is_rejected());
        assert_eq!(allocation.applied, 0.0);
        assert_eq!(plot.irrigation().water_l(), 2000.0);
        assert!(plot.irrigation_runs().is_empty());

        let log = plot.irrigation().audit_log();
        assert_eq!(log.count_tag(EventTag::Rejection), 1);
        assert_eq!(log.count_tag(EventTag::ResourceConsumption), 0);
        let last = log.last().unwrap();
        assert!(matches!(
            last.kind,
            EventKind::Rejected { policy: ConsumptionPolicy::Partial, balance, .. } if balance == 2000.0
        ));
    }

    #[test]
    fn test_deactivation_cascades_and_blocks_irrigation() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);
        plot.load_water(20000.0).unwrap();

        assert!(plot.deactivate("Cosecha finalizada"));
        assert!(!plot.irrigation().is_enabled());

        let cascade = plot.history().pop().unwrap();
        assert_eq!(cascade.tag(), EventTag::StatusChange);
        assert_eq!(cascade.after(), Some(FieldValue::from("disabled")));

        let events_before = plot.history().len();
        let err = plot.irrigate(ConsumptionPolicy::Strict).unwrap_err();
        assert!(err.is_state());
        assert_eq!(plot.history().len(), events_before);
        assert_eq!(plot.irrigation().water_l(), 20000.0);

        assert!(plot.enable_irrigation().unwrap_err().is_state());
    }

    #[test]
    fn test_reactivation_requires_explicit_enable() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);
        plot.load_water(20000.0).unwrap();
        plot.deactivate("Mantenimiento");
        plot.activate("Listo");

        assert!(plot.irrigate(ConsumptionPolicy::Strict).unwrap_err().is_state());
        assert!(plot.enable_irrigation().unwrap());
        assert!(!plot.enable_irrigation().unwrap());
        assert!(plot.irrigate(ConsumptionPolicy::Strict).is_ok());
    }

    #[test]
    fn test_disabled_irrigation_blocks() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);
        plot.load_water(20000.0).unwrap();

        assert!(plot.disable_irrigation());
        assert!(!plot.disable_irrigation());
        assert!(plot.irrigate(ConsumptionPolicy::Partial).unwrap_err().is_state());
    }

    #[test]
    fn test_configuration_rejections() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);

        assert!(plot.configure_rate(0.0).unwrap_err().is_validation());
        assert!(plot.configure_threshold(-1.0).unwrap_err().is_validation());
        assert!(plot.load_water(0.0).unwrap_err().is_validation());
        assert!(plot.load_water(f64::NAN).unwrap_err().is_validation());
        assert!(plot.configure_rate(f64::INFINITY).unwrap_err().is_validation());
        assert!(plot.configure_threshold(f64::INFINITY).unwrap_err().is_validation());
        assert!(plot.load_water(f64::INFINITY).unwrap_err().is_validation());
        assert_eq!(plot.irrigation().rate_l_ha(), 1000.0);
        assert_eq!(plot.irrigation().water_l(), 0.0);
        assert_eq!(plot.history().len(), 1);

        assert!(IrrigatedParcel::new(&registry, 2, f64::INFINITY, "Trigo", &IrrigationSettings::default())
            .unwrap_err()
            .is_validation());
        assert!(!registry.contains(&2));
    }

    #[test]
    fn test_water_cannot_be_assigned_directly() {
        let registry = ParcelRegistry::new();
        let mut plot = wheat_parcel(&registry, 1);

        let err = plot.assign("water_l", FieldValue::from(1e6)).unwrap_err();
        assert!(matches!(
            err,
            EntityError::Capability {
                reason: CapabilityReason::Controlled { operation: "load_water/irrigate" },
                ..
            }
        ));

        let err = plot.assign("crop", FieldValue::from("Soja")).unwrap_err();
        assert!(err.is_capability());

        assert_eq!(plot.irrigation().water_l(), 0.0);
        assert_eq!(plot.parcel().crop(), "Trigo");
    }
}
