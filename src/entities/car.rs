// 🚙 Car Entity - a vehicle with seats and occupants
//
// 0 <= occupants <= total_seats at all times. Occupancy changes only through
// board / alight / empty, and each one leaves an occupancy event.

use super::round2;
use super::vehicle::{PlateRegistry, Vehicle, VehicleField, VehicleFields, VehicleSheet};
use crate::audit::AuditLog;
use crate::consumption::{allocate, ConsumptionPolicy};
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::status::EnabledStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

const SEAT_RULES: &[ValidationRule] = &[ValidationRule::AtLeast(1.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CarField {
    Id,
    Plate,
    WeightKg,
    Status,
    TotalSeats,
    Occupants,
    ChildRestraint,
}

impl EntityField for CarField {
    const ENTITY: &'static str = "car";

    fn definition(self) -> FieldDefinition {
        match self {
            CarField::Id => VehicleField::Id.definition(),
            CarField::Plate => VehicleField::Plate.definition(),
            CarField::WeightKg => VehicleField::WeightKg.definition(),
            CarField::Status => VehicleField::Status.definition(),
            CarField::TotalSeats => FieldDefinition::new(FieldType::Integer)
                .controlled_by("reconfigure_seats")
                .with_rules(SEAT_RULES),
            CarField::Occupants => FieldDefinition::new(FieldType::Integer)
                .controlled_by("board/alight/empty")
                .with_rules(&[ValidationRule::NonNegative]),
            CarField::ChildRestraint => FieldDefinition::new(FieldType::Flag)
                .with_description("Child restraint system fitted"),
        }
    }
}

impl VehicleFields for CarField {
    const ID: Self = CarField::Id;
    const PLATE: Self = CarField::Plate;
    const WEIGHT_KG: Self = CarField::WeightKg;
    const STATUS: Self = CarField::Status;
}

// ============================================================================
// OCCUPANCY EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OccupancyAction {
    Board,
    Alight,
    Empty,
    Reconfigure,
}

/// One accepted change to seats or occupants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyEvent {
    pub timestamp: DateTime<Utc>,
    pub action: OccupancyAction,
    pub quantity: u32,
    pub before: u32,
    pub after: u32,
}

/// Occupancy report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupancy {
    pub occupants: u32,
    pub total_seats: u32,
    pub free_seats: u32,
    pub occupancy_rate: f64,
    pub child_restraint: bool,
}

// ============================================================================
// CAR ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Car {
    vehicle: Vehicle<CarField>,
    total_seats: u32,
    occupants: u32,
    child_restraint: bool,
    occupancy_log: Vec<OccupancyEvent>,
}

impl Car {
    pub fn new(
        registry: &PlateRegistry,
        plate: &str,
        weight_kg: f64,
        total_seats: u32,
        child_restraint: bool,
        actor: &str,
    ) -> EntityResult<Self> {
        CarField::TotalSeats.check(&total_seats.into())?;

        let extra = vec![
            (CarField::TotalSeats, FieldValue::from(total_seats)),
            (CarField::Occupants, FieldValue::from(0_u32)),
            (CarField::ChildRestraint, FieldValue::from(child_restraint)),
        ];
        let vehicle = Vehicle::build(registry, plate, weight_kg, actor, extra)?;

        Ok(Car {
            vehicle,
            total_seats,
            occupants: 0,
            child_restraint,
            occupancy_log: Vec::new(),
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn vehicle(&self) -> &Vehicle<CarField> {
        &self.vehicle
    }

    pub fn plate(&self) -> &str {
        self.vehicle.plate()
    }

    pub fn weight_kg(&self) -> f64 {
        self.vehicle.weight_kg()
    }

    pub fn status(&self) -> EnabledStatus {
        self.vehicle.status()
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn occupants(&self) -> u32 {
        self.occupants
    }

    pub fn child_restraint(&self) -> bool {
        self.child_restraint
    }

    pub fn free_seats(&self) -> u32 {
        self.total_seats - self.occupants
    }

    /// Percentage of seats taken, 2 decimals
    pub fn occupancy_rate(&self) -> f64 {
        round2(f64::from(self.occupants) / f64::from(self.total_seats) * 100.0)
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            occupants: self.occupants,
            total_seats: self.total_seats,
            free_seats: self.free_seats(),
            occupancy_rate: self.occupancy_rate(),
            child_restraint: self.child_restraint,
        }
    }

    pub fn occupancy_events(&self) -> Vec<OccupancyEvent> {
        self.occupancy_log.clone()
    }

    /// Occupancy events of one kind with `from <= timestamp < to`
    pub fn count_occupancy_events(
        &self,
        action: OccupancyAction,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> usize {
        self.occupancy_log
            .iter()
            .filter(|e| e.action == action && e.timestamp >= from && e.timestamp < to)
            .count()
    }

    pub fn audit_log(&self) -> AuditLog<CarField> {
        self.vehicle.audit_log()
    }

    pub fn sheet(&self) -> VehicleSheet<CarField> {
        self.vehicle.sheet()
    }

    // ------------------------------------------------------------------------
    // Vehicle operations
    // ------------------------------------------------------------------------

    pub fn update_weight(&mut self, weight_kg: f64, actor: &str) -> EntityResult<()> {
        self.vehicle.update_weight(weight_kg, actor)
    }

    pub fn enable(&mut self, reason: &str, actor: &str) -> bool {
        self.vehicle.enable(reason, actor)
    }

    pub fn disable(&mut self, reason: &str, actor: &str) -> bool {
        self.vehicle.disable(reason, actor)
    }

    // ------------------------------------------------------------------------
    // Occupancy operations
    // ------------------------------------------------------------------------

    /// Board `n` people. All of them fit or none board.
    pub fn board(&mut self, n: u32, actor: &str) -> EntityResult<()> {
        self.vehicle.ensure_enabled("boarding")?;
        Self::require_people(n)?;

        let free = self.free_seats();
        let policy = ConsumptionPolicy::Strict;
        let allocation = allocate(f64::from(free), f64::from(n), 0.0, policy);
        if allocation.is_rejected() {
            self.vehicle.record_event(
                actor,
                EventKind::Rejected {
                    field: CarField::Occupants,
                    requested: allocation.requested,
                    balance: allocation.before,
                    policy,
                },
                Some(format!("{} free seats cannot take {}", free, n)),
            );
            return Err(EntityError::validation(
                CarField::ENTITY,
                CarField::Occupants.name(),
                format!("cannot board {}, only {} free seats", n, free),
            )
            .logged());
        }

        // Balance is free seats: boarding draws them down.
        let before = self.occupants;
        self.occupants += n;
        self.vehicle.record_event(
            actor,
            EventKind::ResourceConsumption {
                field: CarField::Occupants,
                requested: allocation.requested,
                applied: allocation.applied,
                before: allocation.before,
                after: allocation.after,
                policy,
            },
            Some(format!("{} {}", OccupancyAction::Board, n)),
        );
        self.log_occupancy(OccupancyAction::Board, n, before, self.occupants);
        Ok(())
    }

    /// `n` people get out
    pub fn alight(&mut self, n: u32, actor: &str) -> EntityResult<()> {
        self.vehicle.ensure_enabled("alighting")?;
        Self::require_people(n)?;

        if n > self.occupants {
            return Err(EntityError::validation(
                CarField::ENTITY,
                CarField::Occupants.name(),
                format!("cannot alight {}, only {} on board", n, self.occupants),
            )
            .logged());
        }

        self.set_occupants(self.occupants - n, OccupancyAction::Alight, n, actor, None);
        Ok(())
    }

    /// Force the car empty. Returns false if it already was.
    pub fn empty(&mut self, reason: &str, actor: &str) -> bool {
        if self.occupants == 0 {
            tracing::debug!(plate = self.plate(), "car already empty");
            return false;
        }

        let everyone = self.occupants;
        self.set_occupants(0, OccupancyAction::Empty, everyone, actor, Some(reason.to_string()));
        true
    }

    pub fn reconfigure_seats(&mut self, total_seats: u32, reason: &str, actor: &str) -> EntityResult<()> {
        self.vehicle.ensure_enabled("seat reconfiguration")?;
        CarField::TotalSeats.check(&total_seats.into())?;

        if total_seats < self.occupants {
            return Err(self.seat_error(format!(
                "cannot reduce to {} seats with {} occupants",
                total_seats, self.occupants
            )));
        }
        if total_seats == self.total_seats {
            return Err(self.seat_error(format!("car already has {} seats", total_seats)));
        }

        let before = std::mem::replace(&mut self.total_seats, total_seats);
        self.vehicle.record_event(
            actor,
            EventKind::FieldUpdate {
                field: CarField::TotalSeats,
                before: before.into(),
                after: total_seats.into(),
            },
            Some(reason.to_string()),
        );
        self.occupancy_log.push(OccupancyEvent {
            timestamp: Utc::now(),
            action: OccupancyAction::Reconfigure,
            quantity: total_seats,
            before: self.occupants,
            after: self.occupants,
        });
        tracing::info!(plate = self.plate(), from = before, to = total_seats, reason, "seats reconfigured");
        Ok(())
    }

    fn require_people(n: u32) -> EntityResult<()> {
        if n >= 1 {
            return Ok(());
        }
        Err(EntityError::validation(
            CarField::ENTITY,
            CarField::Occupants.name(),
            "at least one person is required",
        )
        .logged())
    }

    fn seat_error(&self, message: String) -> EntityError {
        EntityError::validation(CarField::ENTITY, CarField::TotalSeats.name(), message).logged()
    }

    fn set_occupants(
        &mut self,
        after: u32,
        action: OccupancyAction,
        quantity: u32,
        actor: &str,
        detail: Option<String>,
    ) {
        let before = std::mem::replace(&mut self.occupants, after);
        self.vehicle.record_event(
            actor,
            EventKind::FieldUpdate {
                field: CarField::Occupants,
                before: before.into(),
                after: after.into(),
            },
            detail.or_else(|| Some(format!("{} {}", action, quantity))),
        );
        self.log_occupancy(action, quantity, before, after);
    }

    fn log_occupancy(&mut self, action: OccupancyAction, quantity: u32, before: u32, after: u32) {
        self.occupancy_log.push(OccupancyEvent {
            timestamp: Utc::now(),
            action,
            quantity,
            before,
            after,
        });
        tracing::info!(plate = self.plate(), %action, quantity, occupants = after, "occupancy changed");
    }
}

impl Entity for Car {
    type Id = String;
    type Field = CarField;

    fn id(&self) -> &String {
        self.vehicle.id_string()
    }

    fn history(&self) -> Vec<Event<CarField>> {
        self.vehicle.snapshot()
    }

    fn read_field(&self, field: CarField) -> FieldValue {
        match field {
            CarField::Id => self.vehicle.id().into(),
            CarField::Plate => self.vehicle.plate().into(),
            CarField::WeightKg => self.vehicle.weight_kg().into(),
            CarField::Status => self.vehicle.status().into(),
            CarField::TotalSeats => self.total_seats.into(),
            CarField::Occupants => self.occupants.into(),
            CarField::ChildRestraint => self.child_restraint.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLATE_PATTERN;
    use crate::entities::vehicle::PlatePattern;
    use crate::error::CapabilityReason;
    use crate::event::EventTag;
    use chrono::Duration;

    fn family_car(plates: &PlateRegistry) -> Car {
        Car::new(plates, "AE 456", 1400.0, 5, true, "ana").unwrap()
    }

    fn plates() -> PlateRegistry {
        PlateRegistry::new(PlatePattern::new(DEFAULT_PLATE_PATTERN).unwrap())
    }

    #[test]
    fn test_new_car_is_empty() {
        let plates = plates();
        let car = family_car(&plates);

        assert_eq!(car.occupants(), 0);
        assert_eq!(car.free_seats(), 5);
        assert_eq!(car.occupancy_rate(), 0.0);
        assert!(car.child_restraint());
        assert!(plates.contains("AE 456"));
    }

    #[test]
    fn test_zero_seats_claims_nothing() {
        let plates = plates();
        assert!(Car::new(&plates, "AE 456", 1400.0, 0, false, "ana").unwrap_err().is_validation());
        assert!(plates.is_empty());
    }

    #[test]
    fn test_board_and_alight() {
        let plates = plates();
        let mut car = family_car(&plates);

        car.board(3, "ana").unwrap();
        assert_eq!(car.occupants(), 3);
        assert_eq!(car.occupancy_rate(), 60.0);

        let err = car.board(3, "ana").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(car.occupants(), 3);

        car.alight(2, "ana").unwrap();
        assert_eq!(car.occupants(), 1);
        assert!(car.alight(2, "ana").unwrap_err().is_validation());
        assert!(car.board(0, "ana").unwrap_err().is_validation());

        let events = car.occupancy_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, OccupancyAction::Board);
        assert_eq!(events[1].before, 3);
        assert_eq!(events[1].after, 1);
    }

    #[test]
    fn test_boarding_is_recorded_as_consumption() {
        let plates = plates();
        let mut car = family_car(&plates);

        car.board(3, "ana").unwrap();
        let last = car.audit_log().last().unwrap();
        assert_eq!(last.tag(), EventTag::ResourceConsumption);
        assert_eq!(last.field(), Some(CarField::Occupants));
        assert_eq!(last.before(), Some(FieldValue::from(5.0)));
        assert_eq!(last.after(), Some(FieldValue::from(2.0)));
        assert!(matches!(
            last.kind,
            EventKind::ResourceConsumption {
                requested,
                applied,
                policy: ConsumptionPolicy::Strict,
                ..
            } if requested == 3.0 && applied == 3.0
        ));

        assert!(car.board(3, "luis").unwrap_err().is_validation());
        assert_eq!(car.occupants(), 3);

        let log = car.audit_log();
        assert_eq!(log.count_tag(EventTag::ResourceConsumption), 1);
        assert_eq!(log.count_tag(EventTag::Rejection), 1);

        let rejected = log.last().unwrap();
        assert_eq!(rejected.actor, "luis");
        assert_eq!(rejected.before(), Some(FieldValue::from(2.0)));
        assert_eq!(car.occupancy_events().len(), 1);
    }

    #[test]
    fn test_board_fills_exactly() {
        let plates = plates();
        let mut car = family_car(&plates);

        car.board(5, "ana").unwrap();
        assert_eq!(car.free_seats(), 0);
        assert_eq!(car.occupancy().occupancy_rate, 100.0);
    }

    #[test]
    fn test_disabled_car_rejects_occupancy_changes() {
        let plates = plates();
        let mut car = family_car(&plates);
        car.board(2, "ana").unwrap();
        car.disable("Fuera de servicio", "luis");

        assert!(car.board(1, "ana").unwrap_err().is_state());
        assert!(car.alight(1, "ana").unwrap_err().is_state());
        assert!(car.reconfigure_seats(7, "ampliación", "ana").unwrap_err().is_state());
        assert_eq!(car.occupants(), 2);
    }

    #[test]
    fn test_empty_is_idempotent() {
        let plates = plates();
        let mut car = family_car(&plates);
        car.board(4, "ana").unwrap();

        assert!(car.empty("Fin del recorrido", "ana"));
        assert!(!car.empty("Fin del recorrido", "ana"));
        assert_eq!(car.occupants(), 0);

        let last = car.occupancy_events().pop().unwrap();
        assert_eq!(last.action, OccupancyAction::Empty);
        assert_eq!(last.quantity, 4);
        assert_eq!(
            car.audit_log().last().unwrap().detail.as_deref(),
            Some("Fin del recorrido")
        );
    }

    #[test]
    fn test_reconfigure_seats() {
        let plates = plates();
        let mut car = family_car(&plates);
        car.board(4, "ana").unwrap();

        assert!(car.reconfigure_seats(3, "tercera fila", "ana").unwrap_err().is_validation());
        assert!(car.reconfigure_seats(5, "sin cambios", "ana").unwrap_err().is_validation());
        assert!(car.reconfigure_seats(0, "error", "ana").unwrap_err().is_validation());

        car.reconfigure_seats(7, "tercera fila", "luis").unwrap();
        assert_eq!(car.total_seats(), 7);
        assert_eq!(car.free_seats(), 3);

        let last = car.audit_log().last().unwrap();
        assert_eq!(last.field(), Some(CarField::TotalSeats));
        assert_eq!(last.actor, "luis");
    }

    #[test]
    fn test_count_occupancy_events_in_range() {
        let plates = plates();
        let mut car = family_car(&plates);
        let from = Utc::now() - Duration::seconds(1);

        car.board(1, "ana").unwrap();
        car.board(1, "ana").unwrap();
        car.alight(1, "ana").unwrap();
        let to = Utc::now() + Duration::seconds(1);

        assert_eq!(car.count_occupancy_events(OccupancyAction::Board, from, to), 2);
        assert_eq!(car.count_occupancy_events(OccupancyAction::Alight, from, to), 1);
        assert_eq!(car.count_occupancy_events(OccupancyAction::Board, to, to + Duration::hours(1)), 0);
    }

    #[test]
    fn test_occupants_not_assignable() {
        let plates = plates();
        let mut car = family_car(&plates);

        let err = car.assign("occupants", FieldValue::from(3_u32)).unwrap_err();
        assert!(matches!(
            err,
            EntityError::Capability {
                reason: CapabilityReason::Controlled { operation: "board/alight/empty" },
                ..
            }
        ));
        let err = car.assign("child_restraint", FieldValue::from(false)).unwrap_err();
        assert!(matches!(
            err,
            EntityError::Capability { reason: CapabilityReason::ReadOnly, .. }
        ));
        assert_eq!(car.occupants(), 0);
        assert_eq!(car.history().len(), 1);
        assert_eq!(car.history()[0].tag(), EventTag::Creation);
    }
}
