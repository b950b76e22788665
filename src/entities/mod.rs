// Entity Families
// "Every field has an owner, every change has a record"
//
// Each family has:
// - A closed field enum with declared rules and access
// - Controlled operations that validate, then commit, then record
// - A registry handle injected at construction for identifier uniqueness
//
// Derived entities (Book, Race, Car, Planet) wrap a base that is generic over
// the field enum, so base and derived fields share one audit log.

pub mod parcel;
pub mod irrigation;
pub mod publication;
pub mod book;
pub mod activity;
pub mod race;
pub mod vehicle;
pub mod car;
pub mod celestial;
pub mod planet;

pub use parcel::{Parcel, ParcelField, ParcelRegistry};
pub use irrigation::{IrrigatedParcel, IrrigationField, IrrigationRun, IrrigationSystem};
pub use publication::{Publication, PublicationField, PublicationFields, PublicationRegistry, MIN_YEAR};
pub use book::{Book, BookField, ReadingSession};
pub use activity::{Activity, ActivityField, ActivityFields, ActivityRegistry};
pub use race::{Checkpoint, Race, RaceField};
pub use vehicle::{PlatePattern, PlateRegistry, Vehicle, VehicleField, VehicleFields, VehicleSheet};
pub use car::{Car, CarField, Occupancy, OccupancyAction, OccupancyEvent};
pub use celestial::{BodySheet, CelestialBody, CelestialField, CelestialFields, CelestialRegistry};
pub use planet::{OrbitsSun, Planet, PlanetField, Proximity};

/// Round to 2 decimals (areas, percentages, paces)
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.567), 10.57);
        assert_eq!(round2(24.0), 24.0);
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(0.004), 0.0);
    }
}
