// Entity Ledger - Core Library
// Validated entities with controlled mutation and an append-only audit trail

pub mod error;          // Validation / State / Capability errors
pub mod field;          // Field catalog: types, access, rules
pub mod event;          // Typed audit events
pub mod audit;          // Append-only audit log
pub mod registry;       // Injected identifier registry
pub mod status;         // Active / Enabled status flags
pub mod consumption;    // Reserve / consume rule (strict, partial)
pub mod entity;         // Entity trait + direct-assignment guard
pub mod config;         // Settings loaded from JSON
pub mod logging;        // tracing subscriber setup
pub mod entities;       // The five entity families

// Re-export commonly used types
pub use error::{CapabilityReason, EntityError, EntityResult, ErrorKind};
pub use field::{
    catalog, EntityField, FieldAccess, FieldDefinition, FieldSummary, FieldType, ValidationRule,
};
pub use event::{Event, EventKind, EventTag, FieldValue, SYSTEM_ACTOR};
pub use audit::AuditLog;
pub use registry::IdRegistry;
pub use status::{ActiveStatus, EnabledStatus};
pub use consumption::{allocate, Allocation, ConsumptionPolicy};
pub use entity::{refuse_assignment, Entity};
pub use config::{IrrigationSettings, LoggingSettings, Settings, VehicleSettings};
pub use entities::{
    Activity, ActivityRegistry, Book, Car, CelestialBody, CelestialRegistry, IrrigatedParcel,
    OccupancyAction, OrbitsSun, Parcel, ParcelRegistry, Planet, PlatePattern, PlateRegistry,
    Proximity, Publication, PublicationRegistry, Race, Vehicle,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
