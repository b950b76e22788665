// ⚠️ Entity Errors - the three ways an operation can be refused
//
// Every failure is scoped to the single operation that produced it.
// The entity keeps the state it had before the call.

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// CAPABILITY REASON
// ============================================================================

/// Why a direct write was refused at the API boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CapabilityReason {
    /// Field never changes after construction
    ReadOnly,

    /// Field changes only through the named operation
    Controlled { operation: &'static str },

    /// No field with that name exists on the entity
    UnknownField,
}

impl std::fmt::Display for CapabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityReason::ReadOnly => write!(f, "field is read-only"),
            CapabilityReason::Controlled { operation } => {
                write!(f, "field can only change through `{}`", operation)
            }
            CapabilityReason::UnknownField => write!(f, "no such field"),
        }
    }
}

// ============================================================================
// ENTITY ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    /// A supplied value violates the field's declared predicate
    #[error("[{entity}] {field}: {message}")]
    Validation {
        entity: &'static str,
        field: &'static str,
        message: String,
    },

    /// The entity is not in a state that permits the operation
    #[error("[{entity}] operation rejected: {message}")]
    State {
        entity: &'static str,
        message: String,
    },

    /// Direct write to a read-only or controlled field
    #[error("[{entity}] cannot assign `{field}`: {reason}")]
    Capability {
        entity: &'static str,
        field: String,
        reason: CapabilityReason,
    },
}

/// Coarse category of an [`EntityError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    State,
    Capability,
}

impl EntityError {
    pub fn validation(entity: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        EntityError::Validation {
            entity,
            field,
            message: message.into(),
        }
    }

    pub fn state(entity: &'static str, message: impl Into<String>) -> Self {
        EntityError::State {
            entity,
            message: message.into(),
        }
    }

    pub fn capability(entity: &'static str, field: impl Into<String>, reason: CapabilityReason) -> Self {
        EntityError::Capability {
            entity,
            field: field.into(),
            reason,
        }
    }

    /// Report the rejection through tracing and hand the error back
    pub fn logged(self) -> Self {
        tracing::warn!(kind = ?self.kind(), error = %self, "operation rejected");
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EntityError::Validation { .. } => ErrorKind::Validation,
            EntityError::State { .. } => ErrorKind::State,
            EntityError::Capability { .. } => ErrorKind::Capability,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_state(&self) -> bool {
        self.kind() == ErrorKind::State
    }

    pub fn is_capability(&self) -> bool {
        self.kind() == ErrorKind::Capability
    }
}

pub type EntityResult<T> = Result<T, EntityError>;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let validation = EntityError::validation("parcel", "crop", "must not be empty");
        let state = EntityError::state("parcel", "parcel is inactive");
        let capability = EntityError::capability("parcel", "area_ha", CapabilityReason::ReadOnly);

        assert!(validation.is_validation());
        assert!(state.is_state());
        assert!(capability.is_capability());
        assert_ne!(validation.kind(), capability.kind());
    }

    #[test]
    fn test_error_display() {
        let err = EntityError::validation("book", "pages_read", "only 380 pages remain");
        assert_eq!(err.to_string(), "[book] pages_read: only 380 pages remain");

        let err = EntityError::capability(
            "irrigated_parcel",
            "water_l",
            CapabilityReason::Controlled { operation: "load_water" },
        );
        assert_eq!(
            err.to_string(),
            "[irrigated_parcel] cannot assign `water_l`: field can only change through `load_water`"
        );
    }
}
