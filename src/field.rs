// 🏛️ Field Catalog - every field declares its type, access and predicates
//
// Fields are first-class: each entity family has a closed enum of fields, and each
// variant carries a definition saying how it may change and what values are valid.

use crate::error::{CapabilityReason, EntityError, EntityResult};
use crate::event::FieldValue;
use serde::Serialize;
use strum::IntoEnumIterator;

// ============================================================================
// FIELD TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Identifier,
    Text,
    Integer,
    Number,
    Status,
    Flag,
}

/// How a field may change after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldAccess {
    /// Fixed at construction
    ReadOnly,

    /// Mutable only through the named operation
    Controlled { operation: &'static str },
}

impl FieldAccess {
    pub fn capability_reason(&self) -> CapabilityReason {
        match self {
            FieldAccess::ReadOnly => CapabilityReason::ReadOnly,
            FieldAccess::Controlled { operation } => CapabilityReason::Controlled {
                operation: *operation,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ValidationRule {
    NonEmpty,
    Positive,
    NonNegative,
    AtLeast(f64),
    OneOf(&'static [&'static str]),
}

impl ValidationRule {
    /// Check a candidate value, returning a human-readable reason on failure
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        match self {
            ValidationRule::NonEmpty => match value {
                FieldValue::Empty => Err("must not be empty".to_string()),
                FieldValue::Text(s) if s.trim().is_empty() => Err("must not be empty".to_string()),
                _ => Ok(()),
            },
            ValidationRule::Positive => {
                let n = numeric(value)?;
                if n > 0.0 {
                    Ok(())
                } else {
                    Err(format!("must be greater than 0, got {}", n))
                }
            }
            ValidationRule::NonNegative => {
                let n = numeric(value)?;
                if n >= 0.0 {
                    Ok(())
                } else {
                    Err(format!("must be 0 or greater, got {}", n))
                }
            }
            ValidationRule::AtLeast(min) => {
                let n = numeric(value)?;
                if n >= *min {
                    Ok(())
                } else {
                    Err(format!("must be at least {}, got {}", min, n))
                }
            }
            ValidationRule::OneOf(options) => match value.as_text() {
                Some(s) if options.contains(&s) => Ok(()),
                _ => Err(format!("must be one of {:?}, got {}", options, value)),
            },
        }
    }
}

/// Finite numeric view of `value`
fn numeric(value: &FieldValue) -> Result<f64, String> {
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        Some(n) => Err(format!("must be a finite number, got {}", n)),
        None => Err(format!("expected a number, got {}", value)),
    }
}

// ============================================================================
// FIELD DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub type_: FieldType,
    pub access: FieldAccess,
    pub rules: &'static [ValidationRule],
    pub description: &'static str,
}

impl FieldDefinition {
    /// Read-only field with no rules
    pub const fn new(type_: FieldType) -> Self {
        FieldDefinition {
            type_,
            access: FieldAccess::ReadOnly,
            rules: &[],
            description: "",
        }
    }

    /// Builder: field changes only through `operation`
    pub const fn controlled_by(mut self, operation: &'static str) -> Self {
        self.access = FieldAccess::Controlled { operation };
        self
    }

    /// Builder: validation rules, checked in order
    pub const fn with_rules(mut self, rules: &'static [ValidationRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Builder: description
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// ENTITY FIELD
// ============================================================================

/// Closed set of fields belonging to one entity family
pub trait EntityField:
    Copy
    + Eq
    + std::hash::Hash
    + std::fmt::Debug
    + Serialize
    + IntoEnumIterator
    + Into<&'static str>
    + 'static
{
    /// Family name used in errors and logs
    const ENTITY: &'static str;

    fn definition(self) -> FieldDefinition;

    fn name(self) -> &'static str {
        self.into()
    }

    fn access(self) -> FieldAccess {
        self.definition().access
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::iter().find(|field| field.name() == name)
    }

    /// Validate a candidate value against every declared rule.
    fn check(self, value: &FieldValue) -> EntityResult<()> {
        for rule in self.definition().rules {
            rule.check(value).map_err(|message| {
                EntityError::validation(Self::ENTITY, self.name(), message).logged()
            })?;
        }
        Ok(())
    }
}

/// One row of a family's field catalog
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: &'static str,
    #[serde(flatten)]
    pub definition: FieldDefinition,
}

/// Every field of a family with its definition, in declaration order
pub fn catalog<F: EntityField>() -> Vec<FieldSummary> {
    F::iter()
        .map(|field| FieldSummary {
            name: field.name(),
            definition: field.definition(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
