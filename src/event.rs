// 📜 Audit Events - "Every accepted change is an event"
//
// An event is an immutable value: when, who, what changed (before/after) and why.
// The event type is parameterized by the entity family's field enum, so every log
// is statically typed and the set of event kinds is closed.

use crate::consumption::ConsumptionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded when the caller does not name one
pub const SYSTEM_ACTOR: &str = "system";

// ============================================================================
// FIELD VALUE
// ============================================================================

/// Snapshot of a single field value, as stored in before/after slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Empty => write!(f, "none"),
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

// ============================================================================
// EVENT TAG
// ============================================================================

/// Short, enumerable description of what an event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Creation,
    FieldUpdate,
    StatusChange,
    ResourceLoad,
    ResourceConsumption,
    Rejection,
}

impl EventTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Creation => "creation",
            EventTag::FieldUpdate => "field update",
            EventTag::StatusChange => "status change",
            EventTag::ResourceLoad => "resource load",
            EventTag::ResourceConsumption => "resource consumption",
            EventTag::Rejection => "rejection",
        }
    }
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EVENT KIND
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind<F> {
    /// Initial field values captured at construction
    Created { snapshot: Vec<(F, FieldValue)> },

    /// A controlled field was reassigned
    FieldUpdate {
        field: F,
        before: FieldValue,
        after: FieldValue,
    },

    /// A status flag moved to its other state
    StatusChange {
        field: F,
        before: FieldValue,
        after: FieldValue,
    },

    /// A consumable quantity was topped up
    ResourceLoad {
        field: F,
        amount: f64,
        before: f64,
        after: f64,
    },

    /// A consumable quantity was drawn down under a policy
    ResourceConsumption {
        field: F,
        requested: f64,
        applied: f64,
        before: f64,
        after: f64,
        policy: ConsumptionPolicy,
    },

    /// A consumption request was refused by its policy (nothing applied)
    Rejected {
        field: F,
        requested: f64,
        balance: f64,
        policy: ConsumptionPolicy,
    },
}

impl<F: Copy> EventKind<F> {
    pub fn tag(&self) -> EventTag {
        match self {
            EventKind::Created { .. } => EventTag::Creation,
            EventKind::FieldUpdate { .. } => EventTag::FieldUpdate,
            EventKind::StatusChange { .. } => EventTag::StatusChange,
            EventKind::ResourceLoad { .. } => EventTag::ResourceLoad,
            EventKind::ResourceConsumption { .. } => EventTag::ResourceConsumption,
            EventKind::Rejected { .. } => EventTag::Rejection,
        }
    }

    /// Field the event is about (None for creation, which covers every field)
    pub fn field(&self) -> Option<F> {
        match self {
            EventKind::Created { .. } => None,
            EventKind::FieldUpdate { field, .. }
            | EventKind::StatusChange { field, .. }
            | EventKind::ResourceLoad { field, .. }
            | EventKind::ResourceConsumption { field, .. }
            | EventKind::Rejected { field, .. } => Some(*field),
        }
    }

    pub fn before(&self) -> Option<FieldValue> {
        match self {
            EventKind::Created { .. } => None,
            EventKind::FieldUpdate { before, .. } | EventKind::StatusChange { before, .. } => {
                Some(before.clone())
            }
            EventKind::ResourceLoad { before, .. }
            | EventKind::ResourceConsumption { before, .. } => Some(FieldValue::Number(*before)),
            EventKind::Rejected { balance, .. } => Some(FieldValue::Number(*balance)),
        }
    }

    pub fn after(&self) -> Option<FieldValue> {
        match self {
            EventKind::Created { .. } => None,
            EventKind::FieldUpdate { after, .. } | EventKind::StatusChange { after, .. } => {
                Some(after.clone())
            }
            EventKind::ResourceLoad { after, .. }
            | EventKind::ResourceConsumption { after, .. } => Some(FieldValue::Number(*after)),
            EventKind::Rejected { balance, .. } => Some(FieldValue::Number(*balance)),
        }
    }
}

// ============================================================================
// EVENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event<F> {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    #[serde(flatten)]
    pub kind: EventKind<F>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<F: Copy> Event<F> {
    pub(crate) fn new(actor: &str, kind: EventKind<F>, detail: Option<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor: actor.to_string(),
            kind,
            detail,
        }
    }

    pub fn tag(&self) -> EventTag {
        self.kind.tag()
    }

    pub fn field(&self) -> Option<F> {
        self.kind.field()
    }

    pub fn before(&self) -> Option<FieldValue> {
        self.kind.before()
    }

    pub fn after(&self) -> Option<FieldValue> {
        self.kind.after()
    }
}

// ============================================================================
// TESTS
// ============================================================================
