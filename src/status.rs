// Two-state status flags shared by the entity families

use crate::event::FieldValue;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an owning entity (parcels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

impl ActiveStatus {
    pub const NAMES: &'static [&'static str] = &["active", "inactive"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveStatus::Active => "active",
            ActiveStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == ActiveStatus::Active
    }
}

/// Operational status of a vehicle or a dependent sub-resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnabledStatus {
    #[default]
    Enabled,
    Disabled,
}

impl EnabledStatus {
    pub const NAMES: &'static [&'static str] = &["enabled", "disabled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnabledStatus::Enabled => "enabled",
            EnabledStatus::Disabled => "disabled",
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self == EnabledStatus::Enabled
    }
}

impl std::fmt::Display for ActiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for EnabledStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ActiveStatus> for FieldValue {
    fn from(status: ActiveStatus) -> Self {
        FieldValue::Text(status.as_str().to_string())
    }
}

impl From<EnabledStatus> for FieldValue {
    fn from(status: EnabledStatus) -> Self {
        FieldValue::Text(status.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(ActiveStatus::default().is_active());
        assert!(EnabledStatus::default().is_enabled());
    }

    #[test]
    fn test_status_names_match_field_values() {
        for status in [ActiveStatus::Active, ActiveStatus::Inactive] {
            let value = FieldValue::from(status);
            assert!(ActiveStatus::NAMES.contains(&value.as_text().unwrap()));
        }
        assert_eq!(FieldValue::from(EnabledStatus::Disabled), FieldValue::from("disabled"));
    }
}
