// ⚙️ Settings - system defaults the exercises leave to "the system"
//
// Loaded from JSON. Every section and key is optional and falls back to its default.

use crate::consumption::ConsumptionPolicy;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plate formats accepted by default: two blocks of 2-4 letters/digits, optional separator
pub const DEFAULT_PLATE_PATTERN: &str = "^[A-Z0-9]{2,4}[- ]?[A-Z0-9]{2,4}$";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub irrigation: IrrigationSettings,
    pub vehicles: VehicleSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrigationSettings {
    /// Liters per hectare applied when a parcel has not configured its own rate
    pub default_rate_l_ha: f64,

    /// Minimum liters a parcel keeps after irrigating
    pub default_threshold_l: f64,

    /// Policy used by the demo when none is requested
    pub default_policy: ConsumptionPolicy,
}

impl Default for IrrigationSettings {
    fn default() -> Self {
        IrrigationSettings {
            default_rate_l_ha: 1000.0,
            default_threshold_l: 0.0,
            default_policy: ConsumptionPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    /// Regex every (upper-cased, trimmed) plate must match
    pub plate_pattern: String,
}

impl Default for VehicleSettings {
    fn default() -> Self {
        VehicleSettings {
            plate_pattern: DEFAULT_PLATE_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json).context("Failed to parse settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.irrigation.default_rate_l_ha > 0.0) {
            return Err(anyhow!(
                "irrigation.default_rate_l_ha must be greater than 0, got {}",
                self.irrigation.default_rate_l_ha
            ));
        }

        if !(self.irrigation.default_threshold_l >= 0.0) {
            return Err(anyhow!(
                "irrigation.default_threshold_l must be 0 or greater, got {}",
                self.irrigation.default_threshold_l
            ));
        }

        regex::Regex::new(&self.vehicles.plate_pattern)
            .with_context(|| format!("vehicles.plate_pattern is not a valid regex: {}", self.vehicles.plate_pattern))?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
