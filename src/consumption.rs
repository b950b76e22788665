// 💧 Reserve / Consume - bounded withdrawals against a preserved minimum
//
// A balance may only be drawn down while it stays at or above a threshold.
// Strict: all or nothing. Partial: as much as the threshold allows.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConsumptionPolicy {
    /// Apply the full demand only if the remainder stays >= threshold
    #[default]
    Strict,

    /// Apply the largest amount that keeps the remainder >= threshold
    Partial,
}

/// Outcome of one consumption request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Allocation {
    pub requested: f64,
    pub applied: f64,
    pub before: f64,
    pub after: f64,
    pub policy: ConsumptionPolicy,
}

impl Allocation {
    /// Nothing was applied
    pub fn is_rejected(&self) -> bool {
        self.applied <= 0.0
    }

    /// Applied less than requested (partial policy only)
    pub fn is_partial(&self) -> bool {
        !self.is_rejected() && self.applied < self.requested
    }
}

/// Work out how much of `demand` can be drawn from `balance` without going below `threshold`.
///
/// Pure: the caller decides whether to commit `after` as the new balance.
pub fn allocate(balance: f64, demand: f64, threshold: f64, policy: ConsumptionPolicy) -> Allocation {
    let applied = match policy {
        ConsumptionPolicy::Strict => {
            if balance - demand >= threshold {
                demand
            } else {
                0.0
            }
        }
        ConsumptionPolicy::Partial => demand.min((balance - threshold).max(0.0)),
    };

    Allocation {
        requested: demand,
        applied,
        before: balance,
        after: balance - applied,
        policy,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_applies_in_full() {
        // 10.50 ha x 1500 L/ha against 20000 L with a 2000 L floor
        let allocation = allocate(20000.0, 15750.0, 2000.0, ConsumptionPolicy::Strict);

        assert_eq!(allocation.applied, 15750.0);
        assert_eq!(allocation.after, 4250.0);
        assert!(!allocation.is_rejected());
        assert!(!allocation.is_partial());
    }

    #[test]
    fn test_strict_rejects_whole_request() {
        let allocation = allocate(3000.0, 15750.0, 2000.0, ConsumptionPolicy::Strict);

        assert_eq!(allocation.applied, 0.0);
        assert_eq!(allocation.after, 3000.0);
        assert!(allocation.is_rejected());
    }

    #[test]
    fn test_strict_exact_threshold_is_allowed() {
        let allocation = allocate(5000.0, 3000.0, 2000.0, ConsumptionPolicy::Strict);
        assert_eq!(allocation.applied, 3000.0);
        assert_eq!(allocation.after, 2000.0);
    }

    #[test]
    fn test_partial_stops_at_threshold() {
        let allocation = allocate(3000.0, 15750.0, 2000.0, ConsumptionPolicy::Partial);

        assert_eq!(allocation.applied, 1000.0);
        assert_eq!(allocation.after, 2000.0);
        assert!(allocation.is_partial());
    }

    #[test]
    fn test_partial_full_demand_when_room() {
        let allocation = allocate(20000.0, 6900.0, 1500.0, ConsumptionPolicy::Partial);
        assert_eq!(allocation.applied, 6900.0);
        assert!(!allocation.is_partial());
    }

    #[test]
    fn test_partial_below_threshold_applies_nothing() {
        let allocation = allocate(1500.0, 500.0, 2000.0, ConsumptionPolicy::Partial);

        assert_eq!(allocation.applied, 0.0);
        assert_eq!(allocation.after, 1500.0);
        assert!(allocation.is_rejected());
    }

    #[test]
    fn test_balance_never_negative() {
        for policy in [ConsumptionPolicy::Strict, ConsumptionPolicy::Partial] {
            for (balance, demand) in [(0.0, 10.0), (5.0, 10.0), (10.0, 10.0), (100.0, 1.0)] {
                let allocation = allocate(balance, demand, 0.0, policy);
                assert!(allocation.after >= 0.0);
                assert!(allocation.applied <= demand);
            }
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<ConsumptionPolicy>().unwrap(), ConsumptionPolicy::Strict);
        assert_eq!("Partial".parse::<ConsumptionPolicy>().unwrap(), ConsumptionPolicy::Partial);
        assert!("lenient".parse::<ConsumptionPolicy>().is_err());
        assert_eq!(ConsumptionPolicy::Partial.to_string(), "partial");
    }
}
