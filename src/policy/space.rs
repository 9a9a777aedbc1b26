//! Storage space policies.

use crate::core::{DecisionParams, StatusError, StatusValue};
use crate::policy::signal::{self, Signal, Verdict};
use crate::policy::thresholds::{Bound, ThresholdTable};
use crate::policy::traits::Policy;

/// Classifies the absolute free space reported for a storage element.
///
/// The signal must carry `Total` and `Free`. Units are whatever the command
/// reports (TB for space tokens).
#[derive(Debug, Clone)]
pub struct FreeSpacePolicy {
    table: ThresholdTable,
    /// Reasons for `Banned`, `Degraded` and `Active`, in that order.
    reasons: [&'static str; 3],
}

impl FreeSpacePolicy {
    /// Free disk space: banned below 0.1, degraded below 5.
    pub fn free_disk_space() -> Self {
        Self {
            table: ThresholdTable::new(Bound::Below(0.1), Bound::Below(5.0)),
            reasons: ["Too little free space", "Little free space", "Enough free space"],
        }
    }

    /// Space token occupancy: banned below 100GB, degraded below 5TB.
    pub fn space_token_occupancy() -> Self {
        Self {
            table: ThresholdTable::new(Bound::Below(0.1), Bound::Below(5.0)),
            reasons: ["Free space < 100GB", "Free space < 5TB", "Free space > 5TB"],
        }
    }

    fn verdict(&self, signal: &Signal) -> Result<Verdict, Verdict> {
        let values = signal::sample(signal)?;
        signal::number(values, "Total")?;
        let free = signal::number(values, "Free")?;

        let status = self.table.classify(free);
        let reason = match status {
            StatusValue::Banned => self.reasons[0],
            StatusValue::Degraded => self.reasons[1],
            _ => self.reasons[2],
        };
        Ok(Verdict::new(status, reason))
    }
}

impl Policy for FreeSpacePolicy {
    fn evaluate(&self, _params: &DecisionParams, signal: &Signal) -> Result<Verdict, StatusError> {
        Ok(self.verdict(signal).unwrap_or_else(|early| early))
    }
}

/// Classifies free space as a percentage of total space.
///
/// Banned below 1%, degraded below 10%.
#[derive(Debug, Clone)]
pub struct FreeSpaceRatioPolicy {
    table: ThresholdTable,
}

impl FreeSpaceRatioPolicy {
    /// Creates the policy with the default table.
    pub fn new() -> Self {
        Self {
            table: ThresholdTable::new(Bound::Below(1.0), Bound::Below(10.0)),
        }
    }

    fn verdict(&self, signal: &Signal) -> Result<Verdict, Verdict> {
        let values = signal::sample(signal)?;
        let total = signal::number(values, "Total")?;
        let free = signal::number(values, "Free")?;

        if total <= 0.0 {
            return Err(Verdict::unknown("Not enough space to take a decision"));
        }

        let percent = 100.0 * free / total;
        Ok(Verdict::new(
            self.table.classify(percent),
            format!("Free space of {percent:.2}%"),
        ))
    }
}

impl Default for FreeSpaceRatioPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for FreeSpaceRatioPolicy {
    fn evaluate(&self, _params: &DecisionParams, signal: &Signal) -> Result<Verdict, StatusError> {
        Ok(self.verdict(signal).unwrap_or_else(|early| early))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ElementFamily;
    use crate::policy::signal::NO_VALUES;
    use serde_json::json;

    fn eval(policy: &dyn Policy, signal: Signal) -> Verdict {
        let params = DecisionParams::new(ElementFamily::Resource, "CERN-DISK", "StorageElement", "WriteAccess");
        policy.evaluate(&params, &signal).unwrap()
    }

    #[test]
    fn test_free_disk_space() {
        let policy = FreeSpacePolicy::free_disk_space();
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 100, "Free": 0.0, "Guaranteed": 1}))),
            Verdict::new(StatusValue::Banned, "Too little free space")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 100, "Free": 4.0, "Guaranteed": 1}))),
            Verdict::new(StatusValue::Degraded, "Little free space")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 100, "Free": 100, "Guaranteed": 1}))),
            Verdict::new(StatusValue::Active, "Enough free space")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 1}))),
            Verdict::error("Key Free missing")
        );
        assert_eq!(eval(&policy, Ok(json!(null))), Verdict::unknown(NO_VALUES));
        assert_eq!(eval(&policy, Ok(json!([]))), Verdict::unknown(NO_VALUES));
    }

    #[test]
    fn test_space_token_occupancy() {
        let policy = FreeSpacePolicy::space_token_occupancy();
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 20, "Free": 0.05}))),
            Verdict::new(StatusValue::Banned, "Free space < 100GB")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 20, "Free": 2}))),
            Verdict::new(StatusValue::Degraded, "Free space < 5TB")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 20, "Free": 15}))),
            Verdict::new(StatusValue::Active, "Free space > 5TB")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Free": 15}))),
            Verdict::error("Key Total missing")
        );
    }

    #[test]
    fn test_free_space_ratio() {
        let policy = FreeSpaceRatioPolicy::new();
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 200, "Free": 1}))),
            Verdict::new(StatusValue::Banned, "Free space of 0.50%")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 100, "Free": 4.0}))).status,
            StatusValue::Degraded
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 100, "Free": 50}))).status,
            StatusValue::Active
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Total": 0, "Free": 0}))).status,
            StatusValue::Unknown
        );
        assert_eq!(eval(&policy, Ok(json!([]))), Verdict::unknown(NO_VALUES));
    }
}
