//! Ratio policies over job and pilot counters.

use crate::core::{DecisionParams, StatusError};
use crate::policy::signal::{self, Signal, Verdict};
use crate::policy::thresholds::{Bound, ThresholdTable};
use crate::policy::traits::Policy;

/// A policy computing `sum(numerator) / sum(counters)` and classifying it.
///
/// All counters must be present in the signal. Below `min_sample` total
/// items the policy declines to decide.
#[derive(Debug, Clone)]
pub struct RatioPolicy {
    counters: &'static [&'static str],
    numerator: &'static [&'static str],
    min_sample: f64,
    items: &'static str,
    label: &'static str,
    table: ThresholdTable,
}

impl RatioPolicy {
    /// `Done / (Completed + Done)`: banned below 0.80, degraded below 0.95.
    pub fn job_done_ratio() -> Self {
        Self {
            counters: &["Completed", "Done"],
            numerator: &["Done"],
            min_sample: 10.0,
            items: "jobs",
            label: "Job Done ratio",
            table: ThresholdTable::new(Bound::Below(0.80), Bound::Below(0.95)),
        }
    }

    /// `(Completed + Done) / (Completed + Done + Failed)`: banned at or below
    /// 0.5, degraded at or below 0.9.
    pub fn job_efficiency() -> Self {
        Self {
            counters: &["Completed", "Done", "Failed"],
            numerator: &["Completed", "Done"],
            min_sample: 10.0,
            items: "jobs",
            label: "Jobs Efficiency",
            table: ThresholdTable::new(Bound::AtMost(0.5), Bound::AtMost(0.9)),
        }
    }

    /// `Running / (Running + Waiting + Staging)`: banned at or below 0.4,
    /// degraded at or below 0.65.
    pub fn job_running_waiting_ratio() -> Self {
        Self {
            counters: &["Running", "Waiting", "Staging"],
            numerator: &["Running"],
            min_sample: 10.0,
            items: "jobs",
            label: "Job Running / Waiting ratio",
            table: ThresholdTable::new(Bound::AtMost(0.4), Bound::AtMost(0.65)),
        }
    }

    /// `Done / (Aborted + Deleted + Done + Failed)`: banned at or below 0.5,
    /// degraded at or below 0.9.
    pub fn pilot_efficiency() -> Self {
        Self {
            counters: &["Aborted", "Deleted", "Done", "Failed"],
            numerator: &["Done"],
            min_sample: 10.0,
            items: "pilots",
            label: "Pilots Efficiency",
            table: ThresholdTable::new(Bound::AtMost(0.5), Bound::AtMost(0.9)),
        }
    }

    fn verdict(&self, signal: &Signal) -> Result<Verdict, Verdict> {
        let values = signal::sample(signal)?;

        let mut total = 0.0;
        let mut good = 0.0;
        for key in self.counters {
            let count = signal::number(values, key)?;
            total += count;
            if self.numerator.contains(key) {
                good += count;
            }
        }

        if total < self.min_sample {
            return Err(Verdict::unknown(format!(
                "Not enough {} to take a decision",
                self.items
            )));
        }

        let ratio = good / total;
        Ok(Verdict::new(
            self.table.classify(ratio),
            format!("{} of {:.2}", self.label, ratio),
        ))
    }
}

impl Policy for RatioPolicy {
    fn evaluate(&self, _params: &DecisionParams, signal: &Signal) -> Result<Verdict, StatusError> {
        Ok(self.verdict(signal).unwrap_or_else(|early| early))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CommandError, ElementFamily, StatusValue};
    use crate::policy::signal::NO_VALUES;
    use serde_json::json;

    fn params() -> DecisionParams {
        DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all")
    }

    fn eval(policy: &RatioPolicy, signal: Signal) -> Verdict {
        policy.evaluate(&params(), &signal).unwrap()
    }

    #[test]
    fn test_job_done_ratio() {
        let policy = RatioPolicy::job_done_ratio();
        assert_eq!(
            eval(&policy, Ok(json!({"Completed": 10, "Done": 10}))),
            Verdict::new(StatusValue::Banned, "Job Done ratio of 0.50")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Completed": 1, "Done": 9}))),
            Verdict::new(StatusValue::Degraded, "Job Done ratio of 0.90")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Completed": 1, "Done": 29}))),
            Verdict::new(StatusValue::Active, "Job Done ratio of 0.97")
        );
        assert_eq!(
            eval(&policy, Ok(json!({"Completed": 1, "Done": 2}))),
            Verdict::unknown("Not enough jobs to take a decision")
        );
    }

    #[test]
    fn test_job_efficiency() {
        let policy = RatioPolicy::job_efficiency();
        let banned = eval(&policy, Ok(json!({"Completed": 0, "Done": 0, "Failed": 10})));
        assert_eq!(banned, Verdict::new(StatusValue::Banned, "Jobs Efficiency of 0.00"));

        let degraded = eval(&policy, Ok(json!({"Completed": 0, "Done": 8, "Failed": 2})));
        assert_eq!(degraded, Verdict::new(StatusValue::Degraded, "Jobs Efficiency of 0.80"));

        let active = eval(&policy, Ok(json!({"Completed": 10, "Done": 9, "Failed": 1})));
        assert_eq!(active, Verdict::new(StatusValue::Active, "Jobs Efficiency of 0.95"));

        let missing = eval(&policy, Ok(json!({"Completed": 10, "Done": 9})));
        assert_eq!(missing, Verdict::error("Key Failed missing"));
    }

    #[test]
    fn test_running_waiting_and_pilots() {
        let policy = RatioPolicy::job_running_waiting_ratio();
        let verdict = eval(&policy, Ok(json!({"Running": 4, "Waiting": 5, "Staging": 1})));
        assert_eq!(
            verdict,
            Verdict::new(StatusValue::Banned, "Job Running / Waiting ratio of 0.40")
        );
        let verdict = eval(&policy, Ok(json!({"Running": 8, "Waiting": 2, "Staging": 0})));
        assert_eq!(verdict.status, StatusValue::Active);

        let pilots = RatioPolicy::pilot_efficiency();
        let verdict = eval(
            &pilots,
            Ok(json!({"Aborted": 1, "Deleted": 0, "Done": 8, "Failed": 1})),
        );
        assert_eq!(verdict, Verdict::new(StatusValue::Degraded, "Pilots Efficiency of 0.80"));
        let verdict = eval(&pilots, Ok(json!({"Aborted": 0, "Deleted": 0, "Done": 3, "Failed": 0})));
        assert_eq!(verdict, Verdict::unknown("Not enough pilots to take a decision"));
    }

    #[test]
    fn test_no_signal_and_failed_command() {
        for policy in [
            RatioPolicy::job_done_ratio(),
            RatioPolicy::job_efficiency(),
            RatioPolicy::job_running_waiting_ratio(),
            RatioPolicy::pilot_efficiency(),
        ] {
            assert_eq!(eval(&policy, Ok(json!(null))), Verdict::unknown(NO_VALUES));
            assert_eq!(eval(&policy, Ok(json!([]))), Verdict::unknown(NO_VALUES));
            assert_eq!(
                eval(&policy, Err(CommandError::new("JobCommand", "timed out"))),
                Verdict::error("timed out")
            );
        }
    }
}
