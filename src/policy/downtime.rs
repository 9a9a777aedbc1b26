//! Downtime calendar policy.

use crate::core::{DecisionParams, StatusError, StatusValue};
use crate::policy::signal::{self, Signal, Verdict};
use crate::policy::traits::Policy;

/// Maps an announced downtime onto a status.
///
/// No downtime is `Active`, a `WARNING` downtime is `Degraded` and an
/// `OUTAGE` is `Banned`. The reason is the downtime id followed by its
/// description.
#[derive(Debug, Clone, Default)]
pub struct DowntimePolicy;

impl DowntimePolicy {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }

    fn verdict(&self, signal: &Signal) -> Result<Verdict, Verdict> {
        let Some(downtime) = signal::optional_sample(signal)? else {
            return Ok(Verdict::new(StatusValue::Active, "No DownTime announced"));
        };

        let severity = signal::text(downtime, "Severity")?;
        let status = match severity.to_ascii_uppercase().as_str() {
            "OUTAGE" => StatusValue::Banned,
            "WARNING" => StatusValue::Degraded,
            _ => return Err(Verdict::error(format!("Unknown severity {severity}"))),
        };

        let id = signal::text(downtime, "DowntimeID")?;
        let description = signal::text(downtime, "Description").unwrap_or_default();
        Ok(Verdict::new(status, format!("{id} {description}").trim_end().to_string()))
    }
}

impl Policy for DowntimePolicy {
    fn evaluate(&self, _params: &DecisionParams, signal: &Signal) -> Result<Verdict, StatusError> {
        Ok(self.verdict(signal).unwrap_or_else(|early| early))
    }
}
