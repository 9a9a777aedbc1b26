//! Policies that always propose the same status.

use crate::core::{DecisionParams, StatusError, StatusValue};
use crate::policy::signal::{Signal, Verdict};
use crate::policy::traits::Policy;

/// Proposes a fixed status regardless of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStatusPolicy {
    status: StatusValue,
}

impl FixedStatusPolicy {
    /// Creates a policy proposing `status`.
    pub fn new(status: StatusValue) -> Self {
        Self { status }
    }
}

impl Policy for FixedStatusPolicy {
    fn evaluate(&self, _params: &DecisionParams, _signal: &Signal) -> Result<Verdict, StatusError> {
        Ok(Verdict::new(self.status, format!("{} by default", self.status)))
    }
}
