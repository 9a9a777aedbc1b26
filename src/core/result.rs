//! Decision result structures.

use crate::core::types::StatusValue;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of the policy that produced a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInfo {
    /// Configured policy name.
    pub name: String,
    /// Registered policy type identifier.
    #[serde(rename = "type")]
    pub policy_type: String,
    /// Human-readable description of the policy type.
    pub description: String,
    /// Arguments passed to the policy's command.
    pub args: Value,
}

impl PolicyInfo {
    /// Creates a policy identity without arguments.
    pub fn new(
        name: impl Into<String>,
        policy_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            policy_type: policy_type.into(),
            description: description.into(),
            args: Value::Null,
        }
    }

    /// Sets the arguments.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// The output of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    /// Proposed status.
    pub status: StatusValue,
    /// Why the policy proposes this status.
    pub reason: String,
    /// The policy that produced this result.
    pub policy: PolicyInfo,
}

impl PolicyResult {
    /// Creates a result for the given policy.
    pub fn new(status: StatusValue, reason: impl Into<String>, policy: PolicyInfo) -> Self {
        Self {
            status,
            reason: reason.into(),
            policy,
        }
    }
}

/// A configured action chosen for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyActionRef {
    /// Configured action name.
    pub name: String,
    /// Registered action implementation identifier.
    pub action_type: String,
}

impl PolicyActionRef {
    /// Creates a new action reference.
    pub fn new(name: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_type: action_type.into(),
        }
    }
}

/// The final decision of the policy decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementResult {
    /// Combined status.
    pub status: StatusValue,
    /// Combined reason.
    pub reason: String,
    /// Actions to run, in configured order.
    pub policy_action: Vec<PolicyActionRef>,
}

impl EnforcementResult {
    /// Creates a decision with no actions.
    pub fn new(status: StatusValue, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            policy_action: Vec::new(),
        }
    }

    /// Sets the actions.
    pub fn with_actions(mut self, actions: Vec<PolicyActionRef>) -> Self {
        self.policy_action = actions;
        self
    }

    /// Returns `true` if no action is configured for this decision.
    pub fn has_no_actions(&self) -> bool {
        self.policy_action.is_empty()
    }
}

/// A decision together with the single policy results it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The combined decision.
    pub enforcement: EnforcementResult,
    /// Every policy result, in configuration order.
    pub single_results: Vec<PolicyResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforcement_result_serialization() {
        let result = EnforcementResult::new(StatusValue::Banned, "Job Done ratio of 0.50")
            .with_actions(vec![PolicyActionRef::new("LogStatus", "LogStatusAction")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "Banned");
        assert_eq!(json["policyAction"][0]["action_type"], "LogStatusAction");
        assert!(!result.has_no_actions());
    }
}
