//! The action contract.

use crate::core::{DecisionParams, EnforcementResult, PolicyResult, StatusError};

use async_trait::async_trait;
use std::fmt::Debug;

/// Everything an action knows about the decision it enforces.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContext {
    /// Configured action name.
    pub name: String,
    /// The parameters the decision was made for.
    pub decision_params: DecisionParams,
    /// The combined decision.
    pub enforcement_result: EnforcementResult,
    /// Every policy result, in configuration order.
    pub single_policy_results: Vec<PolicyResult>,
}

impl ActionContext {
    /// Creates a context for the named action.
    pub fn new(
        name: impl Into<String>,
        decision_params: DecisionParams,
        enforcement_result: EnforcementResult,
        single_policy_results: Vec<PolicyResult>,
    ) -> Self {
        Self {
            name: name.into(),
            decision_params,
            enforcement_result,
            single_policy_results,
        }
    }
}

/// A side-effecting handler run by the enforcement point.
///
/// Implementations hold their collaborators and must tolerate being run
/// again for the same decision.
#[async_trait]
pub trait Action: Send + Sync + Debug {
    /// Returns the registered type identifier (e.g. `"LogStatusAction"`).
    fn action_type(&self) -> &'static str;

    /// Applies the decision.
    async fn run(&self, context: &ActionContext) -> Result<(), StatusError>;
}
