//! The policy enforcement point.

use crate::actions::{Action, ActionContext};
use crate::audit;
use crate::config::StatusConfig;
use crate::core::{
    DecisionParams, EnforcementResult, ErrorKind, PolicyResult, StatusError, StatusResult,
    StatusValue,
};
use crate::pep::registry::ActionRegistry;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The outcome of one action run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Configured action name.
    pub name: String,
    /// Action type identifier.
    pub action_type: String,
    /// Failure message, if the action failed.
    pub error: Option<String>,
    /// Kind of the underlying failure, if the action failed.
    pub error_kind: Option<ErrorKind>,
    /// How long the action ran.
    pub duration: Duration,
}

impl ActionOutcome {
    /// Returns `true` if the action succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-action detail of one enforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementReport {
    /// The enforced status.
    pub status: StatusValue,
    /// One outcome per action, in run order.
    pub outcomes: Vec<ActionOutcome>,
}

impl EnforcementReport {
    /// Returns `true` if every action succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ActionOutcome::succeeded)
    }

    /// Returns the failed actions.
    pub fn failed(&self) -> Vec<&ActionOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded()).collect()
    }

    /// Returns the number of actions run.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` if no action ran.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Runs the actions chosen by a decision.
#[derive(Debug, Clone)]
pub struct PolicyEnforcementPoint {
    registry: Arc<ActionRegistry>,
}

impl PolicyEnforcementPoint {
    /// Creates an enforcement point.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::Configuration` for duplicate names and
    /// `StatusError::UnknownAction` if `config` declares an action type
    /// missing from `registry`.
    pub fn new(registry: ActionRegistry, config: &StatusConfig) -> StatusResult<Self> {
        config.validate()?;
        for declaration in &config.policy_actions {
            if !registry.contains(&declaration.action_type) {
                return Err(StatusError::UnknownAction {
                    action: declaration.action_type.clone(),
                });
            }
        }
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Returns the action registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Runs every action of `result`, in order.
    ///
    /// A failing action is logged and the next one still runs. Only an
    /// action type with no implementation fails the call, and it does so
    /// before any action runs.
    pub async fn enforce(
        &self,
        params: &DecisionParams,
        result: &EnforcementResult,
        single_results: &[PolicyResult],
    ) -> StatusResult<EnforcementReport> {
        let actions = result
            .policy_action
            .iter()
            .map(|reference| {
                self.registry
                    .get(&reference.action_type)
                    .map(|action| (reference, action))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = Vec::with_capacity(actions.len());
        for (reference, action) in actions {
            let context = ActionContext::new(
                &reference.name,
                params.clone(),
                result.clone(),
                single_results.to_vec(),
            );
            let outcome = run_action(action.as_ref(), &reference.action_type, &context).await;
            audit::emit_action_outcome(params, &outcome);
            outcomes.push(outcome);
        }

        let report = EnforcementReport {
            status: result.status,
            outcomes,
        };
        if !report.is_success() {
            tracing::warn!(
                name = %params.name,
                status_type = %params.status_type,
                failed = report.failed().len(),
                total = report.len(),
                "Some actions failed"
            );
        }
        Ok(report)
    }
}

async fn run_action(action: &dyn Action, action_type: &str, context: &ActionContext) -> ActionOutcome {
    let start = Instant::now();
    let failure = match action.run(context).await {
        Ok(()) => {
            tracing::debug!(action = %context.name, "Action succeeded");
            None
        }
        Err(e) => {
            let cause = e.kind();
            let error = match e {
                StatusError::Action { .. } => e,
                other => StatusError::action(&context.name, other.to_string()),
            };
            tracing::warn!(
                action = %context.name,
                name = %context.decision_params.name,
                cause = ?cause,
                error = %error,
                "Action failed"
            );
            Some((error.to_string(), cause))
        }
    };
    let (error, error_kind) = failure.unzip();
    ActionOutcome {
        name: context.name.clone(),
        action_type: action_type.to_string(),
        error,
        error_kind,
        duration: start.elapsed(),
    }
}
