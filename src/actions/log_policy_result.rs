//! Appends every single policy result to the audit table.

use crate::actions::traits::{Action, ActionContext};
use crate::core::StatusError;
use crate::store::{PolicyResultRecord, StatusStore};

use async_trait::async_trait;
use std::sync::Arc;

/// Persists the raw policy results of a decision.
#[derive(Debug, Clone)]
pub struct LogPolicyResultAction {
    store: Arc<dyn StatusStore>,
}

impl LogPolicyResultAction {
    /// Creates the action over `store`.
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for LogPolicyResultAction {
    fn action_type(&self) -> &'static str {
        super::LOG_POLICY_RESULT_ACTION
    }

    async fn run(&self, context: &ActionContext) -> Result<(), StatusError> {
        let params = &context.decision_params;
        let element = params.key()?.element;

        for result in &context.single_policy_results {
            let record = PolicyResultRecord::from_result(
                element,
                &params.name,
                &params.status_type,
                params.vo.clone(),
                result,
            );
            self.store.insert_policy_result(record).await?;
        }

        tracing::debug!(
            name = %params.name,
            status_type = %params.status_type,
            results = context.single_policy_results.len(),
            "Policy results logged"
        );
        Ok(())
    }
}
