//! Persists the combined decision as the element's current status.

use crate::actions::traits::{Action, ActionContext};
use crate::core::{ElementFamily, StatusError, StatusValue};
use crate::store::{StatusFilter, StatusRecord, StatusStore, SYSTEM_TOKEN_OWNER};

use async_trait::async_trait;
use std::sync::Arc;

/// Longest reason persisted before truncation.
pub const MAX_REASON_LEN: usize = 508;

/// VO value meaning "all virtual organisations".
pub const ALL_VOS: &str = "all";

/// Truncates `reason` to [`MAX_REASON_LEN`] characters plus an ellipsis.
pub fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_REASON_LEN {
        return reason.to_string();
    }
    let mut truncated: String = reason.chars().take(MAX_REASON_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Writes the new status row.
///
/// When the decision is VO-agnostic (`vo == "all"`) the status is copied to
/// every existing per-VO row of the element axis instead.
#[derive(Debug, Clone)]
pub struct LogStatusAction {
    store: Arc<dyn StatusStore>,
}

impl LogStatusAction {
    /// Creates the action over `store`.
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    fn record(
        context: &ActionContext,
        element: ElementFamily,
        status: StatusValue,
        reason: &str,
        vo: Option<&str>,
    ) -> StatusRecord {
        let params = &context.decision_params;
        let record = StatusRecord::new(
            element,
            &params.name,
            &params.status_type,
            status,
            reason,
            &params.element_type,
        )
        .with_token_owner(SYSTEM_TOKEN_OWNER);
        match vo {
            Some(vo) => record.with_vo(vo),
            None => record,
        }
    }

    async fn fan_out(
        &self,
        context: &ActionContext,
        element: ElementFamily,
        reason: &str,
    ) -> Result<usize, StatusError> {
        let params = &context.decision_params;
        let status = context.enforcement_result.status;
        let filter = StatusFilter::new()
            .with_element(element)
            .with_name(&params.name)
            .with_status_type(&params.status_type);

        let mut vos: Vec<String> = self
            .store
            .select_status(&filter)
            .await?
            .into_iter()
            .filter_map(|row| row.vo)
            .filter(|vo| vo != ALL_VOS)
            .collect();
        vos.sort();
        vos.dedup();

        if vos.is_empty() {
            tracing::debug!(
                name = %params.name,
                status_type = %params.status_type,
                "No per-VO rows, writing VO-agnostic row"
            );
            let record = Self::record(context, element, status, reason, Some(ALL_VOS));
            self.store.add_or_modify_status(record).await?;
            return Ok(1);
        }

        for vo in &vos {
            let record = Self::record(context, element, status, reason, Some(vo.as_str()));
            self.store.add_or_modify_status(record).await?;
        }
        Ok(vos.len())
    }
}

#[async_trait]
impl Action for LogStatusAction {
    fn action_type(&self) -> &'static str {
        super::LOG_STATUS_ACTION
    }

    async fn run(&self, context: &ActionContext) -> Result<(), StatusError> {
        let params = &context.decision_params;
        let element = params.key()?.element;
        let reason = truncate_reason(&context.enforcement_result.reason);

        let written = match params.vo.as_deref() {
            Some(ALL_VOS) => self.fan_out(context, element, &reason).await?,
            vo => {
                let record =
                    Self::record(context, element, context.enforcement_result.status, &reason, vo);
                self.store.add_or_modify_status(record).await?;
                1
            }
        };

        tracing::debug!(
            element = %element,
            name = %params.name,
            status_type = %params.status_type,
            status = %context.enforcement_result.status,
            rows = written,
            "Status logged"
        );
        Ok(())
    }
}
