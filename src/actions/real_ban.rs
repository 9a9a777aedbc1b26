//! Applies a decision to the grid's operational mask.

use crate::actions::traits::{Action, ActionContext};
use crate::core::{StatusError, StatusValue};
use crate::notify::{MaskController, Notifier};

use async_trait::async_trait;
use std::sync::Arc;

/// Settings for [`RealBanAction`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealBanConfig {
    /// Where transitions are mailed. No mail is sent when empty.
    pub operations_address: Vec<String>,
}

impl RealBanConfig {
    /// Creates a configuration without an operations address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operations address.
    pub fn with_operations_address(mut self, address: impl Into<String>) -> Self {
        self.operations_address.push(address.into());
        self
    }
}

/// Bans or re-admits the element in the operational mask.
///
/// `Banned` bans; `Active` and `Degraded` re-admit; anything else leaves the
/// mask alone. The mask is read first, so repeating a run does nothing.
#[derive(Debug, Clone)]
pub struct RealBanAction {
    mask: Arc<dyn MaskController>,
    notifier: Arc<dyn Notifier>,
    config: RealBanConfig,
}

impl RealBanAction {
    /// Creates the action.
    pub fn new(
        mask: Arc<dyn MaskController>,
        notifier: Arc<dyn Notifier>,
        config: RealBanConfig,
    ) -> Self {
        Self {
            mask,
            notifier,
            config,
        }
    }

    /// Returns the mask state wanted for `status`, if any.
    pub fn wanted_ban(status: StatusValue) -> Option<bool> {
        match status {
            StatusValue::Banned => Some(true),
            StatusValue::Active | StatusValue::Degraded => Some(false),
            _ => None,
        }
    }
}

#[async_trait]
impl Action for RealBanAction {
    fn action_type(&self) -> &'static str {
        super::REAL_BAN_ACTION
    }

    async fn run(&self, context: &ActionContext) -> Result<(), StatusError> {
        let key = context.decision_params.key()?;
        let status = context.enforcement_result.status;
        let reason = &context.enforcement_result.reason;

        let Some(ban) = Self::wanted_ban(status) else {
            tracing::debug!(element = %key, status = %status, "Mask left unchanged");
            return Ok(());
        };

        if self.mask.is_banned(&key).await? == ban {
            tracing::debug!(element = %key, banned = ban, "Mask already in wanted state");
            return Ok(());
        }

        if ban {
            self.mask.ban(&key, reason).await?;
        } else {
            self.mask.unban(&key, reason).await?;
        }
        let verb = if ban { "banned" } else { "re-admitted" };
        tracing::warn!(element = %key, status = %status, reason = %reason, "Element {}", verb);

        if self.config.operations_address.is_empty() {
            tracing::debug!(element = %key, "No operations address configured");
            return Ok(());
        }
        let subject = format!("{} {} {}", key.element, key.name, verb);
        let body = format!(
            "{} {} ({}) was {} as it is now {}\nReason: {}",
            key.element, key.name, key.status_type, verb, status, reason
        );
        self.notifier
            .send_mail(&self.config.operations_address, &subject, &body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DecisionParams, ElementFamily, EnforcementResult};
    use crate::notify::{InMemoryMask, RecordingNotifier};

    fn context(status: StatusValue) -> ActionContext {
        ActionContext::new(
            "RealBan",
            DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all"),
            EnforcementResult::new(status, "OUTAGE 42 power cut"),
            Vec::new(),
        )
    }

    fn action(mask: Arc<InMemoryMask>, notifier: Arc<RecordingNotifier>) -> RealBanAction {
        RealBanAction::new(
            mask,
            notifier,
            RealBanConfig::new().with_operations_address("ops@example.org"),
        )
    }

    #[tokio::test]
    async fn test_ban_is_idempotent() {
        let mask = Arc::new(InMemoryMask::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let action = action(mask.clone(), notifier.clone());

        action.run(&context(StatusValue::Banned)).await.unwrap();
        action.run(&context(StatusValue::Banned)).await.unwrap();

        assert_eq!(mask.changes().len(), 1);
        assert_eq!(notifier.mails().len(), 1);
        assert_eq!(notifier.mails()[0].recipients, vec!["ops@example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_unban_and_no_op_statuses() {
        let mask = Arc::new(InMemoryMask::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let action = action(mask.clone(), notifier.clone());

        action.run(&context(StatusValue::Active)).await.unwrap();
        assert!(mask.changes().is_empty());

        action.run(&context(StatusValue::Banned)).await.unwrap();
        action.run(&context(StatusValue::Probing)).await.unwrap();
        action.run(&context(StatusValue::Unknown)).await.unwrap();
        assert_eq!(mask.changes().len(), 1);

        action.run(&context(StatusValue::Degraded)).await.unwrap();
        let changes = mask.changes();
        assert_eq!(changes.len(), 2);
        assert!(!changes[1].1);
        assert_eq!(notifier.mails().len(), 2);
    }

    #[test]
    fn test_wanted_ban() {
        assert_eq!(RealBanAction::wanted_ban(StatusValue::Banned), Some(true));
        assert_eq!(RealBanAction::wanted_ban(StatusValue::Active), Some(false));
        assert_eq!(RealBanAction::wanted_ban(StatusValue::Error), None);
    }
}
