//! Notifies the people responsible for an element of its new status.

use crate::actions::traits::{Action, ActionContext};
use crate::config::{AssigneeGroup, NotificationChannel, StatusConfig};
use crate::core::error::NotifyError;
use crate::core::{ElementKey, StatusError, StatusResult, StatusValue};
use crate::notify::Notifier;
use crate::store::{StatusFilter, StatusStore};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Remembers the last status each assignee group was told about, per element.
///
/// Entries are dropped as soon as the element changes status, so a status
/// is announced once per change and group.
#[derive(Debug, Default)]
pub struct NotificationMemo {
    notified: RwLock<HashMap<ElementKey, HashMap<String, StatusValue>>>,
}

impl NotificationMemo {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `status` was already announced to `group` for `key`.
    pub fn already_notified(&self, key: &ElementKey, group: &str, status: StatusValue) -> bool {
        self.notified
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .and_then(|groups| groups.get(group))
            == Some(&status)
    }

    /// Records that `status` was announced to `group` for `key`.
    pub fn record(&self, key: ElementKey, group: impl Into<String>, status: StatusValue) {
        self.notified
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(key)
            .or_default()
            .insert(group.into(), status);
    }

    /// Forgets every announcement made for `key`.
    pub fn forget(&self, key: &ElementKey) {
        self.notified
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }

    /// Returns the number of remembered elements.
    pub fn len(&self) -> usize {
        self.notified
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sends in-app notifications and mails to matching assignee groups.
#[derive(Debug, Clone)]
pub struct AlarmAction {
    store: Arc<dyn StatusStore>,
    notifier: Arc<dyn Notifier>,
    config: Arc<StatusConfig>,
    memo: Arc<NotificationMemo>,
}

impl AlarmAction {
    /// Creates the action with a fresh memo.
    pub fn new(
        store: Arc<dyn StatusStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<StatusConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            memo: Arc::new(NotificationMemo::new()),
        }
    }

    /// Shares `memo` with other alarm actions.
    pub fn with_memo(mut self, memo: Arc<NotificationMemo>) -> Self {
        self.memo = memo;
        self
    }

    /// Returns the memo.
    pub fn memo(&self) -> &Arc<NotificationMemo> {
        &self.memo
    }

    /// The status the element had before `new_status`.
    ///
    /// Alarms may run before or after the status row is written, so the
    /// stored current status counts only if it differs from the new one.
    async fn prior_status(
        &self,
        key: &ElementKey,
        context: &ActionContext,
    ) -> StatusResult<StatusValue> {
        let new_status = context.enforcement_result.status;
        let mut filter = StatusFilter::new()
            .with_element(key.element)
            .with_name(&key.name)
            .with_status_type(&key.status_type);
        if let Some(vo) = &context.decision_params.vo {
            filter = filter.with_vo(vo);
        }

        if let Some(current) = self.store.current_status(&filter).await? {
            if current.status != new_status {
                return Ok(current.status);
            }
        }
        Ok(self
            .store
            .previous_status(&filter)
            .await?
            .map_or(context.decision_params.status, |entry| entry.record.status))
    }

    async fn deliver(
        &self,
        group: &AssigneeGroup,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if group.wants(NotificationChannel::Web) {
            self.notifier.notify_web(&group.users, subject, body).await?;
        }
        if group.wants(NotificationChannel::Mail) {
            self.notifier.send_mail(&group.users, subject, body).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Action for AlarmAction {
    fn action_type(&self) -> &'static str {
        super::ALARM_ACTION
    }

    async fn run(&self, context: &ActionContext) -> StatusResult<()> {
        let params = &context.decision_params;
        let key = params.key()?;
        let new_status = context.enforcement_result.status;

        if params.status != new_status {
            self.memo.forget(&key);
        }

        let groups: Vec<_> = self
            .config
            .assignee_groups_for(params)
            .filter(|group| !self.memo.already_notified(&key, &group.name, new_status))
            .collect();
        if groups.is_empty() {
            tracing::debug!(element = %key, status = %new_status, "Nobody left to notify");
            return Ok(());
        }

        let prior = self.prior_status(&key, context).await?;
        let subject = format!("{} {} is {}", key.element, key.name, new_status);
        let body = format!(
            "{} {} ({}) changed from {} to {}\nReason: {}",
            key.element,
            key.name,
            key.status_type,
            prior,
            new_status,
            context.enforcement_result.reason
        );

        let mut failed = Vec::new();
        for group in groups {
            match self.deliver(group, &subject, &body).await {
                Ok(()) => {
                    self.memo.record(key.clone(), &group.name, new_status);
                    tracing::info!(
                        element = %key,
                        group = %group.name,
                        prior = %prior,
                        status = %new_status,
                        "Assignee group notified"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        element = %key,
                        group = %group.name,
                        error = %e,
                        "Assignee group not notified"
                    );
                    failed.push(format!("{}: {}", group.name, e));
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StatusError::action(&context.name, failed.join("; ")))
        }
    }
}
