//! Outbound collaborators: notifications and the operational mask.
//!
//! - [`Notifier`] delivers in-app notifications and mails.
//! - [`MaskController`] adds elements to and removes them from the grid's
//!   operational mask (site mask, storage access flags).

use crate::core::error::NotifyError;
use crate::core::ElementKey;

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Delivers notifications to people.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Sends a mail to `recipients`.
    async fn send_mail(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;

    /// Queues an in-app notification for `users`.
    async fn notify_web(&self, users: &[String], subject: &str, body: &str)
        -> Result<(), NotifyError>;
}

/// Controls whether an element is part of the operational mask.
#[async_trait]
pub trait MaskController: Send + Sync + Debug {
    /// Returns `true` if the element is currently banned in the mask.
    async fn is_banned(&self, element: &ElementKey) -> Result<bool, NotifyError>;

    /// Bans the element.
    async fn ban(&self, element: &ElementKey, reason: &str) -> Result<(), NotifyError>;

    /// Re-admits the element.
    async fn unban(&self, element: &ElementKey, reason: &str) -> Result<(), NotifyError>;
}

/// Which channel a recorded notification went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered by mail.
    Mail,
    /// Queued as an in-app notification.
    Web,
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Channel used.
    pub delivery: Delivery,
    /// Recipients.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Body.
    pub body: String,
}

/// A notifier that records what it would have sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentNotification>>,
    failing: AtomicBool,
    unreachable: RwLock<HashSet<String>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deliveries fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes deliveries addressed to `recipient` fail.
    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.unreachable
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(recipient.into());
    }

    fn refuses(&self, recipients: &[String]) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return true;
        }
        let unreachable = self
            .unreachable
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        recipients.iter().any(|r| unreachable.contains(r))
    }

    /// Returns every recorded notification.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the recorded mails.
    pub fn mails(&self) -> Vec<SentNotification> {
        self.sent()
            .into_iter()
            .filter(|n| n.delivery == Delivery::Mail)
            .collect()
    }

    fn record(&self, delivery: Delivery, recipients: &[String], subject: &str, body: &str) {
        self.sent
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentNotification {
                delivery,
                recipients: recipients.to_vec(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_mail(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if self.refuses(recipients) {
            return Err(NotifyError::MailFailed {
                recipients: recipients.to_vec(),
                reason: "mail server refused connection".to_string(),
            });
        }
        self.record(Delivery::Mail, recipients, subject, body);
        Ok(())
    }

    async fn notify_web(
        &self,
        users: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if self.refuses(users) {
            return Err(NotifyError::WebFailed {
                reason: "notification queue unavailable".to_string(),
            });
        }
        self.record(Delivery::Web, users, subject, body);
        Ok(())
    }
}

/// An operational mask kept in memory, counting effective changes.
#[derive(Debug, Default)]
pub struct InMemoryMask {
    banned: RwLock<HashSet<ElementKey>>,
    changes: RwLock<Vec<(ElementKey, bool)>>,
}

impl InMemoryMask {
    /// Creates an empty mask (nothing banned).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every change applied, as `(element, banned)`.
    pub fn changes(&self) -> Vec<(ElementKey, bool)> {
        self.changes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn apply(&self, element: &ElementKey, banned: bool) {
        let mut set = self
            .banned
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if banned {
            set.insert(element.clone());
        } else {
            set.remove(element);
        }
        self.changes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((element.clone(), banned));
    }
}

#[async_trait]
impl MaskController for InMemoryMask {
    async fn is_banned(&self, element: &ElementKey) -> Result<bool, NotifyError> {
        Ok(self
            .banned
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(element))
    }

    async fn ban(&self, element: &ElementKey, _reason: &str) -> Result<(), NotifyError> {
        self.apply(element, true);
        Ok(())
    }

    async fn unban(&self, element: &ElementKey, _reason: &str) -> Result<(), NotifyError> {
        self.apply(element, false);
        Ok(())
    }
}
