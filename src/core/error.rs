//! Error types for the gridstatus library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! Every public operation returns a `Result`; the error kind tells callers
//! whether the problem is in their input, in an upstream signal, in an
//! action, in the configuration or in storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`StatusError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed decision parameters or an unknown status literal.
    Input,
    /// An upstream command failed or returned incomplete data.
    Signal,
    /// A side-effecting action failed.
    Action,
    /// The declarative configuration is inconsistent.
    Configuration,
    /// The persistence collaborator failed.
    Storage,
}

/// The main error type for status decisions.
#[derive(Debug, Error)]
pub enum StatusError {
    /// A mandatory decision parameter is missing.
    #[error("invalid decision parameters: '{field}' is not set")]
    InvalidParams {
        /// Name of the missing field.
        field: String,
    },

    /// A string is not one of the six status literals.
    #[error("unknown status '{value}'")]
    UnknownStatus {
        /// The offending literal.
        value: String,
    },

    /// A string is not one of the element families.
    #[error("unknown element family '{value}'")]
    UnknownElementFamily {
        /// The offending literal.
        value: String,
    },

    /// An upstream signal could not be used.
    #[error("signal for policy '{policy}' failed: {message}")]
    Signal {
        /// Policy the signal was fetched for.
        policy: String,
        /// What went wrong.
        message: String,
    },

    /// An action failed while running.
    #[error("action '{action}' failed: {message}")]
    Action {
        /// Name of the action.
        action: String,
        /// What went wrong.
        message: String,
    },

    /// An action identifier has no registered implementation.
    #[error("no action implementation registered for '{action}'")]
    UnknownAction {
        /// The unknown identifier.
        action: String,
    },

    /// A policy type has no registered implementation.
    #[error("no policy implementation registered for '{policy_type}'")]
    UnknownPolicyType {
        /// The unknown identifier.
        policy_type: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A notification or mask collaborator failed.
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl StatusError {
    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParams { .. }
            | Self::UnknownStatus { .. }
            | Self::UnknownElementFamily { .. } => ErrorKind::Input,
            Self::Signal { .. } => ErrorKind::Signal,
            Self::Action { .. } | Self::Notify(_) => ErrorKind::Action,
            Self::UnknownAction { .. }
            | Self::UnknownPolicyType { .. }
            | Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Store(_) => ErrorKind::Storage,
        }
    }

    /// Creates an `InvalidParams` error.
    pub fn invalid_params(field: impl Into<String>) -> Self {
        Self::InvalidParams {
            field: field.into(),
        }
    }

    /// Creates a `Signal` error.
    pub fn signal(policy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Signal {
            policy: policy.into(),
            message: message.into(),
        }
    }

    /// Creates an `Action` error.
    pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Error type for the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is unreachable.
    #[error("status store unavailable: {reason}")]
    Unavailable {
        /// Reason for unavailability.
        reason: String,
    },

    /// A write was rejected.
    #[error("failed to write {table} row: {reason}")]
    WriteFailed {
        /// Logical table name.
        table: &'static str,
        /// Reason for the failure.
        reason: String,
    },

    /// A read failed.
    #[error("failed to read {table}: {reason}")]
    ReadFailed {
        /// Logical table name.
        table: &'static str,
        /// Reason for the failure.
        reason: String,
    },
}

/// Error type for the command collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command '{command}' failed: {message}")]
pub struct CommandError {
    /// Name of the command.
    pub command: String,
    /// Failure message reported by the command.
    pub message: String,
}

impl CommandError {
    /// Creates a command error.
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Error type for notification and operational mask collaborators.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A mail could not be delivered.
    #[error("failed to send mail to {recipients:?}: {reason}")]
    MailFailed {
        /// Intended recipients.
        recipients: Vec<String>,
        /// Reason for the failure.
        reason: String,
    },

    /// An in-app notification could not be queued.
    #[error("failed to queue notification: {reason}")]
    WebFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// The operational mask could not be read or changed.
    #[error("mask operation on '{element}' failed: {reason}")]
    MaskFailed {
        /// Element name.
        element: String,
        /// Reason for the failure.
        reason: String,
    },
}

/// A specialized `Result` type for status operations.
pub type StatusResult<T> = Result<T, StatusError>;

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
