//! Commands: the collaborators that pull raw signals from monitoring systems.
//!
//! Commands are opaque to this crate. A [`CommandSource`] runs a named
//! command for one element and returns either its raw value or its failure.
//! Timeouts are the command's own concern.

use crate::core::{CommandError, DecisionParams};
use crate::policy::Signal;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Runs the commands that feed policies.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use gridstatus::command::CommandSource;
/// use gridstatus::policy::Signal;
/// use gridstatus::DecisionParams;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct AccountingDb { /* connection pool */ }
///
/// #[async_trait]
/// impl CommandSource for AccountingDb {
///     async fn fetch(&self, command: &str, args: &serde_json::Value, params: &DecisionParams) -> Signal {
///         // Query the accounting database...
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait CommandSource: Send + Sync + Debug {
    /// Runs `command` with `args` for the element in `params`.
    async fn fetch(&self, command: &str, args: &Value, params: &DecisionParams) -> Signal;
}

/// A command source answering from a fixed table.
///
/// Signals are looked up by `(command, element name)` first and by
/// `command` alone second. Unknown commands fail.
#[derive(Debug, Default)]
pub struct StaticCommandSource {
    by_element: RwLock<HashMap<(String, String), Signal>>,
    by_command: RwLock<HashMap<String, Signal>>,
    fetch_count: AtomicU64,
}

impl StaticCommandSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `command` with `value` for every element.
    pub fn with_value(self, command: impl Into<String>, value: Value) -> Self {
        self.set(command, Ok(value));
        self
    }

    /// Answers `command` with `value` for the named element only.
    pub fn with_element_value(
        self,
        command: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.set_for_element(command, name, Ok(value));
        self
    }

    /// Makes `command` fail with `message` for every element.
    pub fn with_failure(self, command: impl Into<String>, message: impl Into<String>) -> Self {
        let command = command.into();
        let error = CommandError::new(command.clone(), message);
        self.set(command, Err(error));
        self
    }

    /// Sets the signal for `command`.
    pub fn set(&self, command: impl Into<String>, signal: Signal) {
        self.by_command
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(command.into(), signal);
    }

    /// Sets the signal for `command` on one element.
    pub fn set_for_element(
        &self,
        command: impl Into<String>,
        name: impl Into<String>,
        signal: Signal,
    ) {
        self.by_element
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((command.into(), name.into()), signal);
    }

    /// Returns the number of fetches served.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CommandSource for StaticCommandSource {
    async fn fetch(&self, command: &str, _args: &Value, params: &DecisionParams) -> Signal {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let element_key = (command.to_string(), params.name.clone());
        if let Some(signal) = self
            .by_element
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&element_key)
        {
            return signal.clone();
        }

        self.by_command
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(CommandError::new(command, "command not available")))
    }
}
