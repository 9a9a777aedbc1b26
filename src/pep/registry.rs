//! Registry of action implementations keyed by type identifier.

use crate::actions::{
    Action, AlarmAction, LogPolicyResultAction, LogStatusAction, NotificationMemo,
    RealBanAction, RealBanConfig,
};
use crate::config::StatusConfig;
use crate::core::{StatusError, StatusResult};
use crate::notify::{MaskController, Notifier};
use crate::store::StatusStore;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps action type identifiers to their implementations.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the four built-in actions wired to the given
    /// collaborators.
    pub fn builtin(
        store: Arc<dyn StatusStore>,
        notifier: Arc<dyn Notifier>,
        mask: Arc<dyn MaskController>,
        config: Arc<StatusConfig>,
        real_ban: RealBanConfig,
    ) -> Self {
        let memo = Arc::new(NotificationMemo::new());
        Self::new()
            .with_action(LogStatusAction::new(Arc::clone(&store)))
            .with_action(LogPolicyResultAction::new(Arc::clone(&store)))
            .with_action(
                AlarmAction::new(store, Arc::clone(&notifier), config).with_memo(memo),
            )
            .with_action(RealBanAction::new(mask, notifier, real_ban))
    }

    /// Registers an action under its own type identifier, replacing any
    /// previous registration.
    pub fn register(&mut self, action: impl Action + 'static) {
        self.register_arc(Arc::new(action));
    }

    /// Registers an already shared action.
    pub fn register_arc(&mut self, action: Arc<dyn Action>) {
        self.actions
            .insert(action.action_type().to_string(), action);
    }

    /// Registers an action and returns self for chaining.
    pub fn with_action(mut self, action: impl Action + 'static) -> Self {
        self.register(action);
        self
    }

    /// Looks up an action type.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::UnknownAction` if nothing is registered.
    pub fn get(&self, action_type: &str) -> StatusResult<Arc<dyn Action>> {
        self.actions
            .get(action_type)
            .cloned()
            .ok_or_else(|| StatusError::UnknownAction {
                action: action_type.to_string(),
            })
    }

    /// Returns `true` if the type is registered.
    pub fn contains(&self, action_type: &str) -> bool {
        self.actions.contains_key(action_type)
    }

    /// Returns the registered type identifiers, sorted.
    pub fn action_types(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }
}
