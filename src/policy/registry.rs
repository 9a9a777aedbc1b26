//! Registry of policy implementations keyed by type identifier.

use crate::core::{StatusError, StatusValue};
use crate::policy::downtime::DowntimePolicy;
use crate::policy::fixed::FixedStatusPolicy;
use crate::policy::ratio::RatioPolicy;
use crate::policy::space::{FreeSpacePolicy, FreeSpaceRatioPolicy};
use crate::policy::traits::Policy;

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Metadata and implementation of one policy type.
#[derive(Clone)]
pub struct PolicyMeta {
    /// Human-readable description.
    pub description: String,
    /// Command producing the policy's signal; `None` for signal-free policies.
    pub command: Option<String>,
    /// Default command arguments, merged under the declaration's own.
    pub args: Value,
    /// The policy implementation.
    pub policy: Arc<dyn Policy>,
}

impl PolicyMeta {
    /// Creates metadata for a policy fed by `command`.
    pub fn new(
        description: impl Into<String>,
        command: Option<&str>,
        policy: impl Policy + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            command: command.map(str::to_string),
            args: Value::Null,
            policy: Arc::new(policy),
        }
    }

    /// Sets the default command arguments.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    /// Returns the default arguments overlaid with `overrides`.
    pub fn merged_args(&self, overrides: &Value) -> Value {
        match (&self.args, overrides) {
            (Value::Object(base), Value::Object(extra)) => {
                let mut merged = base.clone();
                for (key, value) in extra {
                    merged.insert(key.clone(), value.clone());
                }
                Value::Object(merged)
            }
            (base, Value::Null) => base.clone(),
            (_, extra) => extra.clone(),
        }
    }
}

impl fmt::Debug for PolicyMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyMeta")
            .field("description", &self.description)
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}

/// Maps policy type identifiers to their implementations.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, PolicyMeta>,
}

impl PolicyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in policy type.
    pub fn builtin() -> Self {
        Self::new()
            .with_policy(
                "JobDoneRatio",
                PolicyMeta::new(
                    "Ratio of done jobs over completed and done jobs",
                    Some("JobCommand"),
                    RatioPolicy::job_done_ratio(),
                )
                .with_args(json!({"timespan": 86400})),
            )
            .with_policy(
                "JobEfficiency",
                PolicyMeta::new(
                    "Ratio of completed and done jobs over all finished jobs",
                    Some("JobCommand"),
                    RatioPolicy::job_efficiency(),
                )
                .with_args(json!({"timespan": 86400})),
            )
            .with_policy(
                "JobRunningWaitingRatio",
                PolicyMeta::new(
                    "Ratio of running jobs over running, waiting and staging jobs",
                    Some("JobCommand"),
                    RatioPolicy::job_running_waiting_ratio(),
                )
                .with_args(json!({"timespan": 3600})),
            )
            .with_policy(
                "PilotEfficiency",
                PolicyMeta::new(
                    "Ratio of done pilots over all finished pilots",
                    Some("PilotCommand"),
                    RatioPolicy::pilot_efficiency(),
                )
                .with_args(json!({"timespan": 86400})),
            )
            .with_policy(
                "FreeDiskSpace",
                PolicyMeta::new(
                    "Absolute free disk space of a storage element",
                    Some("FreeDiskSpaceCommand"),
                    FreeSpacePolicy::free_disk_space(),
                )
                .with_args(json!({"unit": "TB"})),
            )
            .with_policy(
                "FreeDiskSpaceRatio",
                PolicyMeta::new(
                    "Free disk space as a percentage of total space",
                    Some("FreeDiskSpaceCommand"),
                    FreeSpaceRatioPolicy::new(),
                )
                .with_args(json!({"unit": "TB"})),
            )
            .with_policy(
                "SpaceTokenOccupancy",
                PolicyMeta::new(
                    "Free space of a space token",
                    Some("SpaceTokenOccupancyCommand"),
                    FreeSpacePolicy::space_token_occupancy(),
                )
                .with_args(json!({"unit": "TB"})),
            )
            .with_policy(
                "Downtime",
                PolicyMeta::new(
                    "Ongoing downtimes announced in the downtime calendar",
                    Some("DowntimeCommand"),
                    DowntimePolicy::new(),
                )
                .with_args(json!({"hours": 0})),
            )
            .with_policy(
                "AlwaysActive",
                PolicyMeta::new("Always Active", None, FixedStatusPolicy::new(StatusValue::Active)),
            )
            .with_policy(
                "AlwaysDegraded",
                PolicyMeta::new(
                    "Always Degraded",
                    None,
                    FixedStatusPolicy::new(StatusValue::Degraded),
                ),
            )
            .with_policy(
                "AlwaysProbing",
                PolicyMeta::new(
                    "Always Probing",
                    None,
                    FixedStatusPolicy::new(StatusValue::Probing),
                ),
            )
            .with_policy(
                "AlwaysBanned",
                PolicyMeta::new("Always Banned", None, FixedStatusPolicy::new(StatusValue::Banned)),
            )
    }

    /// Registers a policy type, replacing any previous registration.
    pub fn register(&mut self, policy_type: impl Into<String>, meta: PolicyMeta) {
        self.policies.insert(policy_type.into(), meta);
    }

    /// Registers a policy type and returns self for chaining.
    pub fn with_policy(mut self, policy_type: impl Into<String>, meta: PolicyMeta) -> Self {
        self.register(policy_type, meta);
        self
    }

    /// Looks up a policy type.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::UnknownPolicyType` if nothing is registered.
    pub fn get(&self, policy_type: &str) -> Result<&PolicyMeta, StatusError> {
        self.policies
            .get(policy_type)
            .ok_or_else(|| StatusError::UnknownPolicyType {
                policy_type: policy_type.to_string(),
            })
    }

    /// Returns `true` if the type is registered.
    pub fn contains(&self, policy_type: &str) -> bool {
        self.policies.contains_key(policy_type)
    }

    /// Returns the registered type identifiers, sorted.
    pub fn policy_types(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }
}
