//! The policy decision point.

use crate::audit;
use crate::command::CommandSource;
use crate::config::{PolicyDeclaration, StatusConfig};
use crate::core::{
    Decision, DecisionParams, EnforcementResult, PolicyInfo, PolicyResult, StatusError,
    StatusResult, StatusValue,
};
use crate::policy::{PolicyMeta, PolicyRegistry, Signal};
use crate::state_machine::ResourceStatusMachine;

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

/// Reason given when no configured policy applies to an element.
pub const NO_APPLICABLE_POLICY: &str = "No applicable policy";

/// Tuning of the policy decision point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdpConfig {
    /// Joins the reasons of equally severe results.
    pub reason_separator: String,

    /// Whether matched policies' commands are fetched concurrently.
    pub parallel_fetch: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            reason_separator: " ### ".to_string(),
            parallel_fetch: true,
        }
    }
}

impl PdpConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reason separator.
    pub fn with_reason_separator(mut self, separator: impl Into<String>) -> Self {
        self.reason_separator = separator.into();
        self
    }

    /// Enables or disables concurrent command fetches.
    pub fn with_parallel_fetch(mut self, enabled: bool) -> Self {
        self.parallel_fetch = enabled;
        self
    }
}

/// Turns decision parameters into one enforcement decision.
///
/// The decision point selects the configured policies matching the
/// element, fetches their signals, evaluates them, keeps the most severe
/// proposal (first configured wins a tie) and passes it through the
/// status machine's transition guard.
#[derive(Debug)]
pub struct PolicyDecisionPoint {
    config: Arc<StatusConfig>,
    registry: PolicyRegistry,
    commands: Arc<dyn CommandSource>,
    machine: ResourceStatusMachine,
    settings: PdpConfig,
}

impl PolicyDecisionPoint {
    /// Creates a decision point.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is inconsistent or declares a policy type
    /// missing from `registry`.
    pub fn new(
        config: Arc<StatusConfig>,
        registry: PolicyRegistry,
        commands: Arc<dyn CommandSource>,
    ) -> StatusResult<Self> {
        config.validate()?;
        for declaration in &config.policies {
            registry.get(&declaration.policy_type)?;
        }

        Ok(Self {
            config,
            registry,
            commands,
            machine: ResourceStatusMachine::new(),
            settings: PdpConfig::default(),
        })
    }

    /// Sets the tuning.
    pub fn with_settings(mut self, settings: PdpConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Arc<StatusConfig> {
        &self.config
    }

    /// Returns the policy registry.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Decides the status of one element.
    ///
    /// Signal problems and failing policies become `Error`/`Unknown`
    /// results; only malformed parameters fail the call.
    pub async fn decide(&self, params: &DecisionParams) -> StatusResult<Decision> {
        params.validate()?;

        let matched = self
            .config
            .policies_for(params)
            .map(|declaration| {
                self.registry
                    .get(&declaration.policy_type)
                    .map(|meta| (declaration, meta))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if matched.is_empty() {
            let status = self.machine.next_state(params.status, StatusValue::Unknown);
            tracing::debug!(
                name = %params.name,
                status_type = %params.status_type,
                current = %params.status,
                status = %status,
                "No policy matches element"
            );
            let decision = Decision {
                enforcement: EnforcementResult::new(status, NO_APPLICABLE_POLICY),
                single_results: Vec::new(),
            };
            audit::emit_decision(params, StatusValue::Unknown, &decision);
            return Ok(decision);
        }

        let signals = self.fetch_signals(params, &matched).await;
        let single_results: Vec<PolicyResult> = matched
            .iter()
            .zip(signals.iter())
            .map(|((declaration, meta), signal)| self.evaluate(params, declaration, meta, signal))
            .collect();

        let (candidate, enforcement) = self.combine(params, &single_results);
        let decision = Decision {
            enforcement,
            single_results,
        };
        audit::emit_decision(params, candidate, &decision);
        Ok(decision)
    }

    async fn fetch_signals(
        &self,
        params: &DecisionParams,
        matched: &[(&PolicyDeclaration, &PolicyMeta)],
    ) -> Vec<Signal> {
        let fetches = matched.iter().map(|(declaration, meta)| async move {
            match &meta.command {
                Some(command) => {
                    let args = meta.merged_args(&declaration.args);
                    self.commands.fetch(command, &args, params).await
                }
                None => Ok(Value::Null),
            }
        });

        if self.settings.parallel_fetch {
            join_all(fetches).await
        } else {
            let mut signals = Vec::with_capacity(matched.len());
            for fetch in fetches {
                signals.push(fetch.await);
            }
            signals
        }
    }

    fn evaluate(
        &self,
        params: &DecisionParams,
        declaration: &PolicyDeclaration,
        meta: &PolicyMeta,
        signal: &Signal,
    ) -> PolicyResult {
        let info = PolicyInfo::new(&declaration.name, &declaration.policy_type, &meta.description)
            .with_args(meta.merged_args(&declaration.args));

        match meta.policy.evaluate(params, signal) {
            Ok(verdict) => {
                tracing::debug!(
                    name = %params.name,
                    policy = %declaration.name,
                    status = %verdict.status,
                    reason = %verdict.reason,
                    "Policy evaluated"
                );
                PolicyResult::new(verdict.status, verdict.reason, info)
            }
            Err(e) => {
                let error = match e {
                    StatusError::Signal { .. } => e,
                    other => StatusError::signal(&declaration.name, other.to_string()),
                };
                tracing::warn!(
                    name = %params.name,
                    policy = %declaration.name,
                    kind = ?error.kind(),
                    error = %error,
                    "Policy failed"
                );
                PolicyResult::new(StatusValue::Error, error.to_string(), info)
            }
        }
    }

    /// Combines non-empty `results` into the candidate and the final decision.
    fn combine(
        &self,
        params: &DecisionParams,
        results: &[PolicyResult],
    ) -> (StatusValue, EnforcementResult) {
        let ordered = self.machine.order_by_severity(results.to_vec());
        let candidate = ordered
            .first()
            .map_or(StatusValue::Unknown, |most_severe| most_severe.status);

        let status = self.machine.next_state(params.status, candidate);
        if status != candidate {
            tracing::info!(
                name = %params.name,
                status_type = %params.status_type,
                current = %params.status,
                candidate = %candidate,
                status = %status,
                "Transition overridden by status machine"
            );
        }

        let reason = ordered
            .iter()
            .filter(|result| result.status == candidate)
            .map(|result| result.reason.as_str())
            .collect::<Vec<_>>()
            .join(&self.settings.reason_separator);

        let actions = self.config.actions_for(params, status);
        (
            candidate,
            EnforcementResult::new(status, reason).with_actions(actions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::StaticCommandSource;
    use crate::config::{MatchParams, PolicyActionDeclaration};
    use crate::core::ElementFamily;
    use crate::policy::{Policy, Verdict};
    use serde_json::json;

    #[derive(Debug)]
    struct BrokenPolicy;

    impl Policy for BrokenPolicy {
        fn evaluate(&self, _: &DecisionParams, _: &Signal) -> StatusResult<Verdict> {
            Err(StatusError::signal("Broken", "malformed accounting record"))
        }
    }

    fn storage_params(status: StatusValue) -> DecisionParams {
        DecisionParams::new(ElementFamily::Resource, "CERN-DISK", "StorageElement", "ReadAccess")
            .with_status(status)
    }

    fn storage_match() -> MatchParams {
        MatchParams::any().with_element_type("StorageElement")
    }

    fn pdp(config: StatusConfig, commands: StaticCommandSource) -> PolicyDecisionPoint {
        PolicyDecisionPoint::new(
            Arc::new(config),
            PolicyRegistry::builtin(),
            Arc::new(commands),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_most_severe_policy_wins() {
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("Active", "AlwaysActive").with_match(storage_match()))
            .with_policy(PolicyDeclaration::new("Space", "FreeDiskSpace").with_match(storage_match()))
            .with_action(
                PolicyActionDeclaration::new("LogStatus", "LogStatusAction"),
            );
        let commands = StaticCommandSource::new()
            .with_value("FreeDiskSpaceCommand", json!({"Total": 100, "Free": 4.0}));

        let decision = pdp(config, commands)
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();

        assert_eq!(decision.enforcement.status, StatusValue::Degraded);
        assert_eq!(decision.enforcement.reason, "Little free space");
        assert_eq!(decision.single_results.len(), 2);
        assert_eq!(decision.single_results[0].policy.name, "Active");
        assert_eq!(decision.enforcement.policy_action.len(), 1);
    }

    #[tokio::test]
    async fn test_equal_severity_reasons_are_joined_in_order() {
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("Space", "FreeDiskSpace"))
            .with_policy(PolicyDeclaration::new("Banned", "AlwaysBanned"));
        let commands = StaticCommandSource::new()
            .with_value("FreeDiskSpaceCommand", json!({"Total": 100, "Free": 0.0}));

        let decision = pdp(config, commands)
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();

        assert_eq!(decision.enforcement.status, StatusValue::Banned);
        assert_eq!(
            decision.enforcement.reason,
            "Too little free space ### Banned by default"
        );
    }

    #[tokio::test]
    async fn test_banned_element_goes_through_probing() {
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("Active", "AlwaysActive"))
            .with_action(
                PolicyActionDeclaration::new("Alarm", "AlarmAction").for_status(StatusValue::Probing),
            )
            .with_action(
                PolicyActionDeclaration::new("Unban", "RealBanAction").for_status(StatusValue::Active),
            );

        let decision = pdp(config, StaticCommandSource::new())
            .decide(&storage_params(StatusValue::Banned))
            .await
            .unwrap();

        assert_eq!(decision.enforcement.status, StatusValue::Probing);
        assert_eq!(decision.enforcement.reason, "Active by default");
        assert_eq!(decision.enforcement.policy_action.len(), 1);
        assert_eq!(decision.enforcement.policy_action[0].name, "Alarm");
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let registry = PolicyRegistry::builtin().with_policy(
            "Broken",
            PolicyMeta::new("Always raises", None, BrokenPolicy),
        );
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("Jobs", "JobDoneRatio"))
            .with_policy(PolicyDeclaration::new("Broken", "Broken"))
            .with_policy(PolicyDeclaration::new("Active", "AlwaysActive"));
        let commands = StaticCommandSource::new().with_failure("JobCommand", "accounting timeout");

        let pdp = PolicyDecisionPoint::new(Arc::new(config), registry, Arc::new(commands)).unwrap();
        let decision = pdp
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();

        assert_eq!(decision.single_results.len(), 3);
        assert_eq!(decision.single_results[0].status, StatusValue::Error);
        assert_eq!(decision.single_results[0].reason, "accounting timeout");
        assert_eq!(decision.single_results[1].status, StatusValue::Error);
        assert_eq!(
            decision.single_results[1].reason,
            "signal for policy 'Broken' failed: malformed accounting record"
        );
        assert_eq!(decision.single_results[2].status, StatusValue::Active);
        assert_eq!(decision.enforcement.status, StatusValue::Error);
        assert!(decision.enforcement.reason.starts_with("accounting timeout ### "));
    }

    #[derive(Debug)]
    struct MisconfiguredPolicy;

    impl Policy for MisconfiguredPolicy {
        fn evaluate(&self, _: &DecisionParams, _: &Signal) -> StatusResult<Verdict> {
            Err(StatusError::configuration("threshold table is empty"))
        }
    }

    #[tokio::test]
    async fn test_policy_failure_is_reported_as_signal_error() {
        let registry = PolicyRegistry::builtin().with_policy(
            "Misconfigured",
            PolicyMeta::new("Always misconfigured", None, MisconfiguredPolicy),
        );
        let config = StatusConfig::new().with_policy(PolicyDeclaration::new("Thresholds", "Misconfigured"));
        let pdp = PolicyDecisionPoint::new(
            Arc::new(config),
            registry,
            Arc::new(StaticCommandSource::new()),
        )
        .unwrap();

        let decision = pdp
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();
        assert_eq!(decision.enforcement.status, StatusValue::Error);
        assert_eq!(
            decision.enforcement.reason,
            "signal for policy 'Thresholds' failed: configuration error: threshold table is empty"
        );
    }

    #[tokio::test]
    async fn test_no_applicable_policy() {
        let config = StatusConfig::new().with_policy(
            PolicyDeclaration::new("Sites", "AlwaysActive")
                .with_match(MatchParams::any().with_element(ElementFamily::Site)),
        );
        let decision = pdp(config, StaticCommandSource::new())
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();

        assert_eq!(decision.enforcement.status, StatusValue::Unknown);
        assert_eq!(decision.enforcement.reason, NO_APPLICABLE_POLICY);
        assert!(decision.enforcement.has_no_actions());
        assert!(decision.single_results.is_empty());
    }

    #[tokio::test]
    async fn test_banned_element_without_policy_goes_to_probing() {
        let decision = pdp(StatusConfig::new(), StaticCommandSource::new())
            .decide(&storage_params(StatusValue::Banned))
            .await
            .unwrap();

        assert_eq!(decision.enforcement.status, StatusValue::Probing);
        assert_eq!(decision.enforcement.reason, NO_APPLICABLE_POLICY);
        assert!(decision.enforcement.has_no_actions());
    }

    #[tokio::test]
    async fn test_malformed_params_fail_before_fetching() {
        let commands = Arc::new(StaticCommandSource::new());
        let config = StatusConfig::new().with_policy(PolicyDeclaration::new("Space", "FreeDiskSpace"));
        let pdp = PolicyDecisionPoint::new(
            Arc::new(config),
            PolicyRegistry::builtin(),
            commands.clone(),
        )
        .unwrap();

        let mut params = storage_params(StatusValue::Active);
        params.name = String::new();
        let err = pdp.decide(&params).await.unwrap_err();
        assert!(matches!(err, StatusError::InvalidParams { .. }));
        assert_eq!(commands.fetch_count(), 0);
    }

    #[test]
    fn test_unknown_policy_type_rejected_at_construction() {
        let config = StatusConfig::new().with_policy(PolicyDeclaration::new("X", "Crystal"));
        let err = PolicyDecisionPoint::new(
            Arc::new(config),
            PolicyRegistry::builtin(),
            Arc::new(StaticCommandSource::new()),
        )
        .unwrap_err();
        assert!(matches!(err, StatusError::UnknownPolicyType { .. }));
    }

    #[tokio::test]
    async fn test_sequential_fetch_gives_same_decision() {
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("Jobs", "JobEfficiency"))
            .with_policy(PolicyDeclaration::new("Space", "FreeDiskSpaceRatio"));
        let commands = StaticCommandSource::new()
            .with_value("JobCommand", json!({"Completed": 0, "Done": 8, "Failed": 2}))
            .with_value("FreeDiskSpaceCommand", json!({"Total": 100, "Free": 50}));

        let decision = pdp(config, commands)
            .with_settings(PdpConfig::new().with_parallel_fetch(false))
            .decide(&storage_params(StatusValue::Active))
            .await
            .unwrap();
        assert_eq!(decision.enforcement.status, StatusValue::Degraded);
        assert_eq!(decision.enforcement.reason, "Jobs Efficiency of 0.80");
    }
}
