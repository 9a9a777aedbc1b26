//! One decide-then-enforce run for one element.

use crate::core::{DecisionParams, EnforcementResult, PolicyResult, StatusResult};
use crate::pdp::PolicyDecisionPoint;
use crate::pep::enforcement::{EnforcementReport, PolicyEnforcementPoint};

use serde::{Deserialize, Serialize};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// The combined decision.
    pub decision: EnforcementResult,
    /// Every policy result, in configuration order.
    pub single_results: Vec<PolicyResult>,
    /// What the actions did.
    pub report: EnforcementReport,
}

/// Couples a decision point with an enforcement point.
#[derive(Debug)]
pub struct StatusPipeline {
    pdp: PolicyDecisionPoint,
    pep: PolicyEnforcementPoint,
}

impl StatusPipeline {
    /// Creates a pipeline.
    pub fn new(pdp: PolicyDecisionPoint, pep: PolicyEnforcementPoint) -> Self {
        Self { pdp, pep }
    }

    /// Returns the decision point.
    pub fn pdp(&self) -> &PolicyDecisionPoint {
        &self.pdp
    }

    /// Returns the enforcement point.
    pub fn pep(&self) -> &PolicyEnforcementPoint {
        &self.pep
    }

    /// Decides and enforces the status of one element.
    pub async fn run(&self, params: &DecisionParams) -> StatusResult<PipelineOutcome> {
        let decision = self.pdp.decide(params).await?;
        let report = self
            .pep
            .enforce(params, &decision.enforcement, &decision.single_results)
            .await?;

        tracing::info!(
            name = %params.name,
            status_type = %params.status_type,
            status = %decision.enforcement.status,
            actions = report.len(),
            "Pipeline run finished"
        );

        Ok(PipelineOutcome {
            decision: decision.enforcement,
            single_results: decision.single_results,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RealBanConfig;
    use crate::command::StaticCommandSource;
    use crate::config::{
        AssigneeGroup, NotificationChannel, PolicyActionDeclaration, PolicyDeclaration,
        StatusConfig,
    };
    use crate::core::{ElementFamily, StatusValue};
    use crate::notify::{InMemoryMask, RecordingNotifier};
    use crate::pep::ActionRegistry;
    use crate::policy::PolicyRegistry;
    use crate::store::{InMemoryStatusStore, StatusFilter, StatusStore};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_outage_bans_logs_and_notifies() {
        let config = Arc::new(
            StatusConfig::new()
                .with_policy(PolicyDeclaration::new("DT", "Downtime"))
                .with_policy(PolicyDeclaration::new("Default", "AlwaysActive"))
                .with_action(
                    PolicyActionDeclaration::new("LogResults", "LogPolicyResultAction")
                        .for_status(StatusValue::Banned),
                )
                .with_action(
                    PolicyActionDeclaration::new("Alarm", "AlarmAction")
                        .for_status(StatusValue::Banned),
                )
                .with_action(
                    PolicyActionDeclaration::new("Ban", "RealBanAction")
                        .for_status(StatusValue::Banned),
                )
                .with_action(PolicyActionDeclaration::new("LogStatus", "LogStatusAction"))
                .with_assignee_group(
                    AssigneeGroup::new("ops", vec!["ops@example.org".to_string()])
                        .with_channel(NotificationChannel::Mail),
                ),
        );
        let commands = StaticCommandSource::new().with_value(
            "DowntimeCommand",
            json!({"DowntimeID": "42", "Severity": "OUTAGE", "Description": "power cut"}),
        );
        let store = Arc::new(InMemoryStatusStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let mask = Arc::new(InMemoryMask::new());

        let pdp = PolicyDecisionPoint::new(
            config.clone(),
            PolicyRegistry::builtin(),
            Arc::new(commands),
        )
        .unwrap();
        let registry = ActionRegistry::builtin(
            store.clone(),
            notifier.clone(),
            mask.clone(),
            config.clone(),
            RealBanConfig::new(),
        );
        let pep = PolicyEnforcementPoint::new(registry, &config).unwrap();
        let pipeline = StatusPipeline::new(pdp, pep);

        let params = DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all")
            .with_status(StatusValue::Active);
        let outcome = pipeline.run(&params).await.unwrap();

        assert_eq!(outcome.decision.status, StatusValue::Banned);
        assert_eq!(outcome.decision.reason, "42 power cut");
        assert_eq!(outcome.report.len(), 4);
        assert!(outcome.report.is_success());

        assert_eq!(store.rows()[0].status, StatusValue::Banned);
        let logged = store
            .select_policy_results(&StatusFilter::new())
            .await
            .unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(notifier.mails().len(), 1);
        assert_eq!(mask.changes().len(), 1);
    }
}
