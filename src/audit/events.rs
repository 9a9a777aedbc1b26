//! Audit event types and emission functions.

use crate::core::{Decision, DecisionParams, ErrorKind, StatusValue};
use crate::pep::ActionOutcome;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a decision of the policy decision point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Element family.
    pub element: String,

    /// Element name.
    pub name: String,

    /// Health axis.
    pub status_type: String,

    /// Status before the decision.
    pub previous_status: StatusValue,

    /// Most severe proposed status.
    pub candidate: StatusValue,

    /// Status after the transition guard.
    pub status: StatusValue,

    /// Combined reason.
    pub reason: String,

    /// Names of the policies that ran.
    pub policies: Vec<String>,

    /// Names of the actions chosen.
    pub actions: Vec<String>,
}

impl DecisionAuditEvent {
    /// Builds the event for `decision`.
    pub fn new(params: &DecisionParams, candidate: StatusValue, decision: &Decision) -> Self {
        Self {
            timestamp: Utc::now(),
            element: params
                .element
                .map(|e| e.to_string())
                .unwrap_or_default(),
            name: params.name.clone(),
            status_type: params.status_type.clone(),
            previous_status: params.status,
            candidate,
            status: decision.enforcement.status,
            reason: decision.enforcement.reason.clone(),
            policies: decision
                .single_results
                .iter()
                .map(|r| r.policy.name.clone())
                .collect(),
            actions: decision
                .enforcement
                .policy_action
                .iter()
                .map(|a| a.name.clone())
                .collect(),
        }
    }
}

impl AuditEvent for DecisionAuditEvent {
    fn event_type(&self) -> &'static str {
        "status_decision"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit event for one action run by the enforcement point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Element name.
    pub name: String,

    /// Health axis.
    pub status_type: String,

    /// Configured action name.
    pub action: String,

    /// Action type identifier.
    pub action_type: String,

    /// Whether the action succeeded.
    pub succeeded: bool,

    /// Failure message, if any.
    pub error: Option<String>,

    /// Kind of the underlying failure, if any.
    pub error_kind: Option<ErrorKind>,

    /// Run time in milliseconds.
    pub duration_ms: u64,
}

impl AuditEvent for ActionAuditEvent {
    fn event_type(&self) -> &'static str {
        "action_executed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit event for a status cache refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRefreshAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Whether a new snapshot was installed.
    pub succeeded: bool,

    /// Number of entries in the cache afterwards.
    pub entries: usize,

    /// Refresh time in milliseconds.
    pub duration_ms: u64,

    /// Failure message, if any.
    pub error: Option<String>,
}

impl AuditEvent for CacheRefreshAuditEvent {
    fn event_type(&self) -> &'static str {
        "cache_refreshed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a decision.
pub fn emit_decision(params: &DecisionParams, candidate: StatusValue, decision: &Decision) {
    let event = DecisionAuditEvent::new(params, candidate, decision);
    tracing::info!(
        target: "gridstatus::audit",
        event_type = event.event_type(),
        element = %event.element,
        name = %event.name,
        status_type = %event.status_type,
        previous_status = %event.previous_status,
        candidate = %event.candidate,
        status = %event.status,
        reason = %event.reason,
        policies = ?event.policies,
        actions = ?event.actions,
        "Status decision made"
    );
}

/// Emits an audit event for an action run.
pub fn emit_action_outcome(params: &DecisionParams, outcome: &ActionOutcome) {
    let event = ActionAuditEvent {
        timestamp: Utc::now(),
        name: params.name.clone(),
        status_type: params.status_type.clone(),
        action: outcome.name.clone(),
        action_type: outcome.action_type.clone(),
        succeeded: outcome.succeeded(),
        error: outcome.error.clone(),
        error_kind: outcome.error_kind,
        duration_ms: outcome.duration.as_millis() as u64,
    };
    tracing::info!(
        target: "gridstatus::audit",
        event_type = event.event_type(),
        name = %event.name,
        status_type = %event.status_type,
        action = %event.action,
        action_type = %event.action_type,
        succeeded = event.succeeded,
        error = ?event.error,
        error_kind = ?event.error_kind,
        duration_ms = event.duration_ms,
        "Action executed"
    );
}

/// Emits an audit event for a cache refresh.
pub fn emit_cache_refresh(entries: usize, duration: Duration, error: Option<&str>) {
    let event = CacheRefreshAuditEvent {
        timestamp: Utc::now(),
        succeeded: error.is_none(),
        entries,
        duration_ms: duration.as_millis() as u64,
        error: error.map(str::to_string),
    };
    tracing::info!(
        target: "gridstatus::audit",
        event_type = event.event_type(),
        succeeded = event.succeeded,
        entries = event.entries,
        duration_ms = event.duration_ms,
        error = ?event.error,
        "Status cache refreshed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ElementFamily, EnforcementResult, PolicyActionRef, PolicyInfo, PolicyResult,
    };

    #[test]
    fn test_decision_event_from_decision() {
        let params = DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all")
            .with_status(StatusValue::Banned);
        let decision = Decision {
            enforcement: EnforcementResult::new(StatusValue::Probing, "Active by default")
                .with_actions(vec![PolicyActionRef::new("LogStatus", "LogStatusAction")]),
            single_results: vec![PolicyResult::new(
                StatusValue::Active,
                "Active by default",
                PolicyInfo::new("AA", "AlwaysActive", "fixed"),
            )],
        };

        let event = DecisionAuditEvent::new(&params, StatusValue::Active, &decision);
        assert_eq!(event.event_type(), "status_decision");
        assert_eq!(event.element, "Site");
        assert_eq!(event.previous_status, StatusValue::Banned);
        assert_eq!(event.candidate, StatusValue::Active);
        assert_eq!(event.status, StatusValue::Probing);
        assert_eq!(event.policies, vec!["AA".to_string()]);
        assert_eq!(event.actions, vec!["LogStatus".to_string()]);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "Probing");
    }
}
