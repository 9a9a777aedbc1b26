//! Rows of the status, history and policy result tables.

use crate::core::{ElementFamily, PolicyResult, StatusValue};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token owner written on rows the system itself maintains.
pub const SYSTEM_TOKEN_OWNER: &str = "rs_svc";

/// How long a system-owned token stays valid.
pub fn system_token_lifetime() -> Duration {
    Duration::hours(24)
}

/// The current status of one element on one health axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Element family.
    pub element: ElementFamily,
    /// Element name.
    pub name: String,
    /// Health axis.
    pub status_type: String,
    /// Current status.
    pub status: StatusValue,
    /// Reason for the current status.
    pub reason: String,
    /// Element type within the family.
    pub element_type: String,
    /// Virtual organisation, if the row is VO-specific.
    pub vo: Option<String>,
    /// When the current status was first set.
    pub date_effective: DateTime<Utc>,
    /// When the status was last confirmed.
    pub last_check_time: DateTime<Utc>,
    /// Who holds the status token.
    pub token_owner: String,
    /// When the token expires.
    pub token_expiration: DateTime<Utc>,
}

impl StatusRecord {
    /// Creates a system-owned row stamped now.
    pub fn new(
        element: ElementFamily,
        name: impl Into<String>,
        status_type: impl Into<String>,
        status: StatusValue,
        reason: impl Into<String>,
        element_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            element,
            name: name.into(),
            status_type: status_type.into(),
            status,
            reason: reason.into(),
            element_type: element_type.into(),
            vo: None,
            date_effective: now,
            last_check_time: now,
            token_owner: SYSTEM_TOKEN_OWNER.to_string(),
            token_expiration: now + system_token_lifetime(),
        }
    }

    /// Sets the VO.
    pub fn with_vo(mut self, vo: impl Into<String>) -> Self {
        self.vo = Some(vo.into());
        self
    }

    /// Sets the token owner.
    pub fn with_token_owner(mut self, owner: impl Into<String>) -> Self {
        self.token_owner = owner.into();
        self
    }

    /// Returns `true` if `other` describes the same element, axis and VO.
    pub fn same_key(&self, other: &StatusRecord) -> bool {
        self.element == other.element
            && self.name == other.name
            && self.status_type == other.status_type
            && self.vo == other.vo
    }
}

/// A past status of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// The row as it was written.
    pub record: StatusRecord,
    /// When the row was archived.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Archives `record` now.
    pub fn new(record: StatusRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            recorded_at: Utc::now(),
        }
    }
}

/// The audit row of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResultRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Element family.
    pub element: ElementFamily,
    /// Element name.
    pub name: String,
    /// Health axis.
    pub status_type: String,
    /// Configured policy name.
    pub policy_name: String,
    /// Policy type identifier.
    pub policy_type: String,
    /// Proposed status.
    pub status: StatusValue,
    /// Reason for the proposal.
    pub reason: String,
    /// Virtual organisation, if any.
    pub vo: Option<String>,
    /// When the policy ran.
    pub recorded_at: DateTime<Utc>,
}

impl PolicyResultRecord {
    /// Creates the audit row for `result`.
    pub fn from_result(
        element: ElementFamily,
        name: impl Into<String>,
        status_type: impl Into<String>,
        vo: Option<String>,
        result: &PolicyResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            element,
            name: name.into(),
            status_type: status_type.into(),
            policy_name: result.policy.name.clone(),
            policy_type: result.policy.policy_type.clone(),
            status: result.status,
            reason: result.reason.clone(),
            vo,
            recorded_at: Utc::now(),
        }
    }
}

/// Filter for selecting and deleting rows.
///
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFilter {
    /// Filter by element family.
    pub element: Option<ElementFamily>,
    /// Filter by element name.
    pub name: Option<String>,
    /// Filter by health axis.
    pub status_type: Option<String>,
    /// Filter by status.
    pub status: Option<StatusValue>,
    /// Filter by VO.
    pub vo: Option<String>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl StatusFilter {
    /// Creates a filter matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by element family.
    pub fn with_element(mut self, element: ElementFamily) -> Self {
        self.element = Some(element);
        self
    }

    /// Filters by element name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filters by health axis.
    pub fn with_status_type(mut self, status_type: impl Into<String>) -> Self {
        self.status_type = Some(status_type.into());
        self
    }

    /// Filters by status.
    pub fn with_status(mut self, status: StatusValue) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by VO.
    pub fn with_vo(mut self, vo: impl Into<String>) -> Self {
        self.vo = Some(vo.into());
        self
    }

    /// Limits the number of rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the status row matches.
    pub fn matches(&self, record: &StatusRecord) -> bool {
        self.element.map_or(true, |e| e == record.element)
            && self.name.as_ref().map_or(true, |n| *n == record.name)
            && self
                .status_type
                .as_ref()
                .map_or(true, |t| *t == record.status_type)
            && self.status.map_or(true, |s| s == record.status)
            && self
                .vo
                .as_ref()
                .map_or(true, |vo| record.vo.as_ref() == Some(vo))
    }

    /// Returns `true` if the policy result row matches.
    pub fn matches_policy_result(&self, record: &PolicyResultRecord) -> bool {
        self.element.map_or(true, |e| e == record.element)
            && self.name.as_ref().map_or(true, |n| *n == record.name)
            && self
                .status_type
                .as_ref()
                .map_or(true, |t| *t == record.status_type)
            && self.status.map_or(true, |s| s == record.status)
            && self
                .vo
                .as_ref()
                .map_or(true, |vo| record.vo.as_ref() == Some(vo))
    }
}
