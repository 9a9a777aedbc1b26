//! Declarative configuration: which policies apply to which elements,
//! which actions follow which decisions, and who gets notified.
//!
//! The configuration store owns the format; this crate reads it as JSON.
//!
//! ```rust
//! use gridstatus::config::StatusConfig;
//!
//! let config = StatusConfig::from_json_str(r#"{
//!     "policies": [
//!         {"name": "SE_FreeSpace", "policyType": "FreeDiskSpace",
//!          "matchParams": {"elementType": "StorageElement", "statusType": ["ReadAccess", "WriteAccess"]}}
//!     ],
//!     "policyActions": [
//!         {"name": "LogStatus", "actionType": "LogStatusAction"}
//!     ]
//! }"#).unwrap();
//! assert_eq!(config.policies.len(), 1);
//! ```

use crate::core::{DecisionParams, ElementFamily, PolicyActionRef, StatusError, StatusValue};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

/// Accepts either a single value or a list of values.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

fn accepts<T: PartialEq>(allowed: &[T], value: &T) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

fn accepts_optional(allowed: &[String], value: Option<&String>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}

/// Match predicate over decision parameters.
///
/// An empty list matches anything. A non-empty list must contain the
/// parameter's value; a rule on an unset optional parameter never matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchParams {
    /// Element families.
    #[serde(deserialize_with = "one_or_many")]
    pub element: Vec<ElementFamily>,
    /// Element types.
    #[serde(deserialize_with = "one_or_many")]
    pub element_type: Vec<String>,
    /// Element names.
    #[serde(deserialize_with = "one_or_many")]
    pub name: Vec<String>,
    /// Domains.
    #[serde(deserialize_with = "one_or_many")]
    pub domain: Vec<String>,
    /// Status types.
    #[serde(deserialize_with = "one_or_many")]
    pub status_type: Vec<String>,
    /// Virtual organisations.
    #[serde(deserialize_with = "one_or_many")]
    pub vo: Vec<String>,
}

impl MatchParams {
    /// Creates a predicate matching everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts to an element family.
    pub fn with_element(mut self, element: ElementFamily) -> Self {
        self.element.push(element);
        self
    }

    /// Restricts to an element type.
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type.push(element_type.into());
        self
    }

    /// Restricts to an element name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name.push(name.into());
        self
    }

    /// Restricts to a domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain.push(domain.into());
        self
    }

    /// Restricts to a status type.
    pub fn with_status_type(mut self, status_type: impl Into<String>) -> Self {
        self.status_type.push(status_type.into());
        self
    }

    /// Restricts to a VO.
    pub fn with_vo(mut self, vo: impl Into<String>) -> Self {
        self.vo.push(vo.into());
        self
    }

    /// Returns `true` if `params` satisfies every restriction.
    pub fn matches(&self, params: &DecisionParams) -> bool {
        let element_ok = self.element.is_empty()
            || params
                .element
                .is_some_and(|element| self.element.contains(&element));

        element_ok
            && accepts(&self.element_type, &params.element_type)
            && accepts(&self.name, &params.name)
            && accepts(&self.status_type, &params.status_type)
            && accepts_optional(&self.domain, params.domain.as_ref())
            && accepts_optional(&self.vo, params.vo.as_ref())
    }
}

/// A configured policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDeclaration {
    /// Policy name, unique within the configuration.
    pub name: String,
    /// Registered policy type.
    pub policy_type: String,
    /// Which elements the policy applies to.
    #[serde(default)]
    pub match_params: MatchParams,
    /// Command arguments overriding the policy type's defaults.
    #[serde(default)]
    pub args: Value,
}

impl PolicyDeclaration {
    /// Creates a declaration matching every element.
    pub fn new(name: impl Into<String>, policy_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy_type: policy_type.into(),
            match_params: MatchParams::any(),
            args: Value::Null,
        }
    }

    /// Sets the match predicate.
    pub fn with_match(mut self, match_params: MatchParams) -> Self {
        self.match_params = match_params;
        self
    }

    /// Sets the command arguments.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// A configured action, selected by the resulting status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyActionDeclaration {
    /// Action name.
    pub name: String,
    /// Registered action type.
    pub action_type: String,
    /// Resulting statuses this action runs for. Empty means all.
    #[serde(default, deserialize_with = "one_or_many")]
    pub status: Vec<StatusValue>,
    /// Which elements the action applies to.
    #[serde(default)]
    pub match_params: MatchParams,
}

impl PolicyActionDeclaration {
    /// Creates a declaration running for every status and element.
    pub fn new(name: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_type: action_type.into(),
            status: Vec::new(),
            match_params: MatchParams::any(),
        }
    }

    /// Restricts to a resulting status.
    pub fn for_status(mut self, status: StatusValue) -> Self {
        self.status.push(status);
        self
    }

    /// Sets the match predicate.
    pub fn with_match(mut self, match_params: MatchParams) -> Self {
        self.match_params = match_params;
        self
    }

    /// Returns `true` if this action runs for `params` ending in `status`.
    pub fn applies_to(&self, params: &DecisionParams, status: StatusValue) -> bool {
        accepts(&self.status, &status) && self.match_params.matches(params)
    }
}

/// Where a group wants to be told about status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationChannel {
    /// In-app notification.
    Web,
    /// Email.
    Mail,
}

/// A group of people responsible for some elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeGroup {
    /// Group name.
    pub name: String,
    /// Members (user names or addresses).
    #[serde(deserialize_with = "one_or_many")]
    pub users: Vec<String>,
    /// Notification channels.
    #[serde(default, deserialize_with = "one_or_many")]
    pub notifications: Vec<NotificationChannel>,
    /// Which elements the group is responsible for.
    #[serde(default)]
    pub match_params: MatchParams,
}

impl AssigneeGroup {
    /// Creates a group responsible for every element.
    pub fn new(name: impl Into<String>, users: Vec<String>) -> Self {
        Self {
            name: name.into(),
            users,
            notifications: Vec::new(),
            match_params: MatchParams::any(),
        }
    }

    /// Adds a channel.
    pub fn with_channel(mut self, channel: NotificationChannel) -> Self {
        self.notifications.push(channel);
        self
    }

    /// Sets the match predicate.
    pub fn with_match(mut self, match_params: MatchParams) -> Self {
        self.match_params = match_params;
        self
    }

    /// Returns `true` if the group wants the given channel.
    pub fn wants(&self, channel: NotificationChannel) -> bool {
        self.notifications.contains(&channel)
    }
}

/// The full declarative configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusConfig {
    /// Policy declarations, in configuration order.
    pub policies: Vec<PolicyDeclaration>,
    /// Action declarations, in configuration order.
    pub policy_actions: Vec<PolicyActionDeclaration>,
    /// Notification groups.
    pub assignee_groups: Vec<AssigneeGroup>,
}

impl StatusConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, StatusError> {
        serde_json::from_str(json)
            .map_err(|e| StatusError::configuration(format!("invalid configuration: {e}")))
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StatusError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StatusError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Adds a policy declaration.
    pub fn with_policy(mut self, policy: PolicyDeclaration) -> Self {
        self.policies.push(policy);
        self
    }

    /// Adds an action declaration.
    pub fn with_action(mut self, action: PolicyActionDeclaration) -> Self {
        self.policy_actions.push(action);
        self
    }

    /// Adds an assignee group.
    pub fn with_assignee_group(mut self, group: AssigneeGroup) -> Self {
        self.assignee_groups.push(group);
        self
    }

    /// Returns the policies applying to `params`, in configuration order.
    pub fn policies_for<'a>(
        &'a self,
        params: &'a DecisionParams,
    ) -> impl Iterator<Item = &'a PolicyDeclaration> + 'a {
        self.policies
            .iter()
            .filter(move |policy| policy.match_params.matches(params))
    }

    /// Returns the actions to run for `params` ending in `status`.
    pub fn actions_for(&self, params: &DecisionParams, status: StatusValue) -> Vec<PolicyActionRef> {
        self.policy_actions
            .iter()
            .filter(|action| action.applies_to(params, status))
            .map(|action| PolicyActionRef::new(&action.name, &action.action_type))
            .collect()
    }

    /// Returns the groups responsible for `params`.
    pub fn assignee_groups_for<'a>(
        &'a self,
        params: &'a DecisionParams,
    ) -> impl Iterator<Item = &'a AssigneeGroup> + 'a {
        self.assignee_groups
            .iter()
            .filter(move |group| group.match_params.matches(params))
    }

    /// Checks names are unique per section.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::Configuration` naming the first duplicate.
    pub fn validate(&self) -> Result<(), StatusError> {
        unique_names("policy", self.policies.iter().map(|p| p.name.as_str()))?;
        unique_names(
            "policy action",
            self.policy_actions.iter().map(|a| a.name.as_str()),
        )?;
        unique_names(
            "assignee group",
            self.assignee_groups.iter().map(|g| g.name.as_str()),
        )
    }
}

fn unique_names<'a>(
    section: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), StatusError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(StatusError::configuration(format!(
                "{section} '{name}' is declared twice"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_params() -> DecisionParams {
        DecisionParams::new(ElementFamily::Resource, "CERN-DISK", "StorageElement", "ReadAccess")
            .with_domain("EGI")
    }

    #[test]
    fn test_match_params() {
        let params = storage_params();
        assert!(MatchParams::any().matches(&params));
        assert!(MatchParams::any()
            .with_element(ElementFamily::Resource)
            .with_element_type("StorageElement")
            .with_status_type("ReadAccess")
            .with_status_type("WriteAccess")
            .matches(&params));
        assert!(!MatchParams::any().with_element(ElementFamily::Site).matches(&params));
        assert!(MatchParams::any().with_domain("EGI").matches(&params));
        assert!(!MatchParams::any().with_domain("OSG").matches(&params));
        // vo is unset on the params, so a vo restriction cannot match.
        assert!(!MatchParams::any().with_vo("lhcb").matches(&params));
    }

    #[test]
    fn test_from_json() {
        let config = StatusConfig::from_json_str(
            r#"{
                "policies": [
                    {"name": "SE_Space", "policyType": "FreeDiskSpace",
                     "matchParams": {"element": "Resource", "statusType": ["ReadAccess"]},
                     "args": {"unit": "GB"}},
                    {"name": "Site_Downtime", "policyType": "Downtime",
                     "matchParams": {"element": ["Site"]}}
                ],
                "policyActions": [
                    {"name": "BannedMail", "actionType": "AlarmAction", "status": "Banned"},
                    {"name": "LogStatus", "actionType": "LogStatusAction"}
                ],
                "assigneeGroups": [
                    {"name": "shifters", "users": "shifter@example.org", "notifications": ["Mail", "Web"]}
                ]
            }"#,
        )
        .unwrap();

        let params = storage_params();
        let names: Vec<&str> = config.policies_for(&params).map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["SE_Space"]);

        let banned = config.actions_for(&params, StatusValue::Banned);
        assert_eq!(
            banned,
            vec![
                PolicyActionRef::new("BannedMail", "AlarmAction"),
                PolicyActionRef::new("LogStatus", "LogStatusAction"),
            ]
        );
        let active = config.actions_for(&params, StatusValue::Active);
        assert_eq!(active, vec![PolicyActionRef::new("LogStatus", "LogStatusAction")]);

        let group = config.assignee_groups_for(&params).next().unwrap();
        assert_eq!(group.users, vec!["shifter@example.org".to_string()]);
        assert!(group.wants(NotificationChannel::Mail));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let err = StatusConfig::from_json_str(r#"{"policies": [{"name": 1}]}"#).unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Configuration);

        let err = StatusConfig::from_json_str(
            r#"{"policyActions": [{"name": "x", "actionType": "y", "status": "Sleeping"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Configuration);
    }

    #[test]
    fn test_duplicate_policy_names() {
        let config = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("p", "AlwaysActive"))
            .with_policy(PolicyDeclaration::new("p", "AlwaysBanned"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_action_and_group_names() {
        let actions = StatusConfig::new()
            .with_action(PolicyActionDeclaration::new("Log", "LogStatusAction"))
            .with_action(PolicyActionDeclaration::new("Log", "LogPolicyResultAction"));
        let err = actions.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: policy action 'Log' is declared twice"
        );

        let groups = StatusConfig::new()
            .with_assignee_group(AssigneeGroup::new("ops", vec!["a@example.org".to_string()]))
            .with_assignee_group(AssigneeGroup::new("ops", vec!["b@example.org".to_string()]));
        assert!(matches!(
            groups.validate(),
            Err(StatusError::Configuration { .. })
        ));

        let distinct = StatusConfig::new()
            .with_policy(PolicyDeclaration::new("ops", "AlwaysActive"))
            .with_action(PolicyActionDeclaration::new("ops", "LogStatusAction"))
            .with_assignee_group(AssigneeGroup::new("ops", vec!["a@example.org".to_string()]));
        assert!(distinct.validate().is_ok());
    }
}
