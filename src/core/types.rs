//! Core types used throughout the gridstatus library.
//!
//! This module defines the status vocabulary shared by every layer:
//! the six status values, the element families and the per-evaluation
//! decision parameters.

use crate::core::error::StatusError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The status of an element on one of its health axes.
///
/// Declaration order is severity order: `Error` is the most severe value and
/// `Unknown` the least. [`StatusValue::rank`] exposes the fixed ranks and the
/// derived `Ord` agrees with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusValue {
    /// The status could not be computed because something failed.
    Error,
    /// The element must not receive work.
    Banned,
    /// The element left `Banned` and is being watched before re-admission.
    Probing,
    /// The element works, but poorly.
    Degraded,
    /// The element is healthy.
    Active,
    /// There is not enough information to decide.
    Unknown,
}

impl StatusValue {
    /// All status values, most severe first.
    pub const ALL: [StatusValue; 6] = [
        Self::Error,
        Self::Banned,
        Self::Probing,
        Self::Degraded,
        Self::Active,
        Self::Unknown,
    ];

    /// Returns the severity rank. Lower numbers are more severe.
    pub fn rank(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Banned => 1,
            Self::Probing => 2,
            Self::Degraded => 3,
            Self::Active => 4,
            Self::Unknown => 5,
        }
    }

    /// Returns the wire literal of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Banned => "Banned",
            Self::Probing => "Probing",
            Self::Degraded => "Degraded",
            Self::Active => "Active",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns `true` if this status keeps work away from the element.
    pub fn is_unusable(self) -> bool {
        matches!(self, Self::Banned | Self::Error)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusValue {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError::UnknownStatus {
                value: s.to_string(),
            })
    }
}

/// The family an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFamily {
    /// A grid site.
    Site,
    /// A compute or storage resource.
    Resource,
    /// A single node (e.g. a queue or a host).
    Node,
    /// A service component.
    Component,
}

impl ElementFamily {
    /// Returns the literal name of the family.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Site => "Site",
            Self::Resource => "Resource",
            Self::Node => "Node",
            Self::Component => "Component",
        }
    }
}

impl fmt::Display for ElementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementFamily {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Site" => Ok(Self::Site),
            "Resource" => Ok(Self::Resource),
            "Node" => Ok(Self::Node),
            "Component" => Ok(Self::Component),
            other => Err(StatusError::UnknownElementFamily {
                value: other.to_string(),
            }),
        }
    }
}

/// Identifies one health axis of one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementKey {
    /// Element family.
    pub element: ElementFamily,
    /// Element name (e.g. `"CERN-PROD"`).
    pub name: String,
    /// Health axis (e.g. `"ReadAccess"`).
    pub status_type: String,
}

impl ElementKey {
    /// Creates a new key.
    pub fn new(
        element: ElementFamily,
        name: impl Into<String>,
        status_type: impl Into<String>,
    ) -> Self {
        Self {
            element,
            name: name.into(),
            status_type: status_type.into(),
        }
    }

    /// Returns the cache key form `name#statusType`.
    pub fn cache_key(&self) -> String {
        cache_key(&self.name, &self.status_type)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.element, self.name, self.status_type)
    }
}

/// Builds the `name#statusType` key used by the status cache.
pub fn cache_key(name: &str, status_type: &str) -> String {
    format!("{name}#{status_type}")
}

/// The input to one policy decision.
///
/// Built by the driver once per evaluation cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionParams {
    /// Element family.
    pub element: Option<ElementFamily>,
    /// Element name.
    pub name: String,
    /// Element type within the family (e.g. `"StorageElement"`).
    pub element_type: String,
    /// Health axis being decided.
    pub status_type: String,
    /// Currently persisted status.
    pub status: StatusValue,
    /// Currently persisted reason.
    pub reason: String,
    /// Optional domain the element belongs to.
    pub domain: Option<String>,
    /// Owner of the status token, if any.
    pub token_owner: Option<String>,
    /// Virtual organisation the decision is for; `"all"` means VO-agnostic.
    pub vo: Option<String>,
}

impl DecisionParams {
    /// Creates decision parameters for an element with an `Unknown` current status.
    pub fn new(
        element: ElementFamily,
        name: impl Into<String>,
        element_type: impl Into<String>,
        status_type: impl Into<String>,
    ) -> Self {
        Self {
            element: Some(element),
            name: name.into(),
            element_type: element_type.into(),
            status_type: status_type.into(),
            status: StatusValue::Unknown,
            reason: String::new(),
            domain: None,
            token_owner: None,
            vo: None,
        }
    }

    /// Sets the current status.
    pub fn with_status(mut self, status: StatusValue) -> Self {
        self.status = status;
        self
    }

    /// Sets the current reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the token owner.
    pub fn with_token_owner(mut self, owner: impl Into<String>) -> Self {
        self.token_owner = Some(owner.into());
        self
    }

    /// Sets the VO.
    pub fn with_vo(mut self, vo: impl Into<String>) -> Self {
        self.vo = Some(vo.into());
        self
    }

    /// Checks that the identifying fields are set.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::InvalidParams` naming the first missing field.
    pub fn validate(&self) -> Result<(), StatusError> {
        if self.element.is_none() {
            return Err(StatusError::invalid_params("element"));
        }
        if self.name.trim().is_empty() {
            return Err(StatusError::invalid_params("name"));
        }
        if self.status_type.trim().is_empty() {
            return Err(StatusError::invalid_params("statusType"));
        }
        Ok(())
    }

    /// Returns the element key, if the parameters are complete.
    pub fn key(&self) -> Result<ElementKey, StatusError> {
        self.validate()?;
        let element = self
            .element
            .ok_or_else(|| StatusError::invalid_params("element"))?;
        Ok(ElementKey::new(element, &self.name, &self.status_type))
    }

    /// Returns the `name#statusType` cache key.
    pub fn cache_key(&self) -> String {
        cache_key(&self.name, &self.status_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rank_matches_declaration_order() {
        for pair in StatusValue::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(StatusValue::Error.rank(), 0);
        assert_eq!(StatusValue::Unknown.rank(), 5);
    }

    #[test]
    fn test_status_wire_literals() {
        for status in StatusValue::ALL {
            assert_eq!(status.as_str().parse::<StatusValue>().unwrap(), status);
        }
        let err = "Paused".parse::<StatusValue>().unwrap_err();
        assert!(matches!(err, StatusError::UnknownStatus { ref value } if value == "Paused"));

        let json = serde_json::to_string(&StatusValue::Probing).unwrap();
        assert_eq!(json, "\"Probing\"");
        assert!(serde_json::from_str::<StatusValue>("\"probing\"").is_err());
    }

    #[test]
    fn test_decision_params_validation() {
        let params = DecisionParams::new(ElementFamily::Resource, "SE1", "StorageElement", "ReadAccess");
        assert!(params.validate().is_ok());
        assert_eq!(params.cache_key(), "SE1#ReadAccess");

        let mut missing_name = params.clone();
        missing_name.name = String::new();
        assert!(matches!(
            missing_name.validate(),
            Err(StatusError::InvalidParams { field }) if field == "name"
        ));

        let mut missing_element = params.clone();
        missing_element.element = None;
        assert!(missing_element.key().is_err());

        let mut missing_type = params;
        missing_type.status_type = " ".into();
        assert!(matches!(
            missing_type.validate(),
            Err(StatusError::InvalidParams { field }) if field == "statusType"
        ));
    }

    #[test]
    fn test_element_family_parse() {
        assert_eq!("Site".parse::<ElementFamily>().unwrap(), ElementFamily::Site);
        assert!("Cluster".parse::<ElementFamily>().is_err());
    }
}
