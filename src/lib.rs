//! # Gridstatus
//!
//! Policy-driven status decisions for grid resources: sites, compute and
//! storage elements, nodes and service components.
//!
//! ## Overview
//!
//! Gridstatus drives each element between degrees of usability so that a
//! scheduler can avoid failing resources. It lets you:
//!
//! - Evaluate monitoring signals against fixed threshold policies
//! - Combine several policy results by severity, with ban hysteresis
//! - Dispatch configured actions (log status, notify, ban in the mask)
//! - Serve the last decisions from a cache refreshed in the background
//! - Emit structured audit logs for every decision and action
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gridstatus::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(StatusConfig::from_json_file("status.json")?);
//!     let commands = Arc::new(StaticCommandSource::new());
//!     let pdp = PolicyDecisionPoint::new(config.clone(), PolicyRegistry::builtin(), commands)?;
//!
//!     let params = DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all");
//!     let decision = pdp.decide(&params).await?;
//!     println!("{}: {}", decision.enforcement.status, decision.enforcement.reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes tokio runtime support
//! - `tokio-runtime` - Background cache refresh via tokio
//!
//! ## Architecture
//!
//! - **Core**: Status values, decision parameters, results and errors
//! - **State machine**: Severity ranking and transition guard
//! - **Policy**: Single-signal evaluators and their registry
//! - **PDP**: Combination of the applicable policies into one decision
//! - **PEP**: Dispatch of the configured actions
//! - **Actions**: Status logging, notifications and real bans
//! - **Cache**: Refreshed read-through cache of decisions
//! - **Audit**: Structured logging of decisions and actions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod actions;
pub mod audit;
pub mod cache;
pub mod command;
pub mod config;
pub mod core;
pub mod notify;
pub mod pdp;
pub mod pep;
pub mod policy;
pub mod state_machine;
pub mod store;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Decision, DecisionParams, ElementFamily, ElementKey, EnforcementResult, ErrorKind,
    PolicyActionRef, PolicyInfo, PolicyResult, StatusError, StatusResult, StatusValue,
    StoreError, StoreResult,
};

pub use crate::cache::{CacheConfig, StatusCache};
pub use crate::config::StatusConfig;
pub use crate::pdp::PolicyDecisionPoint;
pub use crate::pep::{PolicyEnforcementPoint, StatusPipeline};
pub use crate::state_machine::ResourceStatusMachine;

/// Prelude module for convenient imports.
///
/// ```rust
/// use gridstatus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::actions::{Action, ActionContext, RealBanConfig};
    pub use crate::cache::{CacheConfig, CacheRefresher, DecisionRefresher, StatusCache};
    pub use crate::command::{CommandSource, StaticCommandSource};
    pub use crate::config::{
        AssigneeGroup, MatchParams, NotificationChannel, PolicyActionDeclaration,
        PolicyDeclaration, StatusConfig,
    };
    pub use crate::core::{
        Decision, DecisionParams, ElementFamily, ElementKey, EnforcementResult, PolicyResult,
        StatusError, StatusValue,
    };
    pub use crate::notify::{MaskController, Notifier};
    pub use crate::pdp::{PdpConfig, PolicyDecisionPoint};
    pub use crate::pep::{ActionRegistry, PolicyEnforcementPoint, StatusPipeline};
    pub use crate::policy::{Policy, PolicyRegistry};
    pub use crate::state_machine::ResourceStatusMachine;
    pub use crate::store::{InMemoryStatusStore, StatusStore};
}
