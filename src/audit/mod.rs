//! Structured audit logging of decisions, actions and cache refreshes.
//!
//! Events are emitted through `tracing` under the `gridstatus::audit`
//! target, so a subscriber can route them to a separate sink (JSON file,
//! OpenTelemetry, etc.).

mod events;

pub use events::{
    emit_action_outcome, emit_cache_refresh, emit_decision, ActionAuditEvent, AuditEvent,
    CacheRefreshAuditEvent, DecisionAuditEvent,
};
