//! Policy decision point: combines the applicable policies into one decision.

mod decision_point;

pub use decision_point::{PdpConfig, PolicyDecisionPoint, NO_APPLICABLE_POLICY};
