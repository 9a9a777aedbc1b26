//! Policy enforcement point: runs the actions chosen by a decision.
//!
//! Action types are resolved through an [`ActionRegistry`] validated when
//! the [`PolicyEnforcementPoint`] is built. [`StatusPipeline`] chains the
//! decision point and the enforcement point for one element.

mod enforcement;
mod pipeline;
mod registry;

pub use enforcement::{ActionOutcome, EnforcementReport, PolicyEnforcementPoint};
pub use pipeline::{PipelineOutcome, StatusPipeline};
pub use registry::ActionRegistry;
