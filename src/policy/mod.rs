//! Policies: single-signal evaluators.
//!
//! A policy turns the signal of one external command into a proposed status
//! and reason for one element. Threshold policies share a fixed contract:
//!
//! - a failed command yields `Error` with the failure message;
//! - an empty signal yields `Unknown` / `"No values to take a decision"`;
//! - a missing key yields `Error` / `"Key <K> missing"`;
//! - a too-small sample yields `Unknown` / `"Not enough <items> to take a decision"`;
//! - otherwise the metric is mapped through a fixed threshold table.

mod downtime;
mod fixed;
mod ratio;
mod registry;
mod signal;
mod space;
mod thresholds;
mod traits;

pub use downtime::DowntimePolicy;
pub use fixed::FixedStatusPolicy;
pub use ratio::RatioPolicy;
pub use registry::{PolicyMeta, PolicyRegistry};
pub use signal::{number, optional_sample, sample, text, Signal, Verdict, NO_VALUES};
pub use space::{FreeSpacePolicy, FreeSpaceRatioPolicy};
pub use thresholds::{Bound, ThresholdTable};
pub use traits::Policy;
