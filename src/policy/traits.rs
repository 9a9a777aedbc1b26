//! The `Policy` trait.

use crate::core::{DecisionParams, StatusError};
use crate::policy::signal::{Signal, Verdict};

use std::fmt::Debug;

/// A stateless evaluator turning one external signal into a proposed status.
///
/// Policies never perform I/O: the signal has already been fetched by the
/// policy's command. They must be pure functions of their inputs.
///
/// # Example Implementation
///
/// ```rust
/// use gridstatus::policy::{Policy, Signal, Verdict};
/// use gridstatus::{DecisionParams, StatusError, StatusValue};
///
/// #[derive(Debug)]
/// struct KeepCurrent;
///
/// impl Policy for KeepCurrent {
///     fn evaluate(&self, params: &DecisionParams, _signal: &Signal) -> Result<Verdict, StatusError> {
///         Ok(Verdict::new(params.status, "Status unchanged"))
///     }
/// }
/// ```
pub trait Policy: Send + Sync + Debug {
    /// Proposes a status for the element described by `params`.
    ///
    /// Signal problems (failed command, missing keys, small samples) are
    /// reported as `Error`/`Unknown` verdicts. An `Err` is reserved for
    /// failures of the policy itself; the decision point turns it into an
    /// `Error` result so other policies are unaffected.
    fn evaluate(&self, params: &DecisionParams, signal: &Signal) -> Result<Verdict, StatusError>;
}
