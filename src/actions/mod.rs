//! Side-effecting handlers run by the enforcement point.
//!
//! Each action receives an [`ActionContext`] describing the decision and
//! holds the collaborators it needs:
//!
//! - [`LogStatusAction`] writes the new current status row
//! - [`LogPolicyResultAction`] appends the single policy results
//! - [`AlarmAction`] notifies assignee groups
//! - [`RealBanAction`] bans or re-admits the element in the operational mask

mod alarm;
mod log_policy_result;
mod log_status;
mod real_ban;
mod traits;

pub use alarm::{AlarmAction, NotificationMemo};
pub use log_policy_result::LogPolicyResultAction;
pub use log_status::{truncate_reason, LogStatusAction, ALL_VOS, MAX_REASON_LEN};
pub use real_ban::{RealBanAction, RealBanConfig};
pub use traits::{Action, ActionContext};

/// Type identifier of [`LogStatusAction`].
pub const LOG_STATUS_ACTION: &str = "LogStatusAction";
/// Type identifier of [`LogPolicyResultAction`].
pub const LOG_POLICY_RESULT_ACTION: &str = "LogPolicyResultAction";
/// Type identifier of [`AlarmAction`].
pub const ALARM_ACTION: &str = "AlarmAction";
/// Type identifier of [`RealBanAction`].
pub const REAL_BAN_ACTION: &str = "RealBanAction";
