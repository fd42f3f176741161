//! Registration state machine: the permitted status edges, the admin actions that
//! drive them and the clock that stamps each change.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::access::AdminRole;

use super::domain::RegistrationStatus;

/// Minimum role for status transitions and category corrections.
pub const REVIEWER_ROLE: AdminRole = AdminRole::LocalAdmin;

/// Admin actions that move a registration between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
    Reopen,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::Reopen => "reopen",
        }
    }

    pub const fn target(self) -> RegistrationStatus {
        match self {
            ReviewAction::Approve => RegistrationStatus::Approved,
            ReviewAction::Reject => RegistrationStatus::Rejected,
            ReviewAction::Reopen => RegistrationStatus::Pending,
        }
    }

    /// Reopening must carry a reason so reversals stay explainable.
    pub const fn requires_reason(self) -> bool {
        matches!(self, ReviewAction::Reopen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a registration from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RegistrationStatus,
    pub to: RegistrationStatus,
}

/// Pending fans out to approved or rejected; both return only to pending.
pub const fn is_permitted(from: RegistrationStatus, to: RegistrationStatus) -> bool {
    use self::RegistrationStatus::{Approved, Pending, Rejected};
    matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Approved, Pending) | (Rejected, Pending)
    )
}

pub fn transition(
    from: RegistrationStatus,
    action: ReviewAction,
) -> Result<RegistrationStatus, InvalidTransition> {
    let to = action.target();
    if is_permitted(from, to) {
        Ok(to)
    } else {
        Err(InvalidTransition { from, to })
    }
}

/// Next `updated_at`: the clock reading, bumped past `previous` when the clock has
/// not advanced.
pub fn next_update_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::microseconds(1);
    if now >= floor {
        now
    } else {
        floor
    }
}

/// Time source for `created_at` / `updated_at`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
