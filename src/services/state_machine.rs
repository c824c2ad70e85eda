use crate::models::PassStatus;
use std::fmt;
use thiserror::Error;

/// An approval-flow action applied to a pass. Gate scans are not actions
/// here; they are handled by the scan processor against the scannable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassAction {
    ApproveParent,
    ApproveWarden,
    Reject,
}

impl fmt::Display for PassAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassAction::ApproveParent => write!(f, "approve_by_parent"),
            PassAction::ApproveWarden => write!(f, "approve_by_warden"),
            PassAction::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("cannot {action} a pass in status {from}")]
    InvalidTransition { from: PassStatus, action: PassAction },
}

impl From<TransitionError> for crate::api::middleware::ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { from, .. } => Self::InvalidState(from),
        }
    }
}

/// Resolves the status an action leads to, rejecting anything not in the
/// transition table.
pub fn apply(from: PassStatus, action: PassAction) -> Result<PassStatus, TransitionError> {
    use PassStatus::*;

    match (from, action) {
        (Pending, PassAction::ApproveParent) => Ok(ApprovedParent),

        (Pending, PassAction::ApproveWarden) => Ok(ApprovedWarden),
        (ApprovedParent, PassAction::ApproveWarden) => Ok(ApprovedWarden),

        (Pending, PassAction::Reject) => Ok(Rejected),
        (ApprovedParent, PassAction::Reject) => Ok(Rejected),

        // All other transitions are invalid
        _ => Err(TransitionError::InvalidTransition { from, action }),
    }
}
