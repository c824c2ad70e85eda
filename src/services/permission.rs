use crate::api::middleware::{ApiError, ApiResult};
use crate::models::{Role, User};

/// Pass-workflow capabilities that depend on who the caller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCapability {
    ApproveAsParent,
    ApproveAsWarden,
    Reject,
}

/// Single authorization check for pass actions. Every role- or
/// relationship-based rule lives here so the parent/warden/admin paths
/// cannot drift apart.
pub fn authorize(caller: &User, capability: PassCapability, owner: &User) -> ApiResult<()> {
    let permitted = match capability {
        PassCapability::ApproveAsParent => {
            caller.role == Role::Parent && owner.parent_id.as_deref() == Some(caller.id.as_str())
        }
        PassCapability::ApproveAsWarden => {
            matches!(caller.role, Role::Warden | Role::Admin)
        }
        PassCapability::Reject => match caller.role {
            Role::Warden | Role::Admin => true,
            Role::Parent => owner.parent_id.as_deref() == Some(caller.id.as_str()),
            _ => false,
        },
    };

    if permitted {
        Ok(())
    } else {
        Err(ApiError::Forbidden(match capability {
            PassCapability::ApproveAsParent => {
                "You are not the parent of this student".to_string()
            }
            PassCapability::ApproveAsWarden => {
                "Warden or admin role required".to_string()
            }
            PassCapability::Reject => {
                "Not permitted to reject this pass".to_string()
            }
        }))
    }
}
