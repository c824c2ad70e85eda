use crate::api::middleware::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{CreatePassRequest, Pass, PassResponse, PassStatus, Role, User};
use crate::services::notifier::{dispatch, Notification, Notifier, NotifyTarget};
use crate::services::permission::{self, PassCapability};
use crate::services::state_machine::{self, PassAction};
use serde_json::json;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Pass type routed through parent approval.
const OUTING_PASS_TYPE: &str = "outing";

/// History cap for the warden dashboard.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Owns the pass state machine: creation, multi-party approval and
/// rejection. Gate-side mutations live in [`crate::services::ScanService`].
#[derive(Clone)]
pub struct PassService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl PassService {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Opaque scan token, 32 hex characters. Uniqueness is backed by the
    /// unique index on passes.barcode.
    fn generate_barcode() -> String {
        use rand::Rng;
        let bytes: [u8; 16] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Direct device delivery when the student registered a token, topic
    /// fallback otherwise.
    fn student_target(owner: &User) -> NotifyTarget {
        match &owner.device_token {
            Some(token) => NotifyTarget::Device(token.clone()),
            None => NotifyTarget::User(owner.id.clone()),
        }
    }

    pub async fn create_pass(&self, request: CreatePassRequest) -> ApiResult<PassResponse> {
        let user_id = trimmed(&request.user_id);
        let pass_type = trimmed(&request.pass_type);
        let valid_from_raw = trimmed(&request.valid_from);
        let valid_to_raw = trimmed(&request.valid_to);

        let (user_id, pass_type, valid_from_raw, valid_to_raw) =
            match (user_id, pass_type, valid_from_raw, valid_to_raw) {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => {
                    return Err(ApiError::Validation(
                        "user_id, type, valid_from and valid_to are required".to_string(),
                    ))
                }
            };

        let valid_from = OffsetDateTime::parse(valid_from_raw, &Rfc3339).map_err(|_| {
            ApiError::Validation("valid_from must be an RFC3339 timestamp".to_string())
        })?;
        let valid_to = OffsetDateTime::parse(valid_to_raw, &Rfc3339).map_err(|_| {
            ApiError::Validation("valid_to must be an RFC3339 timestamp".to_string())
        })?;

        if valid_from > valid_to {
            return Err(ApiError::Validation(
                "valid_from must not be after valid_to".to_string(),
            ));
        }

        let owner = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        // Passes requested by staff roles skip the approval chain.
        let status = if owner.role == Role::Student {
            PassStatus::Pending
        } else {
            PassStatus::Active
        };

        let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
        let pass = Pass {
            id: Uuid::new_v4().to_string(),
            user_id: owner.id.clone(),
            pass_type: pass_type.to_string(),
            purpose: request
                .purpose
                .clone()
                .filter(|p| !p.trim().is_empty()),
            valid_from: valid_from.format(&Rfc3339).unwrap(),
            valid_to: valid_to.format(&Rfc3339).unwrap(),
            barcode: Self::generate_barcode(),
            status,
            rejection_reason: None,
            exit_time: None,
            entry_time: None,
            created_at: now.clone(),
            updated_at: now,
            version: 0,
        };

        self.db.create_pass(&pass).await?;

        tracing::info!(
            "Pass created: id={}, owner={}, status={}",
            pass.id,
            pass.user_id,
            pass.status
        );

        let notification = Notification::new(
            "New Pass Request",
            format!("{} has requested a new {} pass.", owner.name, pass.pass_type),
        );
        let data = json!({
            "type": "pass_request",
            "pass_id": pass.id,
            "student_id": pass.user_id,
        });

        if let Some(parent_id) = &owner.parent_id {
            dispatch(
                &self.notifier,
                NotifyTarget::Parent(parent_id.clone()),
                notification.clone(),
                data.clone(),
            );
        }
        dispatch(&self.notifier, NotifyTarget::WardenAlerts, notification, data);

        Ok(PassResponse::new(pass, Some(owner.name)))
    }

    pub async fn get_pass(&self, pass_id: &str) -> ApiResult<PassResponse> {
        let pass = self
            .db
            .get_pass_by_id(pass_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
        let student_name = self.db.get_user_by_id(&pass.user_id).await?.map(|u| u.name);
        Ok(PassResponse::new(pass, student_name))
    }

    pub async fn approve_by_parent(&self, pass_id: &str, caller_id: &str) -> ApiResult<PassResponse> {
        let pass = self
            .db
            .get_pass_by_id(pass_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
        let owner = self
            .db
            .get_user_by_id(&pass.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass owner not found".to_string()))?;
        let caller = self
            .db
            .get_user_by_id(caller_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Caller not found".to_string()))?;

        // Relationship check comes first: a non-parent is rejected the same
        // way regardless of the pass status.
        permission::authorize(&caller, PassCapability::ApproveAsParent, &owner)?;

        let updated = self.transition(pass, PassAction::ApproveParent, None).await?;

        let data = json!({
            "type": "pass_approved",
            "pass_id": updated.id,
            "status": updated.status,
        });
        dispatch(
            &self.notifier,
            Self::student_target(&owner),
            Notification::new(
                "Pass Approved by Parent",
                "Your outing pass has been approved by your parent.",
            ),
            data,
        );
        dispatch(
            &self.notifier,
            NotifyTarget::WardenAlerts,
            Notification::new(
                "Pending Warden Approval",
                "A pass has been approved by parent and is waiting for your approval.",
            ),
            json!({ "type": "pass_request", "pass_id": updated.id }),
        );

        Ok(PassResponse::new(updated, Some(owner.name)))
    }

    pub async fn approve_by_warden(&self, pass_id: &str) -> ApiResult<PassResponse> {
        let pass = self
            .db
            .get_pass_by_id(pass_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
        let owner = self
            .db
            .get_user_by_id(&pass.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass owner not found".to_string()))?;

        let updated = self.transition(pass, PassAction::ApproveWarden, None).await?;

        dispatch(
            &self.notifier,
            Self::student_target(&owner),
            Notification::new(
                "Pass Approved by Warden",
                "Your outing pass has been approved by the warden!",
            ),
            json!({
                "type": "pass_approved",
                "pass_id": updated.id,
                "status": updated.status,
            }),
        );

        Ok(PassResponse::new(updated, Some(owner.name)))
    }

    pub async fn reject_pass(&self, pass_id: &str, reason: Option<String>) -> ApiResult<PassResponse> {
        // Reason is stored verbatim; only all-whitespace counts as missing.
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("Rejection reason is required".to_string()))?;

        let pass = self
            .db
            .get_pass_by_id(pass_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
        let owner = self
            .db
            .get_user_by_id(&pass.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass owner not found".to_string()))?;

        let updated = self
            .transition(pass, PassAction::Reject, Some(&reason))
            .await?;

        dispatch(
            &self.notifier,
            Self::student_target(&owner),
            Notification::new(
                "Pass Rejected",
                format!("Your pass request was rejected. Reason: {}", reason),
            ),
            json!({
                "type": "pass_rejected",
                "pass_id": updated.id,
                "reason": reason,
            }),
        );

        Ok(PassResponse::new(updated, Some(owner.name)))
    }

    /// Applies an approval-flow action through the version-checked store.
    /// On a concurrent write the conditional update is retried exactly once
    /// against the fresh row; the state machine re-validates first, so a
    /// transition superseded by the other writer surfaces as InvalidState.
    async fn transition(
        &self,
        pass: Pass,
        action: PassAction,
        rejection_reason: Option<&str>,
    ) -> ApiResult<Pass> {
        let next = state_machine::apply(pass.status, action)?;
        let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();

        match self
            .db
            .update_pass_status(&pass.id, pass.version, next, rejection_reason, &now)
            .await
        {
            Err(ApiError::Conflict(_)) => {
                let current = self
                    .db
                    .get_pass_by_id(&pass.id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
                let next = state_machine::apply(current.status, action)?;
                self.db
                    .update_pass_status(&current.id, current.version, next, rejection_reason, &now)
                    .await
            }
            other => other,
        }
    }

    /// Passes awaiting warden action, newest first.
    pub async fn list_pending_for_warden(&self) -> ApiResult<Vec<PassResponse>> {
        let rows = self.db.list_pending_for_warden().await?;
        Ok(rows
            .into_iter()
            .map(|(pass, name)| PassResponse::new(pass, name))
            .collect())
    }

    /// Pending outing passes of the caller's linked children. Parents with
    /// no linked children see an empty list, not an error.
    pub async fn list_pending_for_parent(&self, parent_id: &str) -> ApiResult<Vec<PassResponse>> {
        let children = self.db.find_children_of(parent_id).await?;
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let child_ids: Vec<String> = children.into_iter().map(|c| c.id).collect();
        let rows = self
            .db
            .list_pending_passes_for_children(&child_ids, OUTING_PASS_TYPE)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(pass, name)| PassResponse::new(pass, name))
            .collect())
    }

    /// Everything that has left the pending state, most recently updated
    /// first, capped for dashboard performance.
    pub async fn list_history_for_warden(&self, limit: Option<i64>) -> ApiResult<Vec<PassResponse>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 1000);
        let rows = self.db.list_pass_history(limit).await?;
        Ok(rows
            .into_iter()
            .map(|(pass, name)| PassResponse::new(pass, name))
            .collect())
    }

    pub async fn list_passes_for_user(&self, user_id: &str) -> ApiResult<Vec<Pass>> {
        self.db.list_passes_by_user(user_id).await
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
