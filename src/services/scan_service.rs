use crate::api::middleware::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{Pass, PassResponse, ScanResponse, ScanType, User};
use crate::services::notifier::{dispatch, Notification, Notifier, NotifyTarget};
use serde_json::json;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Tolerance before `valid_from` during which a scan is still accepted,
/// covering clock skew between the gate terminal and the server.
const GRACE_PERIOD: Duration = Duration::minutes(5);

/// Interprets barcode scans at the gate terminal: one exit, one entry,
/// then the pass is spent.
#[derive(Clone)]
pub struct ScanService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl ScanService {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub async fn scan(&self, barcode: &str) -> ApiResult<ScanResponse> {
        let pass = self
            .db
            .get_pass_by_barcode(barcode)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
        let owner = self
            .db
            .get_user_by_id(&pass.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass owner not found".to_string()))?;

        // One clock read drives every window check and written timestamp
        // in this scan.
        let now = OffsetDateTime::now_utc();

        let scan_type = decide(&pass, now)?;
        let updated = match self.record(&pass, scan_type, now).await {
            Err(ApiError::Conflict(_)) => {
                // A concurrent scan won the conditional write. Re-read once;
                // if the fresh row still supports the same decision, retry
                // the write, otherwise this scan lost its exit/entry slot.
                let current = self
                    .db
                    .get_pass_by_barcode(barcode)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))?;
                let retried = decide(&current, now)?;
                if retried != scan_type {
                    return Err(ApiError::AlreadyUsed);
                }
                self.record(&current, scan_type, now).await?
            }
            other => other?,
        };

        tracing::info!(
            "Gate scan: pass={}, student={}, type={}",
            updated.id,
            updated.user_id,
            scan_type
        );

        if scan_type == ScanType::Entry {
            self.alert_if_late(&updated, &owner, now);
        }

        let message = match scan_type {
            ScanType::Exit => "Student Exited",
            ScanType::Entry => "Student Entered",
        };

        Ok(ScanResponse {
            message: message.to_string(),
            scan_type,
            pass: PassResponse::new(updated, Some(owner.name)),
        })
    }

    async fn record(&self, pass: &Pass, scan_type: ScanType, now: OffsetDateTime) -> ApiResult<Pass> {
        let stamp = now.format(&Rfc3339).unwrap();
        match scan_type {
            ScanType::Exit => self.db.mark_exit(&pass.id, pass.version, &stamp).await,
            ScanType::Entry => self.db.mark_entry(&pass.id, pass.version, &stamp).await,
        }
    }

    /// An entry past `valid_to` is accepted but alerted: the warden channel
    /// always hears about it, the linked parent too when one exists.
    fn alert_if_late(&self, pass: &Pass, owner: &User, now: OffsetDateTime) {
        let Some(valid_to) = pass.valid_to_datetime() else {
            return;
        };
        if now <= valid_to {
            return;
        }

        let entry_time = pass.entry_time.clone().unwrap_or_default();
        let notification = Notification::new(
            "Late Entry Alert",
            format!("{} returned late through the gate at {}.", owner.name, entry_time),
        );
        let data = json!({
            "type": "late_entry",
            "pass_id": pass.id,
            "student_id": pass.user_id,
            "student_name": owner.name,
            "entry_time": entry_time,
            "valid_until": pass.valid_to,
        });

        dispatch(
            &self.notifier,
            NotifyTarget::WardenAlerts,
            notification.clone(),
            data.clone(),
        );
        if let Some(parent_id) = &owner.parent_id {
            dispatch(
                &self.notifier,
                NotifyTarget::Parent(parent_id.clone()),
                notification,
                data,
            );
        }
    }
}

/// Pure scan decision against a snapshot of the pass. Checks run in order:
/// scannable status, grace period, expiry, then the exit/entry toggle.
fn decide(pass: &Pass, now: OffsetDateTime) -> ApiResult<ScanType> {
    if !pass.status.is_scannable() {
        return Err(ApiError::InvalidState(pass.status));
    }

    let valid_from = pass.valid_from_datetime().ok_or_else(|| {
        ApiError::Internal(format!("pass {} has an unparseable validity window", pass.id))
    })?;
    let valid_to = pass.valid_to_datetime().ok_or_else(|| {
        ApiError::Internal(format!("pass {} has an unparseable validity window", pass.id))
    })?;

    if now + GRACE_PERIOD < valid_from {
        return Err(ApiError::NotYetValid {
            valid_from: pass.valid_from.clone(),
        });
    }

    // An unused pass can no longer exit once expired; a pass that is
    // already out is always allowed back in, however late.
    if valid_to < now && pass.exit_time.is_none() {
        return Err(ApiError::Expired {
            valid_to: pass.valid_to.clone(),
        });
    }

    if pass.exit_time.is_none() {
        Ok(ScanType::Exit)
    } else if pass.entry_time.is_none() {
        Ok(ScanType::Entry)
    } else {
        Err(ApiError::AlreadyUsed)
    }
}
