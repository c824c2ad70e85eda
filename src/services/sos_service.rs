use crate::api::middleware::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{SosAlert, SosStatus};
use crate::services::notifier::{dispatch, Notification, Notifier, NotifyTarget};
use serde_json::json;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Emergency alerts raised from the student app. Persistence first, push
/// second; a failed push never fails the alert.
#[derive(Clone)]
pub struct SosService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl SosService {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub async fn raise(
        &self,
        student_id: &str,
        latitude: f64,
        longitude: f64,
        alert_type: Option<String>,
    ) -> ApiResult<SosAlert> {
        let student = self
            .db
            .get_user_by_id(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

        let alert = SosAlert::new(
            student.id.clone(),
            latitude,
            longitude,
            alert_type.unwrap_or_else(|| "manual".to_string()),
        );
        self.db.create_sos_alert(&alert).await?;

        tracing::warn!("SOS alert raised: id={}, student={}", alert.id, alert.student_id);

        let notification = Notification::new(
            "SOS Alert",
            format!("{} has triggered an emergency alert", student.name),
        );
        let data = json!({
            "type": "sos_alert",
            "sos_id": alert.id,
            "student_id": alert.student_id,
            "student_name": student.name,
            "alert_type": alert.alert_type,
            "latitude": alert.latitude.to_string(),
            "longitude": alert.longitude.to_string(),
        });

        dispatch(
            &self.notifier,
            NotifyTarget::SosAlerts,
            notification.clone(),
            data.clone(),
        );
        if let Some(parent_id) = &student.parent_id {
            dispatch(
                &self.notifier,
                NotifyTarget::Parent(parent_id.clone()),
                notification,
                data,
            );
        }

        Ok(alert)
    }

    pub async fn resolve(&self, sos_id: &str, resolver_id: &str) -> ApiResult<SosAlert> {
        let alert = self
            .db
            .get_sos_alert_by_id(sos_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("SOS alert not found".to_string()))?;
        if alert.status == SosStatus::Resolved {
            return Err(ApiError::Conflict("SOS alert already resolved".to_string()));
        }

        let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
        self.db.resolve_sos_alert(sos_id, resolver_id, &now).await
    }

    pub async fn list_active(&self) -> ApiResult<Vec<SosAlert>> {
        self.db.list_active_sos_alerts().await
    }

    pub async fn list_for_student(&self, student_id: &str) -> ApiResult<Vec<SosAlert>> {
        self.db.list_sos_alerts_for_student(student_id).await
    }
}
