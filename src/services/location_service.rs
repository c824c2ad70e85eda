use crate::api::middleware::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::LocationPing;
use crate::services::notifier::{dispatch, Notification, Notifier, NotifyTarget};
use serde_json::json;
use std::sync::Arc;

/// Records location reports from the student app. Geofence evaluation
/// happens on the device; this service only stores the ping and relays a
/// violation flag as an alert.
#[derive(Clone)]
pub struct LocationService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl LocationService {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub async fn record(
        &self,
        student_id: &str,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        geofence_violation: bool,
    ) -> ApiResult<LocationPing> {
        let student = self
            .db
            .get_user_by_id(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

        let ping = LocationPing::new(
            student.id.clone(),
            latitude,
            longitude,
            accuracy,
            geofence_violation,
        );
        self.db.create_location_ping(&ping).await?;

        if geofence_violation {
            let notification = Notification::new(
                "Geofence Violation",
                format!("{} is outside campus boundaries", student.name),
            );
            let data = json!({
                "type": "geofence_violation",
                "student_id": ping.student_id,
                "student_name": student.name,
                "latitude": ping.latitude.to_string(),
                "longitude": ping.longitude.to_string(),
            });

            dispatch(
                &self.notifier,
                NotifyTarget::WardenAlerts,
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
        }

        Ok(ping)
    }

    pub async fn latest(&self, student_id: &str) -> ApiResult<LocationPing> {
        self.db
            .latest_location_ping(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No location recorded for student".to_string()))
    }
}
