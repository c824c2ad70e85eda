use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single location report from the student app. The geofence flag is
/// computed client-side; this service only records and relays it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPing {
    pub id: String,
    pub student_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub geofence_violation: bool,
    pub created_at: String,
}

impl LocationPing {
    pub fn new(
        student_id: String,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        geofence_violation: bool,
    ) -> Self {
        let now = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap();

        Self {
            id: Uuid::new_v4().to_string(),
            student_id,
            latitude,
            longitude,
            accuracy,
            geofence_violation,
            created_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordLocationRequest {
    pub student_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub geofence_violation: bool,
}
