use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SosStatus {
    Active,
    Resolved,
}

impl SosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SosStatus::Active => "active",
            SosStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for SosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for SosStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "resolved" => SosStatus::Resolved,
            _ => SosStatus::Active,
        }
    }
}

/// Emergency alert raised from the student app (shake gesture or manual).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosAlert {
    pub id: String,
    pub student_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub alert_type: String,
    pub status: SosStatus,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: String,
}

impl SosAlert {
    pub fn new(student_id: String, latitude: f64, longitude: f64, alert_type: String) -> Self {
        let now = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap();

        Self {
            id: Uuid::new_v4().to_string(),
            student_id,
            latitude,
            longitude,
            alert_type,
            status: SosStatus::Active,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RaiseSosRequest {
    pub student_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub alert_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveSosRequest {
    pub resolver_id: Option<String>,
}
