use serde::{Deserialize, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Pending,
    Active,
    ApprovedParent,
    ApprovedWarden,
    Approved,
    Rejected,
    Exited,
    Entered,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Pending => "pending",
            PassStatus::Active => "active",
            PassStatus::ApprovedParent => "approved_parent",
            PassStatus::ApprovedWarden => "approved_warden",
            PassStatus::Approved => "approved",
            PassStatus::Rejected => "rejected",
            PassStatus::Exited => "exited",
            PassStatus::Entered => "entered",
        }
    }

    /// Statuses a gate terminal will accept. `approved_parent` is an
    /// intermediate state and does not authorize passage on its own.
    pub fn is_scannable(&self) -> bool {
        matches!(
            self,
            PassStatus::Active
                | PassStatus::Approved
                | PassStatus::ApprovedWarden
                | PassStatus::Exited
        )
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Convert from string (for SQLx)
impl From<String> for PassStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => PassStatus::Active,
            "approved_parent" => PassStatus::ApprovedParent,
            "approved_warden" => PassStatus::ApprovedWarden,
            "approved" => PassStatus::Approved,
            "rejected" => PassStatus::Rejected,
            "exited" => PassStatus::Exited,
            "entered" => PassStatus::Entered,
            _ => PassStatus::Pending,
        }
    }
}

// Allow reading from DB as string
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for PassStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(PassStatus::from(s))
    }
}

impl sqlx::Type<sqlx::Sqlite> for PassStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl sqlx::Type<sqlx::Any> for PassStatus {
    fn type_info() -> sqlx::any::AnyTypeInfo {
        <String as sqlx::Type<sqlx::Any>>::type_info()
    }

    fn compatible(ty: &sqlx::any::AnyTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Any>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Any> for PassStatus {
    fn decode(value: sqlx::any::AnyValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Any>>::decode(value)?;
        Ok(PassStatus::from(s))
    }
}

/// Which half of the exit/entry cycle a gate scan recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Exit,
    Entry,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Exit => write!(f, "exit"),
            ScanType::Entry => write!(f, "entry"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pass {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub pass_type: String,
    pub purpose: Option<String>,
    pub valid_from: String, // ISO8601 string from DB
    pub valid_to: String,   // ISO8601 string from DB
    pub barcode: String,
    pub status: PassStatus,
    pub rejection_reason: Option<String>,
    pub exit_time: Option<String>,
    pub entry_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: i32,
}

// Helper methods for timestamps (converting String <-> OffsetDateTime)
impl Pass {
    pub fn valid_from_datetime(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.valid_from, &Rfc3339).ok()
    }

    pub fn valid_to_datetime(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.valid_to, &Rfc3339).ok()
    }

    pub fn exit_time_datetime(&self) -> Option<OffsetDateTime> {
        self.exit_time
            .as_ref()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePassRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub pass_type: Option<String>,
    pub purpose: Option<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentApprovalRequest {
    pub caller_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectPassRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub barcode: Option<String>,
}

/// Pass enriched with the owning student's name for display at the gate
/// and in warden/parent listings.
#[derive(Debug, Clone, Serialize)]
pub struct PassResponse {
    #[serde(flatten)]
    pub pass: Pass,
    pub student_name: Option<String>,
}

impl PassResponse {
    pub fn new(pass: Pass, student_name: Option<String>) -> Self {
        Self { pass, student_name }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub message: String,
    pub scan_type: ScanType,
    pub pass: PassResponse,
}
