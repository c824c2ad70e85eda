use crate::api::middleware::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{Role, User, UserDetailResponse};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Read side of the user directory plus the two mutations the mobile apps
/// need: the one-time parent link and device-token registration.
#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.db.list_users().await
    }

    pub async fn get_user_detail(&self, user_id: &str) -> ApiResult<UserDetailResponse> {
        let user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        let passes = self.db.list_passes_by_user(&user.id).await?;
        Ok(UserDetailResponse { user, passes })
    }

    /// Links a student to a parent account. The link is one-time: the first
    /// writer wins and any later attempt gets a Conflict, enforced by a
    /// conditional update on `parent_id IS NULL`.
    pub async fn link_parent(&self, student_id: &str, parent_id: &str) -> ApiResult<User> {
        let student = self
            .db
            .get_user_by_id(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
        if student.role != Role::Student {
            return Err(ApiError::Validation(
                "Only student accounts can be linked to a parent".to_string(),
            ));
        }

        let parent = self
            .db
            .get_user_by_id(parent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Parent not found".to_string()))?;
        if parent.role != Role::Parent {
            return Err(ApiError::Validation(
                "Linked account must have the parent role".to_string(),
            ));
        }

        let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
        let linked = self.db.link_parent(student_id, parent_id, &now).await?;

        tracing::info!("Parent link established: student={}, parent={}", student_id, parent_id);

        Ok(linked)
    }

    pub async fn register_device_token(&self, user_id: &str, token: &str) -> ApiResult<User> {
        let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
        self.db.set_device_token(user_id, token, &now).await
    }
}
