use super::Database;
use crate::api::middleware::{ApiError, ApiResult};
use crate::models::User;
use sqlx::Row;

fn user_from_row(row: &sqlx::any::AnyRow) -> ApiResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        parent_id: row.try_get("parent_id").ok(),
        device_token: row.try_get("device_token").ok(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Database {
    pub async fn create_user(&self, user: &User) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, parent_id, device_token, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.parent_id)
        .bind(&user.device_token)
        .bind(&user.created_at)
        .bind(&user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, role, parent_id, device_token, created_at, updated_at
             FROM users
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, role, parent_id, device_token, created_at, updated_at
             FROM users
             WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, parent_id, device_token, created_at, updated_at
             FROM users
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    pub async fn find_children_of(&self, parent_id: &str) -> ApiResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, parent_id, device_token, created_at, updated_at
             FROM users
             WHERE parent_id = ?
             ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// One-time student-to-parent link. The `parent_id IS NULL` predicate
    /// makes the first writer win; everyone after gets a Conflict.
    pub async fn link_parent(
        &self,
        student_id: &str,
        parent_id: &str,
        updated_at: &str,
    ) -> ApiResult<User> {
        let result = sqlx::query(
            "UPDATE users SET parent_id = ?, updated_at = ? WHERE id = ? AND parent_id IS NULL",
        )
        .bind(parent_id)
        .bind(updated_at)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_user_by_id(student_id).await? {
                Some(_) => Err(ApiError::Conflict(
                    "Student already has a linked parent".to_string(),
                )),
                None => Err(ApiError::NotFound("User not found".to_string())),
            };
        }

        self.get_user_by_id(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn set_device_token(
        &self,
        user_id: &str,
        device_token: &str,
        updated_at: &str,
    ) -> ApiResult<User> {
        let result = sqlx::query("UPDATE users SET device_token = ?, updated_at = ? WHERE id = ?")
            .bind(device_token)
            .bind(updated_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        self.get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}
