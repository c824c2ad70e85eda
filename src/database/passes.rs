use super::Database;
use crate::api::middleware::{ApiError, ApiResult};
use crate::models::{Pass, PassStatus};
use sqlx::Row;

const PASS_COLUMNS: &str = "id, user_id, pass_type, purpose, valid_from, valid_to, barcode, \
                            status, rejection_reason, exit_time, entry_time, created_at, \
                            updated_at, version";

const JOINED_COLUMNS: &str = "p.id, p.user_id, p.pass_type, p.purpose, p.valid_from, p.valid_to, \
                              p.barcode, p.status, p.rejection_reason, p.exit_time, p.entry_time, \
                              p.created_at, p.updated_at, p.version, u.name AS student_name";

fn pass_from_row(row: &sqlx::any::AnyRow) -> ApiResult<Pass> {
    Ok(Pass {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pass_type: row.try_get("pass_type")?,
        purpose: row.try_get("purpose").ok(),
        valid_from: row.try_get("valid_from")?,
        valid_to: row.try_get("valid_to")?,
        barcode: row.try_get("barcode")?,
        status: row.try_get("status")?,
        rejection_reason: row.try_get("rejection_reason").ok(),
        exit_time: row.try_get("exit_time").ok(),
        entry_time: row.try_get("entry_time").ok(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn pass_with_name_from_row(row: &sqlx::any::AnyRow) -> ApiResult<(Pass, Option<String>)> {
    let pass = pass_from_row(row)?;
    let name = row.try_get("student_name").ok();
    Ok((pass, name))
}

impl Database {
    pub async fn create_pass(&self, pass: &Pass) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO passes (id, user_id, pass_type, purpose, valid_from, valid_to, barcode,
                                 status, rejection_reason, exit_time, entry_time, created_at,
                                 updated_at, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&pass.id)
        .bind(&pass.user_id)
        .bind(&pass.pass_type)
        .bind(&pass.purpose)
        .bind(&pass.valid_from)
        .bind(&pass.valid_to)
        .bind(&pass.barcode)
        .bind(pass.status.as_str())
        .bind(&pass.rejection_reason)
        .bind(&pass.exit_time)
        .bind(&pass.entry_time)
        .bind(&pass.created_at)
        .bind(&pass.updated_at)
        .bind(pass.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_pass_by_id(&self, id: &str) -> ApiResult<Option<Pass>> {
        let row = sqlx::query(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(pass_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_pass_by_barcode(&self, barcode: &str) -> ApiResult<Option<Pass>> {
        let row = sqlx::query(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE barcode = ?"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(pass_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Version-checked status transition. Zero rows affected on an existing
    /// pass means another writer got there first.
    pub async fn update_pass_status(
        &self,
        id: &str,
        expected_version: i32,
        status: PassStatus,
        rejection_reason: Option<&str>,
        updated_at: &str,
    ) -> ApiResult<Pass> {
        let result = sqlx::query(
            "UPDATE passes
             SET status = ?, rejection_reason = COALESCE(?, rejection_reason),
                 version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(status.as_str())
        .bind(rejection_reason)
        .bind(updated_at)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        self.reloaded(id, result.rows_affected()).await
    }

    /// Records the exit half of the scan cycle.
    pub async fn mark_exit(&self, id: &str, expected_version: i32, at: &str) -> ApiResult<Pass> {
        let result = sqlx::query(
            "UPDATE passes
             SET status = ?, exit_time = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(PassStatus::Exited.as_str())
        .bind(at)
        .bind(at)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        self.reloaded(id, result.rows_affected()).await
    }

    /// Records the entry half of the scan cycle.
    pub async fn mark_entry(&self, id: &str, expected_version: i32, at: &str) -> ApiResult<Pass> {
        let result = sqlx::query(
            "UPDATE passes
             SET status = ?, entry_time = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(PassStatus::Entered.as_str())
        .bind(at)
        .bind(at)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        self.reloaded(id, result.rows_affected()).await
    }

    async fn reloaded(&self, id: &str, rows_affected: u64) -> ApiResult<Pass> {
        if rows_affected == 0 {
            return match self.get_pass_by_id(id).await? {
                Some(_) => Err(ApiError::Conflict(format!(
                    "Pass {} was modified concurrently",
                    id
                ))),
                None => Err(ApiError::NotFound("Pass not found".to_string())),
            };
        }

        self.get_pass_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Pass not found".to_string()))
    }

    pub async fn list_passes_by_user(&self, user_id: &str) -> ApiResult<Vec<Pass>> {
        let rows = sqlx::query(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pass_from_row).collect()
    }

    pub async fn list_pending_for_warden(&self) -> ApiResult<Vec<(Pass, Option<String>)>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM passes p LEFT JOIN users u ON u.id = p.user_id
             WHERE p.status IN ('pending', 'approved_parent')
             ORDER BY p.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pass_with_name_from_row).collect()
    }

    pub async fn list_pending_passes_for_children(
        &self,
        child_ids: &[String],
        pass_type: &str,
    ) -> ApiResult<Vec<(Pass, Option<String>)>> {
        if child_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = child_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT {JOINED_COLUMNS}
             FROM passes p LEFT JOIN users u ON u.id = p.user_id
             WHERE p.status = 'pending' AND p.pass_type = ? AND p.user_id IN ({placeholders})
             ORDER BY p.created_at DESC"
        );

        let mut query = sqlx::query(&sql).bind(pass_type);
        for id in child_ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(pass_with_name_from_row).collect()
    }

    pub async fn list_pass_history(&self, limit: i64) -> ApiResult<Vec<(Pass, Option<String>)>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM passes p LEFT JOIN users u ON u.id = p.user_id
             WHERE p.status <> 'pending'
             ORDER BY p.updated_at DESC
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pass_with_name_from_row).collect()
    }
}
