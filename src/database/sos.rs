use super::Database;
use crate::api::middleware::{ApiError, ApiResult};
use crate::models::{SosAlert, SosStatus};
use sqlx::Row;

fn sos_from_row(row: &sqlx::any::AnyRow) -> ApiResult<SosAlert> {
    Ok(SosAlert {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        alert_type: row.try_get("alert_type")?,
        status: SosStatus::from(row.try_get::<String, _>("status")?),
        resolved_at: row.try_get("resolved_at").ok(),
        resolved_by: row.try_get("resolved_by").ok(),
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    pub async fn create_sos_alert(&self, alert: &SosAlert) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO sos_alerts (id, student_id, latitude, longitude, alert_type, status,
                                     resolved_at, resolved_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&alert.id)
        .bind(&alert.student_id)
        .bind(alert.latitude)
        .bind(alert.longitude)
        .bind(&alert.alert_type)
        .bind(alert.status.as_str())
        .bind(&alert.resolved_at)
        .bind(&alert.resolved_by)
        .bind(&alert.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_sos_alert_by_id(&self, id: &str) -> ApiResult<Option<SosAlert>> {
        let row = sqlx::query(
            "SELECT id, student_id, latitude, longitude, alert_type, status, resolved_at,
                    resolved_by, created_at
             FROM sos_alerts
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(sos_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn resolve_sos_alert(
        &self,
        id: &str,
        resolved_by: &str,
        resolved_at: &str,
    ) -> ApiResult<SosAlert> {
        let result = sqlx::query(
            "UPDATE sos_alerts
             SET status = 'resolved', resolved_at = ?, resolved_by = ?
             WHERE id = ? AND status = 'active'",
        )
        .bind(resolved_at)
        .bind(resolved_by)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_sos_alert_by_id(id).await? {
                Some(_) => Err(ApiError::Conflict("SOS alert already resolved".to_string())),
                None => Err(ApiError::NotFound("SOS alert not found".to_string())),
            };
        }

        self.get_sos_alert_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("SOS alert not found".to_string()))
    }

    pub async fn list_active_sos_alerts(&self) -> ApiResult<Vec<SosAlert>> {
        let rows = sqlx::query(
            "SELECT id, student_id, latitude, longitude, alert_type, status, resolved_at,
                    resolved_by, created_at
             FROM sos_alerts
             WHERE status = 'active'
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sos_from_row).collect()
    }

    pub async fn list_sos_alerts_for_student(&self, student_id: &str) -> ApiResult<Vec<SosAlert>> {
        let rows = sqlx::query(
            "SELECT id, student_id, latitude, longitude, alert_type, status, resolved_at,
                    resolved_by, created_at
             FROM sos_alerts
             WHERE student_id = ?
             ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sos_from_row).collect()
    }
}
