use super::Database;
use crate::api::middleware::ApiResult;
use crate::models::LocationPing;
use sqlx::Row;

fn ping_from_row(row: &sqlx::any::AnyRow) -> ApiResult<LocationPing> {
    Ok(LocationPing {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        accuracy: row.try_get("accuracy").ok(),
        geofence_violation: row.try_get::<i64, _>("geofence_violation")? != 0,
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    pub async fn create_location_ping(&self, ping: &LocationPing) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO locations (id, student_id, latitude, longitude, accuracy,
                                    geofence_violation, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ping.id)
        .bind(&ping.student_id)
        .bind(ping.latitude)
        .bind(ping.longitude)
        .bind(ping.accuracy)
        .bind(ping.geofence_violation)
        .bind(&ping.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn latest_location_ping(&self, student_id: &str) -> ApiResult<Option<LocationPing>> {
        let row = sqlx::query(
            "SELECT id, student_id, latitude, longitude, accuracy, geofence_violation, created_at
             FROM locations
             WHERE student_id = ?
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ping_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
