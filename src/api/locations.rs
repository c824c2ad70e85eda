use crate::api::middleware::{ApiError, ApiResult};
use crate::api::AppState;
use crate::models::RecordLocationRequest;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn record_location(
    State(state): State<AppState>,
    Json(request): Json<RecordLocationRequest>,
) -> ApiResult<impl IntoResponse> {
    let student_id = request
        .student_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("student_id is required".to_string()))?
        .to_string();
    let (latitude, longitude) = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(ApiError::Validation(
                "latitude and longitude are required".to_string(),
            ))
        }
    };

    let ping = state
        .location_service
        .record(
            &student_id,
            latitude,
            longitude,
            request.accuracy,
            request.geofence_violation,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ping)))
}

pub async fn latest_location(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ping = state.location_service.latest(&student_id).await?;
    Ok(Json(ping))
}
