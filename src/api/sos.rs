use crate::api::middleware::{ApiError, ApiResult};
use crate::api::AppState;
use crate::models::{RaiseSosRequest, ResolveSosRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn raise_sos(
    State(state): State<AppState>,
    Json(request): Json<RaiseSosRequest>,
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

    let alert = state
        .sos_service
        .raise(&student_id, latitude, longitude, request.alert_type)
        .await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn resolve_sos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResolveSosRequest>,
) -> ApiResult<impl IntoResponse> {
    let resolver_id = request
        .resolver_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("resolver_id is required".to_string()))?
        .to_string();

    let alert = state.sos_service.resolve(&id, &resolver_id).await?;
    Ok(Json(alert))
}

pub async fn active_alerts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let alerts = state.sos_service.list_active().await?;
    Ok(Json(alerts))
}

pub async fn student_history(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let alerts = state.sos_service.list_for_student(&student_id).await?;
    Ok(Json(alerts))
}
