use crate::api::middleware::{ApiError, ApiResult};
use crate::api::AppState;
use crate::models::{LinkParentRequest, RegisterDeviceTokenRequest};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

/// User detail with pass history
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.user_service.get_user_detail(&id).await?;
    Ok(Json(detail))
}

/// One-time student-to-parent link; first writer wins
pub async fn link_parent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LinkParentRequest>,
) -> ApiResult<impl IntoResponse> {
    let parent_id = request
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("parent_id is required".to_string()))?
        .to_string();

    let user = state.user_service.link_parent(&id, &parent_id).await?;
    Ok(Json(user))
}

/// Register the FCM device token used for direct pushes
pub async fn register_device_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RegisterDeviceTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = request
        .device_token
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("device_token is required".to_string()))?
        .to_string();

    let user = state.user_service.register_device_token(&id, &token).await?;
    Ok(Json(user))
}
