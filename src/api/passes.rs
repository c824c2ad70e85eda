use crate::api::middleware::{ApiError, ApiResult};
use crate::api::AppState;
use crate::models::{CreatePassRequest, ParentApprovalRequest, RejectPassRequest, ScanRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

/// Create a new pass request
pub async fn create_pass(
    State(state): State<AppState>,
    Json(request): Json<CreatePassRequest>,
) -> ApiResult<impl IntoResponse> {
    let pass = state.pass_service.create_pass(request).await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

/// Get pass by ID
pub async fn get_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let pass = state.pass_service.get_pass(&id).await?;
    Ok(Json(pass))
}

/// Parent approval step
pub async fn approve_by_parent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ParentApprovalRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller_id = request
        .caller_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("caller_id is required".to_string()))?
        .to_string();

    let pass = state.pass_service.approve_by_parent(&id, &caller_id).await?;
    Ok(Json(pass))
}

/// Warden approval step
pub async fn approve_by_warden(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let pass = state.pass_service.approve_by_warden(&id).await?;
    Ok(Json(pass))
}

/// Reject a pass with a mandatory reason
pub async fn reject_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RejectPassRequest>,
) -> ApiResult<impl IntoResponse> {
    let pass = state.pass_service.reject_pass(&id, request.reason).await?;
    Ok(Json(pass))
}

/// Gate terminal scan
pub async fn scan_pass(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<impl IntoResponse> {
    let barcode = request
        .barcode
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("barcode is required".to_string()))?
        .to_string();

    let result = state.scan_service.scan(&barcode).await?;
    Ok(Json(result))
}

/// Passes of one owner, newest first
pub async fn passes_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let passes = state.pass_service.list_passes_for_user(&user_id).await?;
    Ok(Json(passes))
}

/// Passes awaiting warden action
pub async fn pending_for_warden(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let passes = state.pass_service.list_pending_for_warden().await?;
    Ok(Json(passes))
}

/// Pending outing passes of the parent's linked children
pub async fn pending_for_parent(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let passes = state.pass_service.list_pending_for_parent(&parent_id).await?;
    Ok(Json(passes))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Non-pending passes for the warden dashboard, most recent first
pub async fn warden_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let passes = state.pass_service.list_history_for_warden(params.limit).await?;
    Ok(Json(passes))
}
