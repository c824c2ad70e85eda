pub mod locations;
pub mod middleware;
pub mod passes;
pub mod sos;
pub mod users;

pub use middleware::*;

use crate::database::Database;
use crate::services::{LocationService, PassService, ScanService, SosService, UserService};
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub pass_service: PassService,
    pub scan_service: ScanService,
    pub user_service: UserService,
    pub sos_service: SosService,
    pub location_service: LocationService,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Pass lifecycle
        .route("/api/passes", post(passes::create_pass))
        .route("/api/passes/scan", post(passes::scan_pass))
        .route("/api/passes/pending/warden", get(passes::pending_for_warden))
        .route(
            "/api/passes/pending/parent/:parent_id",
            get(passes::pending_for_parent),
        )
        .route("/api/passes/history/warden", get(passes::warden_history))
        .route("/api/passes/user/:user_id", get(passes::passes_for_user))
        .route("/api/passes/:id", get(passes::get_pass))
        .route(
            "/api/passes/:id/approve/parent",
            post(passes::approve_by_parent),
        )
        .route(
            "/api/passes/:id/approve/warden",
            post(passes::approve_by_warden),
        )
        .route("/api/passes/:id/reject", post(passes::reject_pass))
        // User directory
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id/link-parent", post(users::link_parent))
        .route("/api/users/:id/device-token", post(users::register_device_token))
        // SOS alerts
        .route("/api/sos", post(sos::raise_sos))
        .route("/api/sos/active", get(sos::active_alerts))
        .route("/api/sos/student/:student_id", get(sos::student_history))
        .route("/api/sos/:id/resolve", post(sos::resolve_sos))
        // Location tracking
        .route("/api/locations", post(locations::record_location))
        .route(
            "/api/locations/:student_id/latest",
            get(locations::latest_location),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
