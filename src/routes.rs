// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        blobs::blobs_handler,
        cache_handler::cache_handler,
        escrows::escrows_handler,
        intents::intents_handler,
        jobs::jobs_handler,
        profiles::profiles_handler,
        roles::roles_handler,
    },
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .merge(jobs_handler())
        .merge(escrows_handler())
        .merge(profiles_handler())
        .merge(roles_handler())
        .merge(intents_handler())
        .merge(blobs_handler())
        .merge(cache_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
