// handler/cache_handler.rs
use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    dtos::marketdtos::ApiResponse,
    error::{ErrorMessage, HttpError},
    service::{cache::keys, error::ServiceError},
    AppState,
};

pub fn cache_handler() -> Router {
    Router::new()
        .route("/cache/stats", get(get_cache_stats))
        .route("/cache/:key", delete(invalidate_key))
        .route("/cache/refetch/:key", post(refetch_key))
}

/// Get cache statistics
pub async fn get_cache_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.cache.stats().await;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "hits": stats.hits,
            "misses": stats.misses,
            "entries": stats.entries,
            "total_requests": stats.total_requests(),
            "hit_rate": format!("{:.2}%", stats.hit_rate()),
        }
    })))
}

fn check_key(key: &str) -> Result<(), HttpError> {
    if keys::is_known(key) {
        Ok(())
    } else {
        Err(HttpError::not_found(format!("{}: {}", ErrorMessage::UnknownQueryKey.to_string(), key)))
    }
}

pub async fn invalidate_key(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    check_key(&key)?;
    app_state.cache.invalidate(&key).await;

    Ok(Json(ApiResponse::success("Cache key invalidated", json!({ "key": key }))))
}

/// Invalidate `key` and run its query again so the next read is warm.
pub async fn refetch_key(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    check_key(&key)?;
    app_state.cache.invalidate(&key).await;

    let data = run_query(&app_state, &key).await?;

    Ok(Json(ApiResponse::success(
        "Cache key refetched",
        json!({ "key": key, "data": data }),
    )))
}

async fn run_query(app_state: &AppState, key: &str) -> Result<Value, ServiceError> {
    fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ServiceError> {
        serde_json::to_value(value).map_err(|e| ServiceError::Cache(e.to_string()))
    }

    match key {
        keys::JOBS => to_value(app_state.job_service.list_jobs().await?),
        keys::ESCROWS => to_value(app_state.escrow_service.list_escrows().await?),
        keys::PROFILES => to_value(app_state.profile_service.list_profiles().await?),
        keys::CANDIDATES => to_value(app_state.profile_service.candidates_with_reputation().await?),
        _ => {
            if let Some(job_id) = key.strip_prefix(keys::JOB_PREFIX) {
                to_value(app_state.job_service.get_job(job_id).await?)
            } else if let Some(job_id) = key.strip_prefix(keys::APPLICATIONS_PREFIX) {
                to_value(app_state.job_service.job_applications(job_id).await?)
            } else if let Some(address) = key.strip_prefix(keys::REPUTATION_PREFIX) {
                to_value(app_state.profile_service.reputation_of(address).await?)
            } else if let Some(address) = key.strip_prefix(keys::ROLES_PREFIX) {
                to_value(app_state.role_service.roles_of(address).await)
            } else {
                Err(ServiceError::Validation(format!("unknown query key {}", key)))
            }
        }
    }
}
