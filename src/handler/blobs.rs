// handler/blobs.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::{
    dtos::marketdtos::{ApiResponse, BlobResponseDto},
    error::{ErrorMessage, HttpError},
    service::{blob_store::BlobStore, error::ServiceError},
    AppState,
};

pub fn blobs_handler() -> Router {
    Router::new()
        .route("/blobs", post(upload_blob))
        .route("/blobs/:blob_id", get(get_blob_url))
}

fn blob_store(app_state: &AppState) -> Result<&BlobStore, HttpError> {
    app_state
        .blob_store
        .as_deref()
        .ok_or_else(|| ServiceError::NotConfigured("WALRUS_PUBLISHER_URL / WALRUS_AGGREGATOR_URL").into())
}

pub async fn upload_blob(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let store = blob_store(&app_state)?;
    if body.is_empty() {
        return Err(HttpError::bad_request(ErrorMessage::EmptyUpload.to_string()));
    }

    let blob_id = store.put(body.to_vec()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Blob stored successfully",
            BlobResponseDto {
                url: store.url(&blob_id),
                blob_id,
            },
        )),
    ))
}

pub async fn get_blob_url(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(blob_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let store = blob_store(&app_state)?;

    Ok(Json(ApiResponse::success(
        "Blob URL resolved",
        BlobResponseDto {
            url: store.url(&blob_id),
            blob_id,
        },
    )))
}
