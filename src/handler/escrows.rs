// handler/escrows.rs
use std::sync::Arc;

use axum::{extract::Query, response::IntoResponse, routing::get, Extension, Json, Router};
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, EscrowListResponseDto, EscrowQuery},
    error::HttpError,
    utils::address::normalize_address,
    AppState,
};

pub fn escrows_handler() -> Router {
    Router::new().route("/escrows", get(get_escrows))
}

/// Escrows joined with job details: every escrow, or the ones where
/// `identity` is on the `role` side when both are given.
pub async fn get_escrows(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<EscrowQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (identity, escrows) = match (&query.identity, query.role) {
        (Some(identity), Some(role)) => {
            let escrows = app_state.escrow_service.escrows_for(identity, role).await?;
            (Some(normalize_address(identity)), escrows)
        }
        (None, None) => (None, app_state.escrow_service.enriched_escrows().await?),
        _ => return Err(HttpError::bad_request("identity and role must be given together")),
    };

    Ok(Json(ApiResponse::success(
        "Escrows retrieved successfully",
        EscrowListResponseDto {
            identity,
            role: query.role,
            total: escrows.len(),
            escrows,
        },
    )))
}
