// handler/roles.rs
use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    dtos::marketdtos::ApiResponse,
    error::{ErrorMessage, HttpError},
    utils::address::is_valid_address,
    AppState,
};

pub fn roles_handler() -> Router {
    Router::new().route("/roles/:address", get(get_roles))
}

/// Advisory only: every flag is `false` when the ledger cannot answer.
pub async fn get_roles(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    if !is_valid_address(&address) {
        return Err(HttpError::bad_request(ErrorMessage::InvalidAddress.to_string()));
    }

    let roles = app_state.role_service.roles_of(&address).await;

    Ok(Json(ApiResponse::success("Roles retrieved successfully", roles)))
}
