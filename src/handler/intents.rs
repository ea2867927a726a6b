// handler/intents.rs
use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Extension, Json, Router};
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, IntentDto},
    error::HttpError,
    service::intent_service::Intent,
    AppState,
};

pub fn intents_handler() -> Router {
    Router::new().route("/intents", post(submit_intent))
}

pub async fn submit_intent(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<IntentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let intent = Intent {
        action: body.action,
        sender: body.sender,
        payload: body.payload,
    };

    let receipt = app_state.transaction_service.execute(intent).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success("Transaction submitted successfully", receipt)),
    ))
}
