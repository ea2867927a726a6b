use thiserror::Error;
use axum::http::StatusCode;

use crate::{
    error::HttpError,
    ledger::LedgerError,
    models::escrowmodel::EscrowStatus,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(String),

    #[error("Escrow {0} not found")]
    EscrowNotFound(String),

    #[error("Invalid escrow state transition: {from:?} -> {to:?}")]
    InvalidEscrowTransition { from: EscrowStatus, to: EscrowStatus },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error.status_code() {
            StatusCode::NOT_FOUND => HttpError::not_found(error.to_string()),
            StatusCode::BAD_REQUEST => HttpError::bad_request(error.to_string()),
            StatusCode::BAD_GATEWAY => HttpError::bad_gateway(error.to_string()),
            StatusCode::SERVICE_UNAVAILABLE => HttpError::new(error.to_string(), StatusCode::SERVICE_UNAVAILABLE),
            _ => HttpError::server_error(error.to_string()),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::EscrowNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidEscrowTransition { .. }
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Ledger(_)
            | ServiceError::Submission(_)
            | ServiceError::BlobStore(_) => StatusCode::BAD_GATEWAY,

            ServiceError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,

            ServiceError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
