use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::{
    models::{
        escrowmodel::EnrichedEscrow,
        jobmodel::{Job, JobApplication},
    },
    service::{escrow_service::EscrowRole, invalidation::IntentAction},
    utils::{address::is_valid_address, currency::mist_to_sui},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

fn validate_address(value: &str) -> Result<(), ValidationError> {
    if is_valid_address(value) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_address"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Include jobs in every status, not only open listings.
    pub all: Option<bool>,
    pub posted_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EscrowQuery {
    #[validate(custom = "validate_address")]
    pub identity: Option<String>,
    pub role: Option<EscrowRole>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct IntentDto {
    pub action: IntentAction,

    #[validate(custom = "validate_address")]
    pub sender: String,

    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponseDto {
    pub jobs: Vec<JobSummaryDto>,
    pub total: usize,
}

/// Listing card with display strings precomputed.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobSummaryDto {
    #[serde(flatten)]
    pub job: Job,
    pub price_sui: f64,
    pub price_display: String,
    pub duration_display: String,
}

impl From<Job> for JobSummaryDto {
    fn from(job: Job) -> Self {
        Self {
            price_sui: mist_to_sui(job.price),
            price_display: job.display_price(),
            duration_display: job.display_duration(),
            job,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobApplicationsResponseDto {
    pub job_id: String,
    pub job_version: u64,
    pub applications: Vec<JobApplication>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EscrowListResponseDto {
    pub identity: Option<String>,
    pub role: Option<EscrowRole>,
    pub total: usize,
    pub escrows: Vec<EnrichedEscrow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlobResponseDto {
    pub blob_id: String,
    pub url: String,
}
