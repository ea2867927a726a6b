// handler/jobs.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};

use crate::{
    dtos::marketdtos::{ApiResponse, JobApplicationsResponseDto, JobListQuery, JobListResponseDto, JobSummaryDto},
    error::{ErrorMessage, HttpError},
    utils::address::is_valid_address,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", get(get_job_details))
        .route("/jobs/:job_id/applications", get(get_job_applications))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = match &query.posted_by {
        Some(poster) => {
            if !is_valid_address(poster) {
                return Err(HttpError::bad_request(ErrorMessage::InvalidAddress.to_string()));
            }
            app_state.job_service.jobs_posted_by(poster).await?
        }
        None if query.all.unwrap_or(false) => app_state.job_service.list_jobs().await?,
        None => app_state.job_service.open_listings().await?,
    };

    let jobs: Vec<JobSummaryDto> = jobs.into_iter().map(JobSummaryDto::from).collect();

    Ok(Json(ApiResponse::success(
        "Jobs retrieved successfully",
        JobListResponseDto {
            total: jobs.len(),
            jobs,
        },
    )))
}

pub async fn get_job_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    if !is_valid_address(&job_id) {
        return Err(HttpError::bad_request(ErrorMessage::InvalidAddress.to_string()));
    }
    let job = app_state.job_service.get_job(&job_id).await?;

    Ok(Json(ApiResponse::success(
        "Job details retrieved successfully",
        JobSummaryDto::from(job),
    )))
}

pub async fn get_job_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    if !is_valid_address(&job_id) {
        return Err(HttpError::bad_request(ErrorMessage::InvalidAddress.to_string()));
    }
    let job = app_state.job_service.get_job(&job_id).await?;
    let applications = app_state.job_service.job_applications(&job.id).await?;

    Ok(Json(ApiResponse::success(
        "Applications retrieved successfully",
        JobApplicationsResponseDto {
            job_id: job.id,
            job_version: job.job_version,
            applications,
        },
    )))
}
