// handler/profiles.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::{
    dtos::marketdtos::ApiResponse,
    error::{ErrorMessage, HttpError},
    models::reputationmodel::ReputationProfile,
    utils::address::is_valid_address,
    AppState,
};

pub fn profiles_handler() -> Router {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/owner/:address", get(get_profiles_by_owner))
        .route("/candidates", get(list_candidates))
        .route("/reputation/:address", get(get_reputation))
}

#[derive(Debug, Serialize)]
pub struct ReputationSummary {
    #[serde(flatten)]
    pub reputation: ReputationProfile,
    pub average_rating: f64,
    pub completion_rate: f64,
    pub skill_averages: BTreeMap<String, f64>,
}

impl ReputationSummary {
    fn new(reputation: ReputationProfile, rating_scale: u64) -> Self {
        let skill_averages = reputation
            .skill_counts
            .keys()
            .map(|skill| (skill.clone(), reputation.average_for_skill(skill)))
            .collect();

        Self {
            average_rating: reputation.overall_average(rating_scale),
            completion_rate: reputation.completion_rate(),
            skill_averages,
            reputation,
        }
    }
}

fn check_address(address: &str) -> Result<(), HttpError> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(HttpError::bad_request(ErrorMessage::InvalidAddress.to_string()))
    }
}

pub async fn list_profiles(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let profiles = app_state.profile_service.list_profiles().await?;

    Ok(Json(ApiResponse::success("Profiles retrieved successfully", profiles)))
}

pub async fn get_profiles_by_owner(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    check_address(&address)?;
    let profiles = app_state.profile_service.profiles_owned_by(&address).await?;

    Ok(Json(ApiResponse::success("Profiles retrieved successfully", profiles)))
}

pub async fn list_candidates(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let candidates = app_state.profile_service.candidates_with_reputation().await?;

    Ok(Json(ApiResponse::success("Candidates retrieved successfully", candidates)))
}

pub async fn get_reputation(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    check_address(&address)?;
    let reputation = app_state.profile_service.reputation_of(&address).await?;
    let rating_scale = app_state.profile_service.rating_scale();

    Ok(Json(ApiResponse::success(
        "Reputation retrieved successfully",
        ReputationSummary::new(reputation, rating_scale),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_skips_nan() {
        let mut reputation = ReputationProfile::empty("0x1");
        reputation.skill_counts.insert("move".to_string(), 0);
        reputation.skill_counts.insert("rust".to_string(), 2);
        reputation.skill_scores.insert("rust".to_string(), 9);

        let summary = ReputationSummary::new(reputation, 1);

        assert_eq!(summary.skill_averages["move"], 0.0);
        assert_eq!(summary.skill_averages["rust"], 4.5);
        assert_eq!(summary.average_rating, 0.0);
    }
}
