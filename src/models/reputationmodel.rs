use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    ledger::types::MoveObjectContent,
    models::{type_matches, FromMoveObject},
    utils::move_decode::*,
};

/// Aggregate rating state for one identity. Written only by the contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReputationProfile {
    pub user: String,
    pub total_jobs: u64,
    pub completed_jobs: u64,
    /// Sum of every rating received, in the contract's stored scale.
    pub total_rating: u64,
    pub rating_count: u64,
    pub skill_scores: HashMap<String, u64>,
    pub skill_counts: HashMap<String, u64>,
}

impl ReputationProfile {
    pub fn empty(user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..Default::default()
        }
    }

    /// `skill_scores[skill] / skill_counts[skill]`, zero when nothing was counted.
    pub fn average_for_skill(&self, skill: &str) -> f64 {
        let count = self.skill_counts.get(skill).copied().unwrap_or(0);
        if count == 0 {
            return 0.0;
        }
        let score = self.skill_scores.get(skill).copied().unwrap_or(0);
        score as f64 / count as f64
    }

    /// Mean rating divided by `rating_scale`, the contract-versioned factor the
    /// stored totals carry. Zero when there are no ratings.
    pub fn overall_average(&self, rating_scale: u64) -> f64 {
        if self.rating_count == 0 || rating_scale == 0 {
            return 0.0;
        }
        self.total_rating as f64 / self.rating_count as f64 / rating_scale as f64
    }

    pub fn completion_rate(&self) -> f64 {
        if self.total_jobs == 0 {
            return 0.0;
        }
        self.completed_jobs as f64 / self.total_jobs as f64
    }
}

impl FromMoveObject for ReputationProfile {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self> {
        if !type_matches(&content.type_name, "Reputation") && !type_matches(&content.type_name, "ReputationProfile") {
            return None;
        }
        let fields = struct_fields(&content.fields)?;

        // A dynamic field keeps the owner in its `name`; the struct may repeat it as `user`.
        let user = decode_address(field(fields, "user"))
            .or_else(|| content.fields.get("name").and_then(decode_address))
            .unwrap_or_default();

        Some(ReputationProfile {
            user,
            total_jobs: decode_u64_or_zero(field(fields, "total_jobs")),
            completed_jobs: decode_u64_or_zero(field(fields, "completed_jobs")),
            total_rating: decode_u64_or_zero(field(fields, "total_rating")),
            rating_count: decode_u64_or_zero(field(fields, "rating_count")),
            skill_scores: decode_vec_map_u64(field(fields, "skill_scores")),
            skill_counts: decode_vec_map_u64(field(fields, "skill_counts")),
        })
    }
}
