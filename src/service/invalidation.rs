// Cache invalidation pairing system
use serde::{Deserialize, Serialize};

use crate::service::cache::{keys, QueryCache};

/// Mutating actions a client can ask the relay to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    PostJob,
    UpdateJob,
    ApplyToJob,
    HireAndFund,
    MarkDelivered,
    ApproveAndRelease,
    InitiateDispute,
    ResolveDispute,
    CreateProfile,
    UpdateProfile,
    SubmitRating,
}

impl IntentAction {
    pub fn to_str(&self) -> &'static str {
        match self {
            IntentAction::PostJob => "post_job",
            IntentAction::UpdateJob => "update_job",
            IntentAction::ApplyToJob => "apply_to_job",
            IntentAction::HireAndFund => "hire_and_fund",
            IntentAction::MarkDelivered => "mark_delivered",
            IntentAction::ApproveAndRelease => "approve_and_release",
            IntentAction::InitiateDispute => "initiate_dispute",
            IntentAction::ResolveDispute => "resolve_dispute",
            IntentAction::CreateProfile => "create_profile",
            IntentAction::UpdateProfile => "update_profile",
            IntentAction::SubmitRating => "submit_rating",
        }
    }
}

/// Cache invalidation groups - queries that a set of actions makes stale
#[derive(Debug, Clone)]
pub struct CacheGroup {
    pub name: String,
    pub keys: Vec<String>,
    pub prefixes: Vec<String>,
    pub mutate_actions: Vec<IntentAction>,
}

impl CacheGroup {
    pub fn new(name: &str, keys: Vec<&str>, prefixes: Vec<&str>, mutate_actions: Vec<IntentAction>) -> Self {
        Self {
            name: name.to_string(),
            keys: keys.iter().map(|s| s.to_string()).collect(),
            prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            mutate_actions,
        }
    }
}

/// Cache invalidation configuration
pub struct CacheInvalidationConfig {
    pub groups: Vec<CacheGroup>,
}

impl CacheInvalidationConfig {
    pub fn new() -> Self {
        use IntentAction::*;

        let groups = vec![
            // JOB GROUP - listings and single-job reads
            CacheGroup::new(
                "jobs",
                vec![keys::JOBS],
                vec![keys::JOB_PREFIX],
                vec![PostJob, UpdateJob, HireAndFund, ApproveAndRelease, ResolveDispute],
            ),
            // APPLICATION GROUP - an edit also fences old applications
            CacheGroup::new(
                "applications",
                vec![],
                vec![keys::APPLICATIONS_PREFIX],
                vec![UpdateJob, ApplyToJob, HireAndFund],
            ),
            // ESCROW GROUP
            CacheGroup::new(
                "escrows",
                vec![keys::ESCROWS],
                vec![],
                vec![HireAndFund, MarkDelivered, ApproveAndRelease, InitiateDispute, ResolveDispute],
            ),
            // PROFILE GROUP
            CacheGroup::new(
                "profiles",
                vec![keys::PROFILES, keys::CANDIDATES],
                vec![],
                vec![CreateProfile, UpdateProfile],
            ),
            // REPUTATION GROUP - candidate cards embed reputation
            CacheGroup::new(
                "reputation",
                vec![keys::CANDIDATES],
                vec![keys::REPUTATION_PREFIX],
                vec![SubmitRating, ApproveAndRelease],
            ),
            // ROLE GROUP - has_posted_jobs
            CacheGroup::new("roles", vec![], vec![keys::ROLES_PREFIX], vec![PostJob]),
        ];

        Self { groups }
    }

    pub fn groups_for(&self, action: IntentAction) -> Vec<&CacheGroup> {
        self.groups
            .iter()
            .filter(|group| group.mutate_actions.contains(&action))
            .collect()
    }

    /// Invalidate everything `action` makes stale; returns the group names.
    pub async fn invalidate_for(&self, cache: &QueryCache, action: IntentAction) -> Vec<String> {
        let groups = self.groups_for(action);

        for group in &groups {
            for key in &group.keys {
                cache.invalidate(key).await;
            }
            for prefix in &group.prefixes {
                cache.invalidate_prefix(prefix).await;
            }
        }

        let names: Vec<String> = groups.iter().map(|group| group.name.clone()).collect();
        tracing::debug!("{} invalidated cache groups {:?}", action.to_str(), names);
        names
    }
}

impl Default for CacheInvalidationConfig {
    fn default() -> Self {
        Self::new()
    }
}
