// service/profile_service.rs
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ledger::types::ChainObject,
    models::{
        profilemodel::Profile,
        reputationmodel::ReputationProfile,
        FromMoveObject,
    },
    service::{
        cache::{keys, QueryCache, REPUTATION_CACHE_TTL},
        error::ServiceError,
        resolver::{EventResolver, PROFILE_CREATED},
    },
    utils::address::normalize_address,
};

/// Candidate card: profile plus whatever reputation could be read for its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateWithReputation {
    pub profile: Profile,
    /// `None` when the reputation read failed; an owner with no ratings yet
    /// gets an empty profile instead.
    pub reputation: Option<ReputationProfile>,
    pub average_rating: f64,
}

#[derive(Clone)]
pub struct ProfileService {
    resolver: EventResolver,
    cache: Arc<QueryCache>,
    reputation_registry_id: String,
    rating_scale: u64,
}

impl ProfileService {
    pub fn new(
        resolver: EventResolver,
        cache: Arc<QueryCache>,
        reputation_registry_id: String,
        rating_scale: u64,
    ) -> Self {
        Self {
            resolver,
            cache,
            reputation_registry_id,
            rating_scale,
        }
    }

    pub fn rating_scale(&self) -> u64 {
        self.rating_scale
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ServiceError> {
        self.cache
            .get_or_fetch(keys::PROFILES, self.cache.default_ttl(), || {
                self.resolver.resolve::<Profile>(PROFILE_CREATED)
            })
            .await
    }

    /// Every profile an identity owns, of either kind. There may be several.
    pub async fn profiles_owned_by(&self, address: &str) -> Result<Vec<Profile>, ServiceError> {
        let owner = normalize_address(address);
        let profiles = self.list_profiles().await?;
        Ok(profiles.into_iter().filter(|profile| profile.owner == owner).collect())
    }

    /// Reputation is a dynamic field of the registry keyed by address. An
    /// identity that was never rated has no field and gets an empty profile.
    pub async fn reputation_of(&self, address: &str) -> Result<ReputationProfile, ServiceError> {
        let user = normalize_address(address);
        let key = keys::reputation(&user);

        self.cache
            .get_or_fetch(&key, Duration::from_secs(REPUTATION_CACHE_TTL), || async {
                let object = self
                    .resolver
                    .ledger()
                    .get_dynamic_field_object(&self.reputation_registry_id, "address", json!(user))
                    .await?;

                let reputation = match &object {
                    ChainObject::Found(_) => ReputationProfile::from_chain_object(&object).unwrap_or_else(|| {
                        tracing::warn!("Reputation entry for {} does not decode", user);
                        ReputationProfile::empty(&user)
                    }),
                    ChainObject::Absent => ReputationProfile::empty(&user),
                    ChainObject::Errored(reason) => {
                        tracing::warn!("Reputation entry for {} could not be read: {}", user, reason);
                        ReputationProfile::empty(&user)
                    }
                };

                Ok(ReputationProfile {
                    user: user.clone(),
                    ..reputation
                })
            })
            .await
    }

    /// Candidate profiles, each with its owner's reputation. Reputation reads
    /// run concurrently; one failing read leaves that candidate without a
    /// reputation and does not affect the others.
    pub async fn candidates_with_reputation(&self) -> Result<Vec<CandidateWithReputation>, ServiceError> {
        self.cache
            .get_or_fetch(keys::CANDIDATES, self.cache.default_ttl(), || self.fetch_candidates())
            .await
    }

    async fn fetch_candidates(&self) -> Result<Vec<CandidateWithReputation>, ServiceError> {
        let candidates: Vec<Profile> = self
            .list_profiles()
            .await?
            .into_iter()
            .filter(Profile::is_candidate)
            .collect();

        let reputations = join_all(candidates.iter().map(|profile| async move {
            match self.reputation_of(&profile.owner).await {
                Ok(reputation) => Some(reputation),
                Err(e) => {
                    tracing::warn!("Reputation for candidate {} unavailable: {}", profile.owner, e);
                    None
                }
            }
        }))
        .await;

        Ok(candidates
            .into_iter()
            .zip(reputations)
            .map(|(profile, reputation)| CandidateWithReputation {
                average_rating: reputation
                    .as_ref()
                    .map(|r| r.overall_average(self.rating_scale))
                    .unwrap_or(0.0),
                profile,
                reputation,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::mock::MockLedger,
        models::{
            profilemodel::fixtures::{candidate_fields, employer_fields},
            reputationmodel::fixtures::reputation_fields,
        },
    };

    const REGISTRY: &str = "0xfeed";
    const REPUTATION_TYPE: &str = "0x2::dynamic_field::Field<address, 0xpkg::reputation::Reputation>";

    fn service(ledger: Arc<MockLedger>, rating_scale: u64) -> ProfileService {
        ProfileService::new(
            EventResolver::new(ledger, "0xpkg".to_string(), 100),
            Arc::new(QueryCache::new(30)),
            REGISTRY.to_string(),
            rating_scale,
        )
    }

    fn seed_profile(ledger: &MockLedger, id: &str, type_name: &str, fields: serde_json::Value) {
        ledger.insert_object(id, type_name, fields);
        ledger.push_event("profile", "0xpkg::profile::ProfileCreated", json!({ "profile_id": id }));
    }

    #[tokio::test]
    async fn test_owner_may_hold_several_profiles() {
        let ledger = Arc::new(MockLedger::new());
        seed_profile(&ledger, "0x1", "0xpkg::profile::CandidateProfile", candidate_fields("0xc1", "Ada"));
        seed_profile(&ledger, "0x2", "0xpkg::profile::EmployerProfile", employer_fields("0xC1", "Ada Corp"));
        seed_profile(&ledger, "0x3", "0xpkg::profile::CandidateProfile", candidate_fields("0xc2", "Bob"));

        let owned = service(ledger, 1).profiles_owned_by("0xc1").await.unwrap();
        let names: Vec<&str> = owned.iter().map(Profile::name).collect();
        assert_eq!(names, vec!["Ada", "Ada Corp"]);
    }

    #[tokio::test]
    async fn test_unrated_identity_has_empty_reputation() {
        let ledger = Arc::new(MockLedger::new());
        let reputation = service(ledger, 1).reputation_of("0xC9").await.unwrap();

        assert_eq!(reputation.user, normalize_address("0xc9"));
        assert_eq!(reputation.rating_count, 0);
        assert_eq!(reputation.average_for_skill("rust"), 0.0);
    }

    #[tokio::test]
    async fn test_candidate_reputations_are_isolated() {
        let ledger = Arc::new(MockLedger::new());
        seed_profile(&ledger, "0x1", "0xpkg::profile::CandidateProfile", candidate_fields("0xc1", "Ada"));
        seed_profile(&ledger, "0x2", "0xpkg::profile::CandidateProfile", candidate_fields("0xc2", "Bob"));
        seed_profile(&ledger, "0x3", "0xpkg::profile::EmployerProfile", employer_fields("0xe1", "Corp"));
        ledger.insert_dynamic_field(REGISTRY, "0xc1", REPUTATION_TYPE, reputation_fields("0xc1"));
        ledger
            .failing_dynamic_fields
            .lock()
            .unwrap()
            .push(normalize_address("0xc2"));

        let candidates = service(ledger, 1).candidates_with_reputation().await.unwrap();

        assert_eq!(candidates.len(), 2);
        let ada = &candidates[0];
        assert_eq!(ada.profile.name(), "Ada");
        assert_eq!(ada.reputation.as_ref().map(|r| r.completed_jobs), Some(3));
        assert!((ada.average_rating - 14.0 / 3.0).abs() < 1e-9);

        let bob = &candidates[1];
        assert_eq!(bob.profile.name(), "Bob");
        assert_eq!(bob.reputation, None);
        assert_eq!(bob.average_rating, 0.0);
    }

    #[tokio::test]
    async fn test_rating_scale_applies() {
        let ledger = Arc::new(MockLedger::new());
        seed_profile(&ledger, "0x1", "0xpkg::profile::CandidateProfile", candidate_fields("0xc1", "Ada"));
        ledger.insert_dynamic_field(REGISTRY, "0xc1", REPUTATION_TYPE, reputation_fields("0xc1"));

        let candidates = service(ledger, 2).candidates_with_reputation().await.unwrap();
        assert!((candidates[0].average_rating - 14.0 / 3.0 / 2.0).abs() < 1e-9);
    }
}
