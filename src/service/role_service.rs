// service/role_service.rs
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    ledger::{
        types::{CallTarget, ModuleRef, SimArg},
        LedgerError, LedgerReader,
    },
    service::cache::{keys, QueryCache, ROLE_CACHE_TTL},
    utils::{
        address::{normalize_address, same_identity},
        move_decode::{decode_address, field, struct_fields},
    },
};

const MARKETPLACE_MODULE: &str = "marketplace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SuperAdmin,
    Moderator,
    JobPoster,
}

impl Role {
    pub fn predicate(&self) -> &'static str {
        match self {
            Role::Admin => "is_admin",
            Role::SuperAdmin => "is_super_admin",
            Role::Moderator => "is_moderator",
            Role::JobPoster => "has_posted_jobs",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSet {
    pub address: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_moderator: bool,
    pub has_posted_jobs: bool,
}

/// Advisory role checks for UI gating. Every check answers `false` when the
/// ledger cannot answer; the contract re-checks on submission.
#[derive(Clone)]
pub struct RoleService {
    ledger: Arc<dyn LedgerReader>,
    cache: Arc<QueryCache>,
    marketplace: ModuleRef,
    marketplace_id: String,
}

impl RoleService {
    pub fn new(ledger: Arc<dyn LedgerReader>, cache: Arc<QueryCache>, package_id: &str, marketplace_id: &str) -> Self {
        Self {
            ledger,
            cache,
            marketplace: ModuleRef::new(package_id, MARKETPLACE_MODULE),
            marketplace_id: normalize_address(marketplace_id),
        }
    }

    async fn simulate_predicate(&self, role: Role, address: &str) -> Result<bool, LedgerError> {
        let target = CallTarget::new(&self.marketplace, role.predicate());
        let args = [
            SimArg::SharedObject(self.marketplace_id.clone()),
            SimArg::Address(address.to_string()),
        ];

        let result = self.ledger.simulate(address, &target, &args).await?;
        Ok(result.first_bool().unwrap_or(false))
    }

    async fn check(&self, role: Role, address: &str) -> bool {
        let address = normalize_address(address);
        match self.simulate_predicate(role, &address).await {
            Ok(holds) => holds,
            Err(e) => {
                tracing::warn!("{} check for {} failed closed: {}", role.predicate(), address, e);
                false
            }
        }
    }

    pub async fn is_admin(&self, address: &str) -> bool {
        self.check(Role::Admin, address).await
    }

    pub async fn is_moderator(&self, address: &str) -> bool {
        self.check(Role::Moderator, address).await
    }

    pub async fn has_posted_jobs(&self, address: &str) -> bool {
        self.check(Role::JobPoster, address).await
    }

    /// Packages published before `is_super_admin` existed only record a single
    /// primary admin on the marketplace object; compare against that instead.
    pub async fn is_super_admin(&self, address: &str) -> bool {
        let address = normalize_address(address);
        match self.simulate_predicate(Role::SuperAdmin, &address).await {
            Ok(holds) => holds,
            Err(e) if is_missing_function(&e.to_string()) => {
                tracing::info!("is_super_admin unavailable, comparing against marketplace admin: {}", e);
                self.is_primary_admin(&address).await
            }
            Err(e) => {
                tracing::warn!("is_super_admin check for {} failed closed: {}", address, e);
                false
            }
        }
    }

    async fn is_primary_admin(&self, address: &str) -> bool {
        let object = match self.ledger.get_object(&self.marketplace_id).await {
            Ok(object) => object,
            Err(e) => {
                tracing::warn!("Marketplace {} unreadable: {}", self.marketplace_id, e);
                return false;
            }
        };

        object
            .content()
            .and_then(|content| struct_fields(&content.fields))
            .and_then(|fields| decode_address(field(fields, "admin")))
            .map_or(false, |admin| same_identity(&admin, address))
    }

    /// All four checks, concurrently.
    pub async fn roles_of(&self, address: &str) -> RoleSet {
        let address = normalize_address(address);
        let key = keys::roles(&address);

        let fetched = self
            .cache
            .get_or_fetch(&key, Duration::from_secs(ROLE_CACHE_TTL), || async {
                let (is_admin, is_super_admin, is_moderator, has_posted_jobs) = tokio::join!(
                    self.is_admin(&address),
                    self.is_super_admin(&address),
                    self.is_moderator(&address),
                    self.has_posted_jobs(&address),
                );
                Ok(RoleSet {
                    address: address.clone(),
                    is_admin,
                    is_super_admin,
                    is_moderator,
                    has_posted_jobs,
                })
            })
            .await;

        fetched.unwrap_or_else(|e| {
            tracing::warn!("Role lookup for {} failed closed: {}", address, e);
            RoleSet {
                address: address.clone(),
                is_admin: false,
                is_super_admin: false,
                is_moderator: false,
                has_posted_jobs: false,
            }
        })
    }
}

/// Whether a failed simulation means the called function does not exist in
/// the published package, as opposed to the call itself failing.
fn is_missing_function(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("functionnotfound") || message.contains("no function was found")
}
