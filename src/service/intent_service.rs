// service/intent_service.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    models::escrowmodel::EscrowTransition,
    service::{
        cache::QueryCache,
        error::ServiceError,
        escrow_service::EscrowService,
        invalidation::{CacheInvalidationConfig, IntentAction},
    },
    utils::{
        address::{is_valid_address, normalize_address},
        currency::parse_sui_to_mist,
    },
};

const AMOUNT_FIELDS: [&str; 3] = ["price", "amount", "proposed_price"];

/// A mutating action described by the client. The payload is opaque here;
/// the relay builds and signs the actual transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    pub sender: String,
    #[serde(default)]
    pub payload: Value,
}

impl Intent {
    /// The escrow transition an action performs, for actions on an existing escrow.
    pub fn escrow_transition(&self) -> Option<EscrowTransition> {
        match self.action {
            IntentAction::MarkDelivered => Some(EscrowTransition::DELIVER),
            IntentAction::ApproveAndRelease => Some(EscrowTransition::RELEASE),
            IntentAction::InitiateDispute => Some(EscrowTransition::DISPUTE),
            IntentAction::ResolveDispute => Some(EscrowTransition::RESOLVE),
            _ => None,
        }
    }

    pub fn escrow_id(&self) -> Option<&str> {
        self.payload.get("escrow_id").and_then(Value::as_str)
    }
}

/// Rewrites decimal SUI strings in the payload's amount fields as integer MIST.
/// Numbers are taken to be MIST already.
pub fn normalize_amounts(payload: &mut Value) -> Result<(), ServiceError> {
    let Some(fields) = payload.as_object_mut() else {
        return Ok(());
    };

    for name in AMOUNT_FIELDS {
        if let Some(Value::String(amount)) = fields.get(name) {
            let mist = parse_sui_to_mist(amount).map_err(|e| ServiceError::Validation(format!("{}: {}", name, e)))?;
            fields.insert(name.to_string(), Value::from(mist));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub digest: String,
    #[serde(default)]
    pub invalidated: Vec<String>,
}

#[async_trait]
pub trait IntentSubmitter: Send + Sync {
    async fn submit(&self, intent: &Intent) -> Result<SubmissionReceipt, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    success: bool,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Posts intents as JSON to an external relay that signs and executes them.
pub struct RelaySubmitter {
    http_client: reqwest::Client,
    relay_url: String,
}

impl RelaySubmitter {
    pub fn new(relay_url: String, timeout_secs: u64) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            relay_url,
        }
    }
}

#[async_trait]
impl IntentSubmitter for RelaySubmitter {
    async fn submit(&self, intent: &Intent) -> Result<SubmissionReceipt, ServiceError> {
        let response = self
            .http_client
            .post(&self.relay_url)
            .json(intent)
            .send()
            .await
            .map_err(|e| ServiceError::Submission(format!("relay unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Submission(format!("relay returned {}: {}", status, body)));
        }

        let body: RelayResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Submission(format!("unreadable relay response: {}", e)))?;

        match (body.success, body.digest) {
            (true, Some(digest)) => Ok(SubmissionReceipt {
                digest,
                invalidated: Vec::new(),
            }),
            (true, None) => Err(ServiceError::Submission("relay reported success without a digest".to_string())),
            (false, _) => Err(ServiceError::Submission(
                body.error.unwrap_or_else(|| "transaction rejected".to_string()),
            )),
        }
    }
}

/// Submits intents and refreshes the queries they make stale. Nothing is
/// invalidated unless the submission succeeded.
pub struct TransactionService {
    submitter: Option<Arc<dyn IntentSubmitter>>,
    escrow_service: Arc<EscrowService>,
    cache: Arc<QueryCache>,
    invalidation: CacheInvalidationConfig,
}

impl TransactionService {
    pub fn new(
        submitter: Option<Arc<dyn IntentSubmitter>>,
        escrow_service: Arc<EscrowService>,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            submitter,
            escrow_service,
            cache,
            invalidation: CacheInvalidationConfig::new(),
        }
    }

    pub async fn execute(&self, mut intent: Intent) -> Result<SubmissionReceipt, ServiceError> {
        let submitter = self
            .submitter
            .as_ref()
            .ok_or(ServiceError::NotConfigured("INTENT_RELAY_URL"))?;

        if !is_valid_address(&intent.sender) {
            return Err(ServiceError::Validation(format!("invalid sender {}", intent.sender)));
        }
        intent.sender = normalize_address(&intent.sender);
        normalize_amounts(&mut intent.payload)?;

        if let Some(transition) = intent.escrow_transition() {
            let escrow_id = intent
                .escrow_id()
                .ok_or_else(|| ServiceError::Validation(format!("{} requires escrow_id", intent.action.to_str())))?;
            self.escrow_service.check_transition(escrow_id, transition).await?;
        }

        let mut receipt = match submitter.submit(&intent).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!("{} from {} failed: {}", intent.action.to_str(), intent.sender, e);
                return Err(e);
            }
        };

        tracing::info!("{} from {} succeeded: {}", intent.action.to_str(), intent.sender, receipt.digest);
        receipt.invalidated = self.invalidation.invalidate_for(&self.cache, intent.action).await;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::mock::MockLedger,
        models::escrowmodel::{fixtures::escrow_fields, EscrowStatus},
        service::{cache::keys, job_service::JobService, resolver::EventResolver},
    };
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: Mutex<Vec<IntentAction>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl IntentSubmitter for RecordingSubmitter {
        async fn submit(&self, intent: &Intent) -> Result<SubmissionReceipt, ServiceError> {
            self.submitted.lock().unwrap().push(intent.action);
            match &self.reject_with {
                Some(message) => Err(ServiceError::Submission(message.clone())),
                None => Ok(SubmissionReceipt {
                    digest: "9xDigest".to_string(),
                    invalidated: Vec::new(),
                }),
            }
        }
    }

    struct Fixture {
        service: TransactionService,
        submitter: Arc<RecordingSubmitter>,
        cache: Arc<QueryCache>,
    }

    fn fixture(submitter: RecordingSubmitter) -> Fixture {
        let ledger = Arc::new(MockLedger::new());
        ledger.insert_object(
            "0xe1",
            "0xpkg::escrow::Escrow",
            escrow_fields("0xj1", "0xa", "0xb", json!(null)),
        );
        let delivered = escrow_fields("0xj1", "0xa", "0xb", json!({ "vec": ["blob-1"] }));
        let mut disputed = delivered.clone();
        disputed["dispute_active"] = json!(true);
        ledger.insert_object("0xe2", "0xpkg::escrow::Escrow", delivered);
        ledger.insert_object("0xe3", "0xpkg::escrow::Escrow", disputed);

        let cache = Arc::new(QueryCache::new(30));
        let resolver = EventResolver::new(ledger, "0xpkg".to_string(), 100);
        let jobs = Arc::new(JobService::new(resolver.clone(), cache.clone()));
        let escrows = Arc::new(EscrowService::new(resolver, cache.clone(), jobs));
        let submitter = Arc::new(submitter);

        Fixture {
            service: TransactionService::new(Some(submitter.clone()), escrows, cache.clone()),
            submitter,
            cache,
        }
    }

    fn intent(action: IntentAction, payload: Value) -> Intent {
        Intent {
            action,
            sender: "0xA".to_string(),
            payload,
        }
    }

    async fn warm(cache: &QueryCache) {
        let ttl = Duration::from_secs(30);
        for key in [keys::ESCROWS, keys::JOBS] {
            let _: u64 = cache.get_or_fetch(key, ttl, || async { Ok(1) }).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_success_invalidates_groups() {
        let fixture = fixture(RecordingSubmitter::default());
        warm(&fixture.cache).await;

        let receipt = fixture
            .service
            .execute(intent(IntentAction::MarkDelivered, json!({ "escrow_id": "0xe1", "work_oid": "blob-1" })))
            .await
            .unwrap();

        assert_eq!(receipt.digest, "9xDigest");
        assert_eq!(receipt.invalidated, vec!["escrows"]);
        assert_eq!(fixture.cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_keeps_cache() {
        let fixture = fixture(RecordingSubmitter {
            reject_with: Some("InsufficientGas".to_string()),
            ..Default::default()
        });
        warm(&fixture.cache).await;

        let result = fixture.service.execute(intent(IntentAction::PostJob, json!({ "title": "x" }))).await;

        match result {
            Err(ServiceError::Submission(message)) => assert_eq!(message, "InsufficientGas"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fixture.cache.stats().await.entries, 2);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_not_submitted() {
        let fixture = fixture(RecordingSubmitter::default());

        let result = fixture
            .service
            .execute(intent(IntentAction::ApproveAndRelease, json!({ "escrow_id": "0xe1" })))
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidEscrowTransition { .. })));
        assert!(fixture.submitter.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_and_resolve_need_their_own_status() {
        let fixture = fixture(RecordingSubmitter::default());

        let release_disputed = fixture
            .service
            .execute(intent(IntentAction::ApproveAndRelease, json!({ "escrow_id": "0xe3" })))
            .await;
        let resolve_delivered = fixture
            .service
            .execute(intent(IntentAction::ResolveDispute, json!({ "escrow_id": "0xe2" })))
            .await;

        assert!(matches!(
            release_disputed,
            Err(ServiceError::InvalidEscrowTransition {
                from: EscrowStatus::Disputed,
                to: EscrowStatus::Released
            })
        ));
        assert!(matches!(
            resolve_delivered,
            Err(ServiceError::InvalidEscrowTransition {
                from: EscrowStatus::Delivered,
                to: EscrowStatus::Released
            })
        ));
        assert!(fixture.submitter.submitted.lock().unwrap().is_empty());

        fixture
            .service
            .execute(intent(IntentAction::ResolveDispute, json!({ "escrow_id": "0xe3" })))
            .await
            .unwrap();
        fixture
            .service
            .execute(intent(IntentAction::ApproveAndRelease, json!({ "escrow_id": "0xe2" })))
            .await
            .unwrap();
        assert_eq!(
            *fixture.submitter.submitted.lock().unwrap(),
            vec![IntentAction::ResolveDispute, IntentAction::ApproveAndRelease]
        );
    }

    #[tokio::test]
    async fn test_escrow_action_requires_escrow_id() {
        let fixture = fixture(RecordingSubmitter::default());
        let result = fixture.service.execute(intent(IntentAction::InitiateDispute, json!({}))).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_amounts_become_mist() {
        let mut payload = json!({ "title": "Logo", "price": "2.5", "amount": 7, "proposed_price": ".25" });
        normalize_amounts(&mut payload).unwrap();
        assert_eq!(payload["price"], 2_500_000_000u64);
        assert_eq!(payload["amount"], 7);
        assert_eq!(payload["proposed_price"], 250_000_000u64);
        assert_eq!(payload["title"], "Logo");

        let mut bad = json!({ "price": "-1" });
        assert!(matches!(normalize_amounts(&mut bad), Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bad_amount_is_not_submitted() {
        let fixture = fixture(RecordingSubmitter::default());
        let result = fixture.service.execute(intent(IntentAction::PostJob, json!({ "price": "lots" }))).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(fixture.submitter.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_relay() {
        let fixture = fixture(RecordingSubmitter::default());
        let service = TransactionService::new(None, fixture.service.escrow_service.clone(), fixture.cache.clone());
        let result = service.execute(intent(IntentAction::PostJob, json!({}))).await;
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }
}
