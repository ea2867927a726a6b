mod config;
mod dtos;
mod error;
mod handler;
mod ledger;
mod models;
mod routes;
mod service;
mod utils;

use std::str::FromStr;
use std::sync::Arc;

use axum::http::{header::{ACCEPT, CONTENT_TYPE}, Method};
use config::Config;
use dotenv::dotenv;
use ledger::{rpc::SuiRpcClient, LedgerReader};
use routes::create_router;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use service::{
    blob_store::BlobStore,
    cache::QueryCache,
    escrow_service::EscrowService,
    intent_service::{IntentSubmitter, RelaySubmitter, TransactionService},
    job_service::JobService,
    profile_service::ProfileService,
    resolver::EventResolver,
    role_service::RoleService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub cache: Arc<QueryCache>,
    // Services
    pub job_service: Arc<JobService>,
    pub escrow_service: Arc<EscrowService>,
    pub profile_service: Arc<ProfileService>,
    pub role_service: Arc<RoleService>,
    pub transaction_service: Arc<TransactionService>,
    pub blob_store: Option<Arc<BlobStore>>,
}

impl AppState {
    pub fn new(
        config: Config,
        ledger: Arc<dyn LedgerReader>,
        submitter: Option<Arc<dyn IntentSubmitter>>,
    ) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache_ttl_secs));
        let resolver = EventResolver::new(ledger.clone(), config.package_id.clone(), config.event_query_limit);

        // Initialize all services
        let job_service = Arc::new(JobService::new(resolver.clone(), cache.clone()));
        let escrow_service = Arc::new(EscrowService::new(
            resolver.clone(),
            cache.clone(),
            job_service.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(
            resolver,
            cache.clone(),
            config.reputation_registry_id.clone(),
            config.rating_scale,
        ));
        let role_service = Arc::new(RoleService::new(
            ledger,
            cache.clone(),
            &config.package_id,
            &config.marketplace_id,
        ));
        let transaction_service = Arc::new(TransactionService::new(
            submitter,
            escrow_service.clone(),
            cache.clone(),
        ));

        let blob_store = match (&config.walrus_publisher_url, &config.walrus_aggregator_url) {
            (Some(publisher), Some(aggregator)) => {
                Some(Arc::new(BlobStore::new(publisher, aggregator, config.rpc_timeout_secs)))
            }
            _ => None,
        };

        Self {
            env: config,
            cache,
            job_service,
            escrow_service,
            profile_service,
            role_service,
            transaction_service,
            blob_store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;

    let level = LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::DEBUG);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .init();

    let ledger: Arc<dyn LedgerReader> = Arc::new(SuiRpcClient::new(config.rpc_url.clone(), config.rpc_timeout_secs));

    let submitter: Option<Arc<dyn IntentSubmitter>> = match &config.intent_relay_url {
        Some(url) => Some(Arc::new(RelaySubmitter::new(url.clone(), config.rpc_timeout_secs))),
        None => {
            tracing::warn!("INTENT_RELAY_URL not set - intent submission disabled");
            None
        }
    };

    if config.walrus_publisher_url.is_none() || config.walrus_aggregator_url.is_none() {
        tracing::warn!("Walrus endpoints not set - blob uploads disabled");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::DELETE]);

    let app_state = Arc::new(AppState::new(config.clone(), ledger, submitter));

    let app = create_router(app_state).layer(cors);

    tracing::info!(
        "Server is running on http://localhost:{} (rpc: {}, package: {})",
        config.port,
        config.rpc_url,
        config.package_id
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
