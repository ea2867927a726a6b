// config.rs
use anyhow::{anyhow, Context};

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub package_id: String,
    pub marketplace_id: String,
    pub reputation_registry_id: String,
    pub event_query_limit: usize,
    pub rpc_timeout_secs: u64,
    /// Divisor for stored rating totals; depends on the deployed package.
    pub rating_scale: u64,
    pub cache_ttl_secs: u64,
    pub intent_relay_url: Option<String>,
    pub walrus_publisher_url: Option<String>,
    pub walrus_aggregator_url: Option<String>,
    pub port: u16,
    pub log_level: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow!("{} must be set", name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        let rpc_url = required("SUI_RPC_URL")?;
        let package_id = required("PACKAGE_ID")?;
        let marketplace_id = required("MARKETPLACE_ID")?;
        let reputation_registry_id = required("REPUTATION_REGISTRY_ID")?;

        let event_query_limit = parsed_or("EVENT_QUERY_LIMIT", 200usize)?;
        let rpc_timeout_secs = parsed_or("RPC_TIMEOUT_SECS", 10u64)?;
        let rating_scale = parsed_or("RATING_SCALE", 1u64)?;
        let cache_ttl_secs = parsed_or("CACHE_TTL_SECS", 30u64)?;
        let port = parsed_or("PORT", 8000u16)?;

        if rating_scale == 0 {
            return Err(anyhow!("RATING_SCALE must be at least 1"));
        }

        Ok(Config {
            rpc_url,
            package_id,
            marketplace_id,
            reputation_registry_id,
            event_query_limit,
            rpc_timeout_secs,
            rating_scale,
            cache_ttl_secs,
            intent_relay_url: optional("INTENT_RELAY_URL"),
            walrus_publisher_url: optional("WALRUS_PUBLISHER_URL"),
            walrus_aggregator_url: optional("WALRUS_AGGREGATOR_URL"),
            port,
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            rpc_url: "http://127.0.0.1:9000".to_string(),
            package_id: "0xpkg".to_string(),
            marketplace_id: "0xa11".to_string(),
            reputation_registry_id: "0xfeed".to_string(),
            event_query_limit: 100,
            rpc_timeout_secs: 1,
            rating_scale: 1,
            cache_ttl_secs: 30,
            intent_relay_url: None,
            walrus_publisher_url: None,
            walrus_aggregator_url: None,
            port: 8000,
            log_level: "debug".to_string(),
        }
    }
}
