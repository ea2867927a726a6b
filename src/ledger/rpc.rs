// ledger/rpc.rs
//! JSON-RPC client for a Sui full node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::{
    ledger::{
        ptb::{encode_move_call, ResolvedArg},
        types::{CallTarget, ChainEvent, ChainObject, ModuleRef, SimArg, SimulationResult},
        LedgerError, LedgerReader,
    },
    utils::address::normalize_address,
};

/// Node-side cap on ids per `sui_multiGetObjects` and events per page.
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPage {
    data: Vec<Value>,
    next_cursor: Option<Value>,
    #[serde(default)]
    has_next_page: bool,
}

pub struct SuiRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
    shared_versions: RwLock<HashMap<String, u64>>,
}

impl std::fmt::Debug for SuiRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiRpcClient")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

impl SuiRpcClient {
    pub fn new(rpc_url: String, timeout_secs: u64) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            rpc_url,
            request_id: AtomicU64::new(1),
            shared_versions: RwLock::new(HashMap::new()),
        }
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R, LedgerError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        tracing::debug!("RPC {} (id {})", method, id);

        let response: JsonRpcResponse<R> = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| LedgerError::Malformed(format!("{} response missing result", method)))
    }

    fn object_options() -> Value {
        json!({ "showContent": true, "showType": true })
    }

    /// `initial_shared_version` of a shared object; fixed for the object's lifetime, so memoized.
    async fn initial_shared_version(&self, object_id: &str) -> Result<u64, LedgerError> {
        let key = normalize_address(object_id);
        if let Some(version) = self.shared_versions.read().await.get(&key) {
            return Ok(*version);
        }

        let response: Value = self
            .call("sui_getObject", json!([key, { "showOwner": true }]))
            .await?;

        let shared = response
            .pointer("/data/owner/Shared/initial_shared_version")
            .ok_or_else(|| LedgerError::Malformed(format!("object {} is not shared", key)))?;
        let version = shared
            .as_u64()
            .or_else(|| shared.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| LedgerError::Malformed(format!("bad initial_shared_version for {}", key)))?;

        self.shared_versions.write().await.insert(key, version);
        Ok(version)
    }

    async fn resolve_args(&self, args: &[SimArg]) -> Result<Vec<ResolvedArg>, LedgerError> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            resolved.push(match arg {
                SimArg::SharedObject(id) => ResolvedArg::Shared {
                    id: id.clone(),
                    initial_shared_version: self.initial_shared_version(id).await?,
                },
                SimArg::Address(address) => ResolvedArg::Address(address.clone()),
                SimArg::U64(value) => ResolvedArg::U64(*value),
            });
        }
        Ok(resolved)
    }
}

/// `returnValues` entries come back as `[[u8...], "type"]`; some nodes send the bytes base64-encoded.
fn parse_return_values(result: &Value) -> Result<SimulationResult, LedgerError> {
    let Some(values) = result.pointer("/results/0/returnValues").and_then(Value::as_array) else {
        return Ok(SimulationResult::default());
    };

    let mut return_values = Vec::with_capacity(values.len());
    for entry in values {
        let bytes = match entry.get(0) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| LedgerError::Malformed("return value is not a byte array".to_string()))?,
            Some(Value::String(encoded)) => BASE64
                .decode(encoded)
                .map_err(|e| LedgerError::Malformed(format!("return value is not base64: {}", e)))?,
            _ => return Err(LedgerError::Malformed("missing return value bytes".to_string())),
        };
        let type_tag = entry
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return_values.push((bytes, type_tag));
    }

    Ok(SimulationResult { return_values })
}

#[async_trait]
impl LedgerReader for SuiRpcClient {
    async fn get_object(&self, object_id: &str) -> Result<ChainObject, LedgerError> {
        let response: Value = self
            .call("sui_getObject", json!([object_id, Self::object_options()]))
            .await?;
        Ok(ChainObject::from_rpc_response(&response))
    }

    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<ChainObject>, LedgerError> {
        let mut objects = Vec::with_capacity(object_ids.len());

        for chunk in object_ids.chunks(MAX_PAGE_SIZE) {
            let responses: Vec<Value> = self
                .call("sui_multiGetObjects", json!([chunk, Self::object_options()]))
                .await?;

            if responses.len() != chunk.len() {
                return Err(LedgerError::Malformed(format!(
                    "asked for {} objects, node returned {}",
                    chunk.len(),
                    responses.len()
                )));
            }

            objects.extend(responses.iter().map(ChainObject::from_rpc_response));
        }

        Ok(objects)
    }

    async fn query_events(&self, module: &ModuleRef, limit: usize) -> Result<Vec<ChainEvent>, LedgerError> {
        let filter = json!({ "MoveModule": { "package": module.package, "module": module.module } });
        let mut events = Vec::new();
        let mut cursor = Value::Null;

        while events.len() < limit {
            let page_size = (limit - events.len()).min(MAX_PAGE_SIZE);
            let page: EventPage = self
                .call("suix_queryEvents", json!([filter, cursor, page_size, true]))
                .await?;

            events.extend(page.data.iter().map(ChainEvent::from_rpc_event));

            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = next,
                _ => break,
            }
        }

        events.truncate(limit);
        Ok(events)
    }

    async fn get_dynamic_field_object(
        &self,
        parent_id: &str,
        name_type: &str,
        name_value: Value,
    ) -> Result<ChainObject, LedgerError> {
        let response: Value = self
            .call(
                "suix_getDynamicFieldObject",
                json!([parent_id, { "type": name_type, "value": name_value }]),
            )
            .await?;
        Ok(ChainObject::from_rpc_response(&response))
    }

    async fn simulate(
        &self,
        sender: &str,
        target: &CallTarget,
        args: &[SimArg],
    ) -> Result<SimulationResult, LedgerError> {
        let resolved = self.resolve_args(args).await?;
        let tx_bytes = encode_move_call(target, resolved)?;

        let result: Value = self
            .call(
                "sui_devInspectTransactionBlock",
                json!([normalize_address(sender), BASE64.encode(tx_bytes), Value::Null, Value::Null]),
            )
            .await?;

        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(LedgerError::Simulation(error.to_string()));
        }

        let status = result.pointer("/effects/status/status").and_then(Value::as_str);
        if status == Some("failure") {
            let message = result
                .pointer("/effects/status/error")
                .and_then(Value::as_str)
                .unwrap_or("execution failed");
            return Err(LedgerError::Simulation(message.to_string()));
        }

        parse_return_values(&result)
    }
}
