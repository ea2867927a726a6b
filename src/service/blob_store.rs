// service/blob_store.rs
use std::time::Duration;

use serde_json::Value;

use crate::service::error::ServiceError;

/// Storage epochs requested for each upload.
pub const DEFAULT_EPOCHS: u32 = 5;

/// Thin wrapper over a Walrus publisher (uploads) and aggregator (reads).
#[derive(Debug, Clone)]
pub struct BlobStore {
    http_client: reqwest::Client,
    publisher_url: String,
    aggregator_url: String,
}

impl BlobStore {
    pub fn new(publisher_url: &str, aggregator_url: &str, timeout_secs: u64) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            publisher_url: publisher_url.trim_end_matches('/').to_string(),
            aggregator_url: aggregator_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store `bytes` and return the blob id.
    pub async fn put(&self, bytes: Vec<u8>) -> Result<String, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("cannot store an empty blob".to_string()));
        }

        let size = bytes.len();
        let response = self
            .http_client
            .put(format!("{}/v1/blobs?epochs={}", self.publisher_url, DEFAULT_EPOCHS))
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::BlobStore(format!("publisher unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::BlobStore(format!("publisher returned {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::BlobStore(format!("unreadable publisher response: {}", e)))?;

        let blob_id = blob_id_from_response(&body)
            .ok_or_else(|| ServiceError::BlobStore("publisher response carries no blob id".to_string()))?;

        tracing::info!("Stored blob {} ({} bytes)", blob_id, size);
        Ok(blob_id)
    }

    pub fn url(&self, blob_id: &str) -> String {
        format!("{}/v1/blobs/{}", self.aggregator_url, blob_id)
    }
}

/// A fresh upload reports `newlyCreated.blobObject.blobId`; re-uploading
/// known content reports `alreadyCertified.blobId`.
pub fn blob_id_from_response(body: &Value) -> Option<String> {
    body.pointer("/newlyCreated/blobObject/blobId")
        .or_else(|| body.pointer("/alreadyCertified/blobId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
