// service/resolver.rs
use std::sync::Arc;

use crate::{
    ledger::{
        types::{ChainObject, ModuleRef},
        LedgerReader,
    },
    models::FromMoveObject,
    service::error::ServiceError,
    utils::move_decode::decode_address,
};

/// Where creation events for one entity kind live and which payload field
/// carries the new object's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSource {
    pub module: &'static str,
    pub suffix: &'static str,
    pub id_field: &'static str,
}

pub const JOB_CREATED: EventSource = EventSource {
    module: "job",
    suffix: "::JobCreated",
    id_field: "job_id",
};

pub const APPLICATION_CREATED: EventSource = EventSource {
    module: "job",
    suffix: "::JobApplicationCreated",
    id_field: "application_id",
};

pub const ESCROW_CREATED: EventSource = EventSource {
    module: "escrow",
    suffix: "::EscrowCreated",
    id_field: "escrow_id",
};

pub const PROFILE_CREATED: EventSource = EventSource {
    module: "profile",
    suffix: "::ProfileCreated",
    id_field: "profile_id",
};

/// Discovers entities from their creation events, then reads their current
/// state in one batch.
#[derive(Clone)]
pub struct EventResolver {
    ledger: Arc<dyn LedgerReader>,
    package_id: String,
    event_limit: usize,
}

impl EventResolver {
    pub fn new(ledger: Arc<dyn LedgerReader>, package_id: String, event_limit: usize) -> Self {
        Self {
            ledger,
            package_id,
            event_limit,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerReader> {
        &self.ledger
    }

    /// Ids referenced by matching events, newest first. Not deduplicated.
    pub async fn object_ids(&self, source: EventSource) -> Result<Vec<String>, ServiceError> {
        let module = ModuleRef::new(&self.package_id, source.module);
        let events = self.ledger.query_events(&module, self.event_limit).await.map_err(|e| {
            tracing::error!("Event query for {}::{} failed: {}", self.package_id, source.module, e);
            e
        })?;

        let ids: Vec<String> = events
            .iter()
            .filter(|event| event.matches_suffix(source.suffix))
            .filter_map(|event| {
                let id = event.parsed_json.get(source.id_field).and_then(decode_address);
                if id.is_none() {
                    tracing::warn!("{} event without a {} field", source.suffix, source.id_field);
                }
                id
            })
            .collect();

        tracing::debug!(
            "{} of {} events in {} match {}",
            ids.len(),
            events.len(),
            source.module,
            source.suffix
        );
        Ok(ids)
    }

    /// Resolve every entity announced by `source`. Objects that are gone,
    /// errored or fail to decode are dropped; only a failed event query or a
    /// failed batch read is an error.
    pub async fn resolve<T: FromMoveObject>(&self, source: EventSource) -> Result<Vec<T>, ServiceError> {
        let ids = self.object_ids(source).await?;
        self.fetch_all(&ids).await
    }

    /// Batch read and decode, keeping the order of `ids`.
    pub async fn fetch_all<T: FromMoveObject>(&self, ids: &[String]) -> Result<Vec<T>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let objects = self.ledger.multi_get_objects(ids).await.map_err(|e| {
            tracing::error!("Batch read of {} objects failed: {}", ids.len(), e);
            e
        })?;

        let decoded: Vec<T> = ids
            .iter()
            .zip(objects.iter())
            .filter_map(|(id, object)| decode_or_log(id, object))
            .collect();

        if decoded.len() < ids.len() {
            tracing::info!("Resolved {} of {} objects", decoded.len(), ids.len());
        }
        Ok(decoded)
    }

    /// Single read; `None` when the object is absent or not a `T`.
    pub async fn fetch_one<T: FromMoveObject>(&self, id: &str) -> Result<Option<T>, ServiceError> {
        let object = self.ledger.get_object(id).await?;
        Ok(decode_or_log(id, &object))
    }
}

fn decode_or_log<T: FromMoveObject>(id: &str, object: &ChainObject) -> Option<T> {
    match object {
        ChainObject::Found(_) => {
            let decoded = T::from_chain_object(object);
            if decoded.is_none() {
                tracing::warn!("Object {} does not decode as the expected type", id);
            }
            decoded
        }
        ChainObject::Absent => {
            tracing::debug!("Object {} no longer exists", id);
            None
        }
        ChainObject::Errored(reason) => {
            tracing::warn!("Object {} could not be read: {}", id, reason);
            None
        }
    }
}
