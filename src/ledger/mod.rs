// ledger/mod.rs
pub mod ptb;
pub mod rpc;
pub mod types;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use self::types::{CallTarget, ChainEvent, ChainObject, ModuleRef, SimArg, SimulationResult};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Read-only view of the chain. Everything this crate knows about jobs,
/// escrows and profiles comes through these five calls.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn get_object(&self, object_id: &str) -> Result<ChainObject, LedgerError>;

    /// One entry per requested id, in request order.
    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<ChainObject>, LedgerError>;

    /// Events emitted by `module`, newest first, at most `limit` of them.
    async fn query_events(&self, module: &ModuleRef, limit: usize) -> Result<Vec<ChainEvent>, LedgerError>;

    async fn get_dynamic_field_object(
        &self,
        parent_id: &str,
        name_type: &str,
        name_value: serde_json::Value,
    ) -> Result<ChainObject, LedgerError>;

    /// Execute `target` against current state without committing anything.
    async fn simulate(
        &self,
        sender: &str,
        target: &CallTarget,
        args: &[SimArg],
    ) -> Result<SimulationResult, LedgerError>;
}
