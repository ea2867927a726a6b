// ledger/mock.rs
//! In-memory ledger for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    ledger::{
        types::{CallTarget, ChainEvent, ChainObject, ModuleRef, MoveObjectContent, SimArg, SimulationResult},
        LedgerError, LedgerReader,
    },
    utils::address::normalize_address,
};

#[derive(Default)]
pub struct MockLedger {
    pub objects: Mutex<HashMap<String, ChainObject>>,
    pub events: Mutex<HashMap<String, Vec<ChainEvent>>>,
    pub dynamic_fields: Mutex<HashMap<String, ChainObject>>,
    /// Keyed by function name; `Err` strings become `LedgerError::Simulation`.
    pub simulations: Mutex<HashMap<String, Result<SimulationResult, String>>>,
    pub fail_events: Mutex<bool>,
    pub fail_multi_get: Mutex<bool>,
    pub failing_dynamic_fields: Mutex<Vec<String>>,
    pub multi_get_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&self, object_id: &str, type_name: &str, fields: Value) {
        let id = normalize_address(object_id);
        self.objects.lock().unwrap().insert(
            id.clone(),
            ChainObject::Found(MoveObjectContent {
                object_id: id,
                type_name: type_name.to_string(),
                version: Some(1),
                fields,
            }),
        );
    }

    pub fn insert_raw(&self, object_id: &str, object: ChainObject) {
        self.objects.lock().unwrap().insert(normalize_address(object_id), object);
    }

    pub fn push_event(&self, module: &str, type_name: &str, parsed_json: Value) {
        self.events
            .lock()
            .unwrap()
            .entry(module.to_string())
            .or_default()
            .push(ChainEvent {
                type_name: type_name.to_string(),
                sender: None,
                timestamp_ms: None,
                parsed_json,
            });
    }

    pub fn insert_dynamic_field(&self, parent_id: &str, name: &str, type_name: &str, value_fields: Value) {
        let key = format!("{}/{}", normalize_address(parent_id), normalize_address(name));
        self.dynamic_fields.lock().unwrap().insert(
            key,
            ChainObject::Found(MoveObjectContent {
                object_id: normalize_address(name),
                type_name: type_name.to_string(),
                version: Some(1),
                fields: serde_json::json!({
                    "id": { "id": name },
                    "name": name,
                    "value": { "type": type_name, "fields": value_fields }
                }),
            }),
        );
    }

    pub fn set_simulation(&self, function: &str, result: Result<SimulationResult, String>) {
        self.simulations.lock().unwrap().insert(function.to_string(), result);
    }

    pub fn set_bool(&self, function: &str, value: bool) {
        self.set_simulation(
            function,
            Ok(SimulationResult {
                return_values: vec![(vec![u8::from(value)], "bool".to_string())],
            }),
        );
    }

    pub fn multi_get_count(&self) -> usize {
        self.multi_get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn get_object(&self, object_id: &str) -> Result<ChainObject, LedgerError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&normalize_address(object_id))
            .cloned()
            .unwrap_or(ChainObject::Absent))
    }

    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<ChainObject>, LedgerError> {
        self.multi_get_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_multi_get.lock().unwrap() {
            return Err(LedgerError::Rpc { code: -32000, message: "batch failed".to_string() });
        }

        let objects = self.objects.lock().unwrap();
        Ok(object_ids
            .iter()
            .map(|id| objects.get(&normalize_address(id)).cloned().unwrap_or(ChainObject::Absent))
            .collect())
    }

    async fn query_events(&self, module: &ModuleRef, limit: usize) -> Result<Vec<ChainEvent>, LedgerError> {
        if *self.fail_events.lock().unwrap() {
            return Err(LedgerError::Rpc { code: -32000, message: "events unavailable".to_string() });
        }

        let events = self.events.lock().unwrap();
        Ok(events
            .get(&module.module)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_dynamic_field_object(
        &self,
        parent_id: &str,
        _name_type: &str,
        name_value: Value,
    ) -> Result<ChainObject, LedgerError> {
        let name = normalize_address(name_value.as_str().unwrap_or_default());
        if self.failing_dynamic_fields.lock().unwrap().contains(&name) {
            return Err(LedgerError::Rpc { code: -32000, message: "dynamic field lookup failed".to_string() });
        }
        let key = format!("{}/{}", normalize_address(parent_id), name);
        Ok(self
            .dynamic_fields
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(ChainObject::Absent))
    }

    async fn simulate(
        &self,
        _sender: &str,
        target: &CallTarget,
        _args: &[SimArg],
    ) -> Result<SimulationResult, LedgerError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        match self.simulations.lock().unwrap().get(&target.function) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(LedgerError::Simulation(message.clone())),
            None => Err(LedgerError::Simulation(format!(
                "FunctionNotFound: function {} not found in module",
                target
            ))),
        }
    }
}
