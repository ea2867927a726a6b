// ledger/types.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of an object read. Per-id failures are values, not errors, so a
/// batch read never fails because a single object is missing.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainObject {
    Found(MoveObjectContent),
    Absent,
    Errored(String),
}

impl ChainObject {
    pub fn content(&self) -> Option<&MoveObjectContent> {
        match self {
            ChainObject::Found(content) => Some(content),
            _ => None,
        }
    }

    /// Map one entry of a `sui_getObject` / `sui_multiGetObjects` response.
    pub fn from_rpc_response(response: &Value) -> Self {
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
            if code == "notExists" || code == "deleted" {
                return ChainObject::Absent;
            }
            return ChainObject::Errored(error.to_string());
        }

        let Some(data) = response.get("data").filter(|d| !d.is_null()) else {
            return ChainObject::Absent;
        };

        let Some(content) = data.get("content").filter(|c| !c.is_null()) else {
            return ChainObject::Errored("object response carries no content".to_string());
        };

        if content.get("dataType").and_then(Value::as_str) != Some("moveObject") {
            return ChainObject::Errored(format!(
                "unsupported content type {}",
                content.get("dataType").unwrap_or(&Value::Null)
            ));
        }

        ChainObject::Found(MoveObjectContent {
            object_id: data
                .get("objectId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            type_name: content
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            version: data
                .get("version")
                .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64())),
            fields: content.get("fields").cloned().unwrap_or(Value::Null),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveObjectContent {
    pub object_id: String,
    pub type_name: String,
    pub version: Option<u64>,
    pub fields: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub type_name: String,
    pub sender: Option<String>,
    pub timestamp_ms: Option<u64>,
    pub parsed_json: Value,
}

impl ChainEvent {
    pub fn from_rpc_event(event: &Value) -> Self {
        Self {
            type_name: event
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            sender: event.get("sender").and_then(Value::as_str).map(str::to_string),
            timestamp_ms: event
                .get("timestampMs")
                .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64())),
            parsed_json: event.get("parsedJson").cloned().unwrap_or(Value::Null),
        }
    }

    /// Suffix match against the fully qualified event type, e.g. `::JobCreated`.
    /// Generic instantiations (`::EscrowCreated<0x2::sui::SUI>`) match on the base name.
    pub fn matches_suffix(&self, suffix: &str) -> bool {
        let base = self
            .type_name
            .split_once('<')
            .map(|(base, _)| base)
            .unwrap_or(&self.type_name);
        base.ends_with(suffix)
    }
}

/// A Move module, `package::module`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    pub package: String,
    pub module: String,
}

impl ModuleRef {
    pub fn new(package: &str, module: &str) -> Self {
        Self {
            package: package.to_string(),
            module: module.to_string(),
        }
    }
}

/// A callable entry point, `package::module::function`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTarget {
    pub package: String,
    pub module: String,
    pub function: String,
}

impl CallTarget {
    pub fn new(module: &ModuleRef, function: &str) -> Self {
        Self {
            package: module.package.clone(),
            module: module.module.clone(),
            function: function.to_string(),
        }
    }
}

impl std::fmt::Display for CallTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Arguments a read-only call may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimArg {
    /// A shared object passed by immutable reference.
    SharedObject(String),
    Address(String),
    U64(u64),
}

/// `returnValues` of the first command: `[[bytes, typeTag], ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationResult {
    pub return_values: Vec<(Vec<u8>, String)>,
}

impl SimulationResult {
    /// First byte of the first return value, `1` meaning `true`.
    pub fn first_bool(&self) -> Option<bool> {
        self.return_values
            .first()
            .and_then(|(bytes, _)| bytes.first())
            .map(|byte| *byte == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_found_object() {
        let response = json!({
            "data": {
                "objectId": "0xabc",
                "version": "12",
                "content": {
                    "dataType": "moveObject",
                    "type": "0x1::job::Job",
                    "fields": { "title": "Build" }
                }
            }
        });
        let object = ChainObject::from_rpc_response(&response);
        let content = object.content().unwrap();
        assert_eq!(content.object_id, "0xabc");
        assert_eq!(content.version, Some(12));
        assert_eq!(content.fields["title"], json!("Build"));
    }

    #[test]
    fn test_absent_and_errored_objects() {
        let missing = json!({ "error": { "code": "notExists", "object_id": "0x1" } });
        assert_eq!(ChainObject::from_rpc_response(&missing), ChainObject::Absent);

        let package = json!({ "data": { "objectId": "0x2", "content": { "dataType": "package" } } });
        assert!(matches!(ChainObject::from_rpc_response(&package), ChainObject::Errored(_)));

        let weird = json!({ "error": { "code": "displayError" } });
        assert!(matches!(ChainObject::from_rpc_response(&weird), ChainObject::Errored(_)));
    }

    #[test]
    fn test_event_suffix_matching() {
        let event = ChainEvent::from_rpc_event(&json!({
            "type": "0xpkg::escrow::EscrowCreated<0x2::sui::SUI>",
            "parsedJson": { "escrow_id": "0x9" },
            "timestampMs": "1700000000000"
        }));
        assert!(event.matches_suffix("::EscrowCreated"));
        assert!(!event.matches_suffix("::JobCreated"));
        assert_eq!(event.timestamp_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn test_first_bool() {
        let yes = SimulationResult { return_values: vec![(vec![1], "bool".to_string())] };
        let no = SimulationResult { return_values: vec![(vec![0], "bool".to_string())] };
        assert_eq!(yes.first_bool(), Some(true));
        assert_eq!(no.first_bool(), Some(false));
        assert_eq!(SimulationResult::default().first_bool(), None);
    }
}
