//! On-disk shapes of the desktop config file.
//!
//! Two layouts are accepted on read:
//! - object shape: `{ "mcpServers": { "<name>": { "command": ..., ... } } }`
//! - legacy list shape: `{ "mcp_servers": [ { "name": ..., ... } ] }`
//!
//! Only the object shape is ever written. Entry order in `mcpServers` is the
//! server order; `serde_json` is built with `preserve_order` so the map keeps
//! insertion order through parse and serialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::types::ServerRecord;

pub const OBJECT_FIELD: &str = "mcpServers";
pub const LEGACY_FIELD: &str = "mcp_servers";

/// Server collection layout detected in a loaded config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigShape<'a> {
    Object(&'a Map<String, Value>),
    List(&'a [Value]),
    Missing,
}

/// The whole config document. Keys other than the server collection belong
/// to the desktop application and are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedConfig(Map<String, Value>);

impl Default for PersistedConfig {
    fn default() -> Self {
        let mut root = Map::new();
        root.insert(OBJECT_FIELD.to_string(), Value::Object(Map::new()));
        Self(root)
    }
}

impl PersistedConfig {
    pub fn from_map(root: Map<String, Value>) -> Self {
        Self(root)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The object shape takes precedence over the legacy list.
    pub fn shape(&self) -> ConfigShape<'_> {
        if let Some(Value::Object(map)) = self.0.get(OBJECT_FIELD) {
            return ConfigShape::Object(map);
        }
        if let Some(Value::Array(list)) = self.0.get(LEGACY_FIELD) {
            return ConfigShape::List(list);
        }
        ConfigShape::Missing
    }

    /// Normalize whichever shape is present into an ordered server list.
    ///
    /// Entries without a usable name, or that are not objects, are dropped
    /// with a warning. Fields with the wrong type fall back to their defaults
    /// and are kept in [`ServerRecord::preserved`] so a rewrite leaves them
    /// untouched.
    pub fn servers(&self) -> Vec<ServerRecord> {
        match self.shape() {
            ConfigShape::Object(map) => map
                .iter()
                .filter_map(|(name, value)| record_from_entry(name, value))
                .collect(),
            ConfigShape::List(list) => list
                .iter()
                .enumerate()
                .filter_map(|(index, value)| record_from_list_item(index, value))
                .collect(),
            ConfigShape::Missing => {
                tracing::warn!(
                    "Config has neither '{}' (object) nor '{}' (list)",
                    OBJECT_FIELD,
                    LEGACY_FIELD
                );
                Vec::new()
            }
        }
    }

    /// Replace the server collection with `servers` in object shape and drop
    /// the legacy list field. A repeated name overwrites the earlier entry.
    pub fn set_servers(&mut self, servers: &[ServerRecord]) -> Result<(), ConfigError> {
        let mut map = Map::new();
        for server in servers {
            if server.name.trim().is_empty() {
                tracing::warn!("Skipping server without a name");
                continue;
            }
            map.insert(server.name.clone(), entry_from_record(server)?);
        }
        self.0.insert(OBJECT_FIELD.to_string(), Value::Object(map));
        self.0.remove(LEGACY_FIELD);
        Ok(())
    }
}

/// Structural check applied before every write.
///
/// The legacy list is checked entry by entry (object with a `name`);
/// `mcpServers` values are not inspected.
pub fn validate(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| ConfigError::validation("configuration root is not a JSON object"))?;

    if let Some(legacy) = root.get(LEGACY_FIELD) {
        let list = legacy.as_array().ok_or_else(|| {
            ConfigError::validation(format!("'{LEGACY_FIELD}' is not an array"))
        })?;
        for (index, entry) in list.iter().enumerate() {
            let entry = entry.as_object().ok_or_else(|| {
                ConfigError::validation(format!("{LEGACY_FIELD}[{index}] is not an object"))
            })?;
            if !entry.contains_key("name") {
                return Err(ConfigError::validation(format!(
                    "{LEGACY_FIELD}[{index}] is missing required field 'name'"
                )));
            }
        }
    }

    Ok(())
}

fn record_from_entry(name: &str, value: &Value) -> Option<ServerRecord> {
    if name.trim().is_empty() {
        tracing::warn!("Dropping '{}' entry with an empty name", OBJECT_FIELD);
        return None;
    }
    let Value::Object(entry) = value else {
        tracing::warn!(server = name, "Server entry is not an object, dropping");
        return None;
    };
    let mut record = lenient_record(name, entry);
    record.name = name.to_string();
    Some(record)
}

fn record_from_list_item(index: usize, value: &Value) -> Option<ServerRecord> {
    let Some(entry) = value.as_object() else {
        tracing::warn!(index, "Dropping '{}' entry that is not an object", LEGACY_FIELD);
        return None;
    };
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty());
    let Some(name) = name else {
        tracing::warn!(index, "Dropping '{}' entry without a name", LEGACY_FIELD);
        return None;
    };
    Some(lenient_record(name, entry))
}

/// Deserialize an entry, setting aside modelled keys whose values have the
/// wrong type instead of rejecting the whole entry.
fn lenient_record(name: &str, entry: &Map<String, Value>) -> ServerRecord {
    if let Ok(record) = serde_json::from_value::<ServerRecord>(Value::Object(entry.clone())) {
        return record;
    }

    let mut accepted = Map::new();
    let mut preserved = Map::new();
    for (key, value) in entry {
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        if serde_json::from_value::<ServerRecord>(Value::Object(single)).is_ok() {
            accepted.insert(key.clone(), value.clone());
        } else {
            tracing::warn!(server = name, field = %key, "Field has an unexpected type, keeping it as is");
            preserved.insert(key.clone(), value.clone());
        }
    }

    let mut record = serde_json::from_value::<ServerRecord>(Value::Object(accepted))
        .unwrap_or_else(|_| ServerRecord::named(name));
    record.preserved = preserved;
    record
}

fn entry_from_record(server: &ServerRecord) -> Result<Value, ConfigError> {
    let mut entry: Map<String, Value> = match serde_json::to_value(server)? {
        Value::Object(map) => map.into_iter().filter(|(key, _)| key != "name").collect(),
        _ => Map::new(),
    };

    if !server.preserved.is_empty() {
        let defaults = serde_json::to_value(ServerRecord::named(server.name.as_str()))?;
        for (key, raw) in &server.preserved {
            if entry.get(key) == defaults.get(key) {
                entry.insert(key.clone(), raw.clone());
            }
        }
    }

    Ok(Value::Object(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> PersistedConfig {
        match value {
            Value::Object(map) => PersistedConfig::from_map(map),
            _ => panic!("test config must be an object"),
        }
    }

    #[test]
    fn default_is_empty_object_shape() {
        let config = PersistedConfig::default();
        assert_eq!(config.to_value(), json!({ "mcpServers": {} }));
        assert!(matches!(config.shape(), ConfigShape::Object(map) if map.is_empty()));
    }

    #[test]
    fn object_shape_takes_precedence() {
        let config = config(json!({
            "mcp_servers": [{ "name": "legacy" }],
            "mcpServers": { "current": { "command": "npx" } }
        }));

        let names: Vec<_> = config.servers().into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["current".to_string()]);
    }

    #[test]
    fn legacy_list_is_normalized() {
        let config = config(json!({
            "mcp_servers": [
                { "name": "a", "command": "uvx", "installation_options": ["pip"] },
                { "description": "no name" },
                { "name": "" },
                "not an object",
                { "name": "b" }
            ]
        }));

        let servers = config.servers();

        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].name, "a");
        assert!(servers[0].installation_options.contains("pip"));
        assert_eq!(servers[1].description, "none");
    }

    #[test]
    fn object_entries_that_are_not_objects_are_dropped() {
        let config = config(json!({
            "mcpServers": {
                "ok": {},
                "bad": "string",
                "": { "command": "x" },
                "wrong-types": { "args": "not-a-list" }
            }
        }));

        let names: Vec<_> = config.servers().into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["ok".to_string(), "wrong-types".to_string()]);
    }

    #[test]
    fn mistyped_fields_are_set_aside() {
        let config = config(json!({
            "mcpServers": {
                "api": {
                    "command": "node",
                    "description": null,
                    "env": { "PORT": 8080, "DEBUG": true }
                }
            }
        }));

        let servers = config.servers();

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].command.as_deref(), Some("node"));
        assert_eq!(servers[0].description, "none");
        assert!(servers[0].env.is_empty());
        assert_eq!(servers[0].preserved.get("description"), Some(&Value::Null));
        assert_eq!(
            servers[0].preserved.get("env"),
            Some(&json!({ "PORT": 8080, "DEBUG": true }))
        );
    }

    #[test]
    fn mistyped_fields_are_written_back_unless_replaced() {
        let mut config = config(json!({
            "mcpServers": {
                "api": { "args": "--port 1", "env": { "PORT": 8080 } }
            }
        }));
        let mut servers = config.servers();
        servers[0]
            .env
            .insert("PORT".to_string(), "9090".to_string());

        config.set_servers(&servers).unwrap();

        let value = config.into_value();
        assert_eq!(value["mcpServers"]["api"]["args"], json!("--port 1"));
        assert_eq!(value["mcpServers"]["api"]["env"], json!({ "PORT": "9090" }));
    }

    #[test]
    fn set_servers_writes_object_shape_and_drops_legacy() {
        let mut config = config(json!({
            "globalShortcut": "Ctrl+Space",
            "mcp_servers": [{ "name": "old" }]
        }));

        config
            .set_servers(&[ServerRecord::new("fs", "npx", vec!["-y".into()])])
            .unwrap();

        let value = config.to_value();
        assert!(value.get("mcp_servers").is_none());
        assert_eq!(value["globalShortcut"], json!("Ctrl+Space"));
        assert_eq!(value["mcpServers"]["fs"]["command"], json!("npx"));
        assert!(value["mcpServers"]["fs"].get("name").is_none());
    }

    #[test]
    fn duplicate_names_last_write_wins() {
        let mut config = PersistedConfig::default();
        let first = ServerRecord::new("dup", "first", vec![]);
        let second = ServerRecord::new("dup", "second", vec![]);

        config.set_servers(&[first, second]).unwrap();

        let servers = config.servers();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].command.as_deref(), Some("second"));
    }

    #[test]
    fn validate_rejects_non_object_root() {
        assert!(validate(&json!([1, 2])).is_err());
        assert!(validate(&json!("x")).is_err());
    }

    #[test]
    fn validate_checks_legacy_entries() {
        assert!(validate(&json!({ "mcp_servers": {} })).is_err());
        assert!(validate(&json!({ "mcp_servers": [1] })).is_err());
        assert!(validate(&json!({ "mcp_servers": [{ "command": "x" }] })).is_err());
        assert!(validate(&json!({ "mcp_servers": [{ "name": "x" }] })).is_ok());
    }

    #[test]
    fn validate_accepts_any_object_shape_entries() {
        assert!(validate(&json!({ "mcpServers": { "x": 42 } })).is_ok());
        assert!(validate(&json!({})).is_ok());
    }
}
