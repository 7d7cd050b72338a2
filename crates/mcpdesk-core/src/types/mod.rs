//! Shared record types used by the configuration and catalog engines.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_DESCRIPTION: &str = "none";
pub const DEFAULT_CATEGORY: &str = "general";

/// Which section of the catalog document a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Reference,
    Official,
}

impl SourceType {
    /// Installers offered for records of this section.
    pub fn installation_options(&self) -> BTreeSet<String> {
        let options: &[&str] = match self {
            SourceType::Reference => &["npm", "pip"],
            SourceType::Official => &["npm"],
        };
        options.iter().map(|s| s.to_string()).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Reference => "reference",
            SourceType::Official => "official",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server category vocabulary produced by catalog parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Search,
    Vision,
    Audio,
    Document,
    Database,
    Web,
    Git,
    Time,
    Map,
    Memory,
    Utility,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Search => "search",
            Category::Vision => "vision",
            Category::Audio => "audio",
            Category::Document => "document",
            Category::Database => "database",
            Category::Web => "web",
            Category::Git => "git",
            Category::Time => "time",
            Category::Map => "map",
            Category::Memory => "memory",
            Category::Utility => "utility",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One server entry of the desktop configuration file.
///
/// In the object shape the name is the mapping key and is not repeated
/// inside the value; in the legacy list shape it is a field of the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(
        default,
        alias = "installation_options",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub installation_options: BTreeSet<String>,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    #[serde(default = "default_enabled", skip_serializing_if = "is_enabled")]
    pub enabled: bool,

    /// Keys this type does not model, kept so they survive a rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// On-disk values of modelled keys that had the wrong type. Each is
    /// written back verbatim while the matching field still holds its default.
    #[serde(skip)]
    pub preserved: Map<String, Value>,
}

impl ServerRecord {
    /// A stdio server with the given launch command.
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: Some(command.into()),
            args,
            ..Self::named(name)
        }
    }

    /// A record carrying only a name, every other field at its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: default_description(),
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            installation_options: BTreeSet::new(),
            category: default_category(),
            source_type: None,
            enabled: true,
            extra: Map::new(),
            preserved: Map::new(),
        }
    }
}

/// A server advertised by the remote catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default, alias = "installation_options")]
    pub installation_options: BTreeSet<String>,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(alias = "type")]
    pub source_type: SourceType,

    /// Names of environment variables the server expects.
    #[serde(default, alias = "env_vars")]
    pub env_vars: Vec<String>,
}

impl CatalogRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        source_type: SourceType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            installation_options: source_type.installation_options(),
            category: category.to_string(),
            source_type,
            env_vars: Vec::new(),
        }
    }

    /// Build an installable config entry from this catalog record.
    ///
    /// Each required environment variable gets the value from `env_values`,
    /// or an empty string for the user to fill in.
    pub fn to_server_record(&self, env_values: &BTreeMap<String, String>) -> ServerRecord {
        let mut env = self.env.clone();
        for var in &self.env_vars {
            let value = env_values.get(var).cloned().unwrap_or_default();
            env.insert(var.clone(), value);
        }
        for (key, value) in env_values {
            env.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let description = if self.description.is_empty() {
            default_description()
        } else {
            self.description.clone()
        };

        ServerRecord {
            name: self.name.clone(),
            description,
            command: self.command.clone(),
            args: self.args.clone(),
            env,
            installation_options: self.installation_options.clone(),
            category: self.category.clone(),
            source_type: Some(self.source_type),
            enabled: true,
            extra: Map::new(),
            preserved: Map::new(),
        }
    }
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_enabled() -> bool {
    true
}

fn is_enabled(enabled: &bool) -> bool {
    *enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let record: ServerRecord = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert_eq!(record.description, "none");
        assert_eq!(record.category, "general");
        assert!(record.args.is_empty());
        assert!(record.env.is_empty());
        assert!(record.enabled);
        assert_eq!(record.command, None);
    }

    #[test]
    fn unknown_keys_are_kept() {
        let record: ServerRecord = serde_json::from_value(json!({
            "name": "remote",
            "type": "http",
            "url": "https://example.com/mcp"
        }))
        .unwrap();

        assert_eq!(record.extra.get("type"), Some(&json!("http")));
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["url"], json!("https://example.com/mcp"));
    }

    #[test]
    fn enabled_is_written_only_when_disabled() {
        let mut record = ServerRecord::named("x");
        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("enabled").is_none());

        record.enabled = false;
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["enabled"], json!(false));
    }

    #[test]
    fn catalog_record_accepts_snake_case_cache() {
        let record: CatalogRecord = serde_json::from_value(json!({
            "name": "Brave Search",
            "description": "Web search",
            "installation_options": ["npm", "pip"],
            "env_vars": ["BRAVE_API_KEY"],
            "category": "search",
            "type": "reference"
        }))
        .unwrap();

        assert_eq!(record.source_type, SourceType::Reference);
        assert_eq!(record.env_vars, vec!["BRAVE_API_KEY".to_string()]);
        assert!(record.installation_options.contains("pip"));
    }

    #[test]
    fn to_server_record_fills_required_env() {
        let mut record = CatalogRecord::new(
            "GitHub",
            "Repository management",
            Category::Git,
            SourceType::Reference,
        );
        record.env_vars = vec!["GITHUB_TOKEN".to_string(), "GITHUB_HOST".to_string()];

        let mut values = BTreeMap::new();
        values.insert("GITHUB_TOKEN".to_string(), "secret".to_string());
        let server = record.to_server_record(&values);

        assert_eq!(server.env.get("GITHUB_TOKEN").map(String::as_str), Some("secret"));
        assert_eq!(server.env.get("GITHUB_HOST").map(String::as_str), Some(""));
        assert_eq!(server.source_type, Some(SourceType::Reference));
        assert!(server.enabled);
    }
}
