use crate::docstring::yaml_to_json;
use crate::error::{Error, Result};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Service API";
pub const DEFAULT_VERSION: &str = "0.0.1";
pub const DEFAULT_HOST: &str = "localhost:8000";
pub const DEFAULT_BASE_PATH: &str = "/";
pub const DEFAULT_SCHEMES: &[&str] = &["http"];
pub const DEFAULT_MEDIA_TYPES: &[&str] = &["application/json"];

/// Ordered settings record recognised by the schema builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Layers `part` over the current values. Mappings are shallow-updated and sequences
    /// extended; any other value is replaced.
    pub fn update(&mut self, part: Map<String, Value>) {
        for (key, value) in part {
            match self.values.get_mut(&key) {
                Some(Value::Object(current)) if value.is_object() => {
                    if let Value::Object(entries) = value {
                        current.extend(entries);
                    }
                }
                Some(Value::Array(current)) if value.is_array() => {
                    if let Value::Array(items) = value {
                        current.extend(items);
                    }
                }
                _ => {
                    self.values.insert(key, value);
                }
            }
        }
    }

    /// Sets a single key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn title(&self) -> String {
        self.info_string("title", DEFAULT_TITLE)
    }

    pub fn version(&self) -> String {
        self.info_string("version", DEFAULT_VERSION)
    }

    pub fn description(&self) -> String {
        self.info_string("description", "")
    }

    pub fn host(&self) -> String {
        self.string_or("host", DEFAULT_HOST)
    }

    pub fn base_path(&self) -> String {
        self.string_or("basePath", DEFAULT_BASE_PATH)
    }

    pub fn schemes(&self) -> Vec<String> {
        self.strings_or("schemes", DEFAULT_SCHEMES)
    }

    pub fn produces(&self) -> Vec<String> {
        self.strings_or("produces", DEFAULT_MEDIA_TYPES)
    }

    pub fn consumes(&self) -> Vec<String> {
        self.strings_or("consumes", DEFAULT_MEDIA_TYPES)
    }

    /// Named type definitions declared in configuration.
    pub fn definitions(&self) -> Map<String, Value> {
        self.mapping("definitions")
    }

    pub fn security_definitions(&self) -> Map<String, Value> {
        self.mapping("securityDefinitions")
    }

    /// An `info` mapping replaces the top-level keys entirely; missing entries take the default.
    fn info_string(&self, key: &str, default: &str) -> String {
        let source = match self.values.get("info") {
            Some(Value::Object(info)) => info,
            _ => &self.values,
        };
        source
            .get(key)
            .map(scalar_to_string)
            .unwrap_or_else(|| default.to_string())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .map(scalar_to_string)
            .unwrap_or_else(|| default.to_string())
    }

    fn strings_or(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items.iter().map(scalar_to_string).collect(),
            Some(other) => vec![scalar_to_string(other)],
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn mapping(&self, key: &str) -> Map<String, Value> {
        match self.values.get(key) {
            Some(Value::Object(entries)) => entries.clone(),
            _ => Map::new(),
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parsed configuration file: presentation settings plus adapter settings.
///
/// ```yaml
/// swagger:
///   title: Shop API
///   host: api.example.com
/// plugin:
///   endpoints:
///   - path: /health
///     method: get
///     handler: handlers::health
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Settings layered over the defaults
    pub swagger: Settings,
    /// Adapter settings (`endpoints`, `resources`, `routes`, ...)
    pub plugin: Map<String, Value>,
}

impl Config {
    /// Parses a YAML configuration document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        let root = match yaml_to_json(raw) {
            Value::Object(root) => root,
            Value::Null => Map::new(),
            _ => {
                return Err(Error::Configuration(
                    "configuration root must be a mapping".to_string(),
                ))
            }
        };

        let mut config = Config::default();
        for (key, value) in root {
            match (key.as_str(), value) {
                ("swagger", Value::Object(values)) => config.swagger.update(values),
                ("plugin", Value::Object(values)) => config.plugin = values,
                ("swagger" | "plugin", Value::Null) => {}
                ("swagger" | "plugin", _) => {
                    return Err(Error::Configuration(format!(
                        "configuration section '{}' must be a mapping",
                        key
                    )))
                }
                (other, _) => warn!("Ignoring unknown configuration section '{}'", other),
            }
        }

        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
