//! Parser for the YAML dialect embedded in documentation comments.
//!
//! A documentation string is free text, optionally followed by a separator line made of
//! three or more dashes and a YAML mapping:
//!
//! ```text
//! List users
//! Returns every active user of the tenant.
//! ---
//! tags:
//! - users
//! parameters:
//! - in: query
//!   name: active
//!   type: boolean
//! responses:
//!   200:
//!     description: The users
//! ```
//!
//! The first line of the free text is the summary, the rest is the description. The YAML
//! block is loaded into an insertion-ordered [`serde_json::Map`] so that the order in which
//! keys were documented survives into the generated document.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// A line holding only three or more dashes.
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*$").expect("separator pattern is valid"));

/// Parsed documentation string: summary, description and the structured schema fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocstringParser {
    summary: Option<String>,
    description: Option<String>,
    schema: Map<String, Value>,
}

impl DocstringParser {
    /// Parses a single documentation string. `None` behaves like an empty string.
    pub fn new(docstring: Option<&str>) -> Self {
        let (summary, description, schema) = parse_docstring(docstring.unwrap_or(""));
        Self {
            summary,
            description,
            schema,
        }
    }

    /// Starts from an empty fragment and applies [`DocstringParser::update`] for every
    /// documentation string in order.
    pub fn from_docs<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut parser = Self::default();
        for doc in docs {
            parser.update(doc);
        }
        parser
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The raw structured fragment found after the separator.
    pub fn schema(&self) -> &Map<String, Value> {
        &self.schema
    }

    pub fn tags(&self) -> Vec<String> {
        self.list("tags")
            .into_iter()
            .map(|tag| match tag {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()
    }

    pub fn parameters(&self) -> Vec<Value> {
        self.list("parameters")
    }

    /// Responses keyed by status code. YAML integer keys are stored as strings.
    pub fn responses(&self) -> Map<String, Value> {
        self.mapping("responses")
    }

    pub fn security(&self) -> Vec<Value> {
        self.list("security")
    }

    pub fn security_definitions(&self) -> Map<String, Value> {
        self.mapping("securityDefinitions")
    }

    /// Field override table used by data shapes.
    pub fn fields(&self) -> Map<String, Value> {
        self.mapping("fields")
    }

    /// Path of the request or response data shape declared under `serializers`.
    pub fn serializer(&self, request: bool) -> Option<String> {
        let kind = if request { "request" } else { "response" };
        self.schema
            .get("serializers")
            .and_then(|serializers| serializers.get(kind))
            .and_then(|entry| entry.get("path"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn request_serializer(&self) -> Option<String> {
        self.serializer(true)
    }

    pub fn response_serializer(&self) -> Option<String> {
        self.serializer(false)
    }

    /// Every data shape path declared under `serializers`, in declaration order.
    pub fn serializers(&self) -> Vec<String> {
        match self.schema.get("serializers") {
            Some(Value::Object(serializers)) => serializers
                .values()
                .filter_map(|entry| entry.get("path").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Merges another documentation string into this fragment.
    ///
    /// Summary and description are only filled when still empty. Schema keys missing here are
    /// inserted; sequences are appended and mappings are shallow-updated with the new values
    /// winning. Any other combination keeps the accumulated value.
    pub fn update(&mut self, docstring: Option<&str>) {
        let (summary, description, schema) = parse_docstring(docstring.unwrap_or(""));

        if self.summary.is_none() {
            self.summary = summary;
        }
        if self.description.is_none() {
            self.description = description;
        }

        for (key, value) in schema {
            match self.schema.get_mut(&key) {
                None | Some(Value::Null) => {
                    self.schema.insert(key, value);
                }
                Some(Value::Array(existing)) => {
                    if let Value::Array(items) = value {
                        existing.extend(items);
                    }
                }
                Some(Value::Object(existing)) => {
                    if let Value::Object(entries) = value {
                        for (k, v) in entries {
                            existing.insert(k, v);
                        }
                    }
                }
                Some(_) => {
                    debug!("Keeping accumulated value for docstring key '{}'", key);
                }
            }
        }
    }

    fn list(&self, key: &str) -> Vec<Value> {
        match self.schema.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn mapping(&self, key: &str) -> Map<String, Value> {
        match self.schema.get(key) {
            Some(Value::Object(entries)) => entries.clone(),
            _ => Map::new(),
        }
    }
}

/// Splits a documentation string into `(summary, description, schema)`.
fn parse_docstring(docstring: &str) -> (Option<String>, Option<String>, Map<String, Value>) {
    let cleaned = clean_doc(docstring);
    let docstring = cleaned.trim();

    let (head, yaml_block) = match SEPARATOR.find(docstring) {
        Some(separator) => (
            &docstring[..separator.start()],
            Some(&docstring[separator.end()..]),
        ),
        None => (docstring, None),
    };

    let schema = yaml_block.map(load_yaml_mapping).unwrap_or_default();

    let head = head.trim();
    let (summary, description) = match head.split_once('\n') {
        Some((first, rest)) => (non_empty(first), non_empty(rest)),
        None => (non_empty(head), None),
    };

    (summary, description, schema)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Normalizes the indentation of a documentation string.
///
/// The first line is left-stripped and the common leading whitespace of the remaining
/// non-blank lines is removed, so both indented string literals and `///` comments (which
/// keep the space after the slashes) produce the same text.
pub fn clean_doc(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\t', "    ");
    let lines: Vec<&str> = text.lines().collect();

    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start());
    }
    for line in lines.iter().skip(1) {
        let cut = line
            .char_indices()
            .take_while(|(_, c)| c.is_whitespace())
            .take(indent)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        cleaned.push(&line[cut..]);
    }

    cleaned.join("\n")
}

/// Loads a YAML block that must hold a mapping. Anything else is treated as "no schema".
fn load_yaml_mapping(block: &str) -> Map<String, Value> {
    match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(serde_yaml::Value::Mapping(mapping)) => yaml_mapping_to_json(mapping),
        Ok(serde_yaml::Value::Null) => Map::new(),
        Ok(other) => {
            warn!(
                "Ignoring docstring YAML block: expected a mapping, found {:?}",
                other
            );
            Map::new()
        }
        Err(e) => {
            warn!("Ignoring malformed YAML in docstring: {}", e);
            Map::new()
        }
    }
}

/// Converts a YAML value into a JSON value, keeping mapping order.
///
/// Scalar mapping keys (status codes like `200`) become strings.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => Value::Object(yaml_mapping_to_json(mapping)),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_mapping_to_json(mapping: serde_yaml::Mapping) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in mapping {
        match yaml_key(key) {
            Some(key) => {
                map.insert(key, yaml_to_json(value));
            }
            None => debug!("Skipping YAML entry with a non-scalar key"),
        }
    }
    map
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}
