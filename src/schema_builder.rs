use crate::definitions::extract_definitions;
use crate::settings::Settings;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path template -> lowercase HTTP method -> operation.
pub type Paths = IndexMap<String, IndexMap<String, Value>>;

/// Fragment of a document produced by an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwaggerPart {
    pub paths: Paths,
    /// Inline schemas keyed by definition name
    pub definitions: Map<String, Value>,
    pub security_definitions: Map<String, Value>,
}

impl SwaggerPart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operation(&mut self, path: &str, method: &str, operation: Value) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .insert(method.to_lowercase(), operation);
    }

    /// Registers `path` even if no operation ends up under it.
    pub fn add_path(&mut self, path: &str) {
        self.paths.entry(path.to_string()).or_default();
    }
}

/// Swagger Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    /// Always "2.0"
    pub swagger: String,
    pub info: Info,
    pub host: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
    pub schemes: Vec<String>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    pub paths: Paths,
    pub definitions: Map<String, Value>,
    #[serde(rename = "securityDefinitions")]
    pub security_definitions: Map<String, Value>,
}

/// Swagger document builder
///
/// Collects operations and definitions from adapters; [`SchemaBuilder::build`] hoists every
/// identified inline schema into `definitions` and assembles the document.
pub struct SchemaBuilder {
    settings: Settings,
    paths: Paths,
    definitions: Map<String, Value>,
    security_definitions: Map<String, Value>,
}

impl SchemaBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            paths: Paths::new(),
            definitions: Map::new(),
            security_definitions: Map::new(),
        }
    }

    pub fn add_operation(&mut self, path: &str, method: &str, operation: Value) -> &mut Self {
        debug!("Adding operation: {} {}", method.to_uppercase(), path);
        self.paths
            .entry(path.to_string())
            .or_default()
            .insert(method.to_lowercase(), operation);
        self
    }

    /// Merges grouped operations; a method already present under a path is replaced.
    pub fn add_paths(&mut self, paths: Paths) -> &mut Self {
        for (path, operations) in paths {
            self.paths.entry(path).or_default().extend(operations);
        }
        self
    }

    /// Named schemas to publish as definitions, in addition to those in the settings.
    pub fn add_definitions(&mut self, definitions: Map<String, Value>) -> &mut Self {
        self.definitions.extend(definitions);
        self
    }

    pub fn add_security_definitions(&mut self, definitions: Map<String, Value>) -> &mut Self {
        self.security_definitions.extend(definitions);
        self
    }

    pub fn extend(&mut self, part: SwaggerPart) -> &mut Self {
        self.add_paths(part.paths);
        self.add_definitions(part.definitions);
        self.add_security_definitions(part.security_definitions);
        self
    }

    pub fn build(self) -> SwaggerDocument {
        let SchemaBuilder {
            settings,
            mut paths,
            definitions: added_definitions,
            security_definitions: added_security_definitions,
        } = self;

        let mut definitions = Map::new();

        for (name, schema) in settings.definitions().into_iter().chain(added_definitions) {
            let Value::Object(mut schema) = schema else {
                warn!("Ignoring definition '{}': not a mapping", name);
                continue;
            };
            schema.insert("id".to_string(), Value::String(name));

            let mut item = Map::new();
            item.insert("schema".to_string(), Value::Object(schema));
            let mut item = Value::Object(item);
            merge_definitions(
                &mut definitions,
                extract_definitions(std::iter::once(&mut item), 0),
            );
        }

        for operations in paths.values_mut() {
            for operation in operations.values_mut() {
                let Value::Object(operation) = operation else {
                    continue;
                };
                if let Some(Value::Array(parameters)) = operation.get_mut("parameters") {
                    merge_definitions(
                        &mut definitions,
                        extract_definitions(parameters.iter_mut(), 0),
                    );
                }
                if let Some(Value::Object(responses)) = operation.get_mut("responses") {
                    merge_definitions(
                        &mut definitions,
                        extract_definitions(responses.values_mut(), 0),
                    );
                }
            }
        }

        let mut security_definitions = settings.security_definitions();
        security_definitions.extend(added_security_definitions);

        debug!(
            "Built document with {} paths and {} definitions",
            paths.len(),
            definitions.len()
        );

        SwaggerDocument {
            swagger: "2.0".to_string(),
            info: Info {
                title: settings.title(),
                version: settings.version(),
                description: settings.description(),
            },
            host: settings.host(),
            base_path: settings.base_path(),
            schemes: settings.schemes(),
            produces: settings.produces(),
            consumes: settings.consumes(),
            paths,
            definitions,
            security_definitions,
        }
    }
}

/// Stores hoisted schemas by their popped `id`; a repeated id is shallow-merged into the
/// first non-empty schema stored under it.
fn merge_definitions(definitions: &mut Map<String, Value>, hoisted: Vec<Map<String, Value>>) {
    for mut schema in hoisted {
        let id = match schema.shift_remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => continue,
        };

        match definitions.get_mut(&id) {
            Some(Value::Object(existing)) if !existing.is_empty() => existing.extend(schema),
            _ => {
                definitions.insert(id, Value::Object(schema));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn settings(value: Value) -> Settings {
        Settings::from_map(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_empty_document_uses_settings() {
        let document = SchemaBuilder::new(settings(json!({
            "title": "X",
            "version": "1",
            "host": "h",
            "produces": ["a/b"]
        })))
        .build();

        assert_eq!(
            serde_json::to_string(&document).unwrap(),
            r#"{"swagger":"2.0","info":{"title":"X","version":"1","description":""},"host":"h","basePath":"/","schemes":["http"],"produces":["a/b"],"consumes":["application/json"],"paths":{},"definitions":{},"securityDefinitions":{}}"#
        );
    }

    #[test]
    fn test_operation_schemas_are_hoisted() {
        let mut builder = SchemaBuilder::new(Settings::new());
        builder.add_operation(
            "/books/",
            "POST",
            json!({
                "parameters": [{"in": "body", "name": "data", "schema": {"id": "RequestBook", "type": "object"}}],
                "responses": {"201": {"description": "made", "schema": {"id": "Book", "type": "object"}}}
            }),
        );

        let document = builder.build();
        let operation = &document.paths["/books/"]["post"];

        assert_eq!(
            operation["parameters"][0]["schema"],
            json!({"$ref": "#/definitions/RequestBook"})
        );
        assert_eq!(
            operation["responses"]["201"]["schema"],
            json!({"$ref": "#/definitions/Book"})
        );
        assert_eq!(
            Value::Object(document.definitions),
            json!({"RequestBook": {"type": "object"}, "Book": {"type": "object"}})
        );
    }

    #[test]
    fn test_repeated_ids_are_merged() {
        let mut builder = SchemaBuilder::new(Settings::new());
        builder.add_operation(
            "/a",
            "get",
            json!({"responses": {"200": {"schema": {"id": "X", "type": "object"}}}}),
        );
        builder.add_operation(
            "/b",
            "get",
            json!({"responses": {"200": {"schema": {"id": "X", "properties": {"p": {"type": "string"}}}}}}),
        );

        let document = builder.build();

        assert_eq!(
            document.definitions["X"],
            json!({"type": "object", "properties": {"p": {"type": "string"}}})
        );
        assert_eq!(document.definitions.len(), 1);
        for path in ["/a", "/b"] {
            assert_eq!(
                document.paths[path]["get"]["responses"]["200"]["schema"],
                json!({"$ref": "#/definitions/X"})
            );
        }
    }

    #[test]
    fn test_global_definitions_come_first() {
        let mut builder = SchemaBuilder::new(settings(json!({
            "definitions": {"Error": {"type": "object", "properties": {"detail": {"type": "string"}}}}
        })));
        builder.add_definitions(
            json!({"Book": {"type": "object", "properties": {"author": {"schema": {"id": "Author", "type": "object"}}}}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        builder.add_operation(
            "/books/",
            "get",
            json!({"responses": {"200": {"schema": {"id": "Page"}}}}),
        );

        let document = builder.build();
        let names: Vec<&str> = document.definitions.keys().map(String::as_str).collect();

        assert_eq!(names, vec!["Error", "Book", "Author", "Page"]);
        assert_eq!(
            document.definitions["Book"]["properties"]["author"],
            json!({"$ref": "#/definitions/Author"})
        );
        assert!(document.definitions["Book"].get("id").is_none());
    }

    #[test]
    fn test_extend_with_parts() {
        let mut part = SwaggerPart::new();
        part.add_operation("/health", "GET", json!({"summary": "ok"}));
        part.add_path("/empty");
        part.security_definitions
            .insert("api_key".to_string(), json!({"type": "apiKey"}));

        let mut builder = SchemaBuilder::new(settings(json!({
            "securityDefinitions": {"basic": {"type": "basic"}}
        })));
        builder.extend(part);
        let document = builder.build();

        let paths: Vec<&str> = document.paths.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/health", "/empty"]);
        assert_eq!(document.paths["/health"]["get"]["summary"], "ok");
        assert!(document.paths["/empty"].is_empty());
        let schemes: Vec<&str> = document
            .security_definitions
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(schemes, vec!["basic", "api_key"]);
    }

    #[test]
    fn test_methods_under_one_path_keep_first_seen_order() {
        let mut builder = SchemaBuilder::new(Settings::new());
        builder
            .add_operation("/books/", "get", json!({"summary": "list"}))
            .add_operation("/authors/", "get", json!({"summary": "authors"}))
            .add_operation("/books/", "post", json!({"summary": "create"}));

        let document = builder.build();

        let paths: Vec<&str> = document.paths.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/books/", "/authors/"]);
        let methods: Vec<&str> = document.paths["/books/"]
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(methods, vec!["get", "post"]);
    }
}
