use super::{section, Adapter};
use crate::error::Result;
use crate::introspector::DocstringIntrospector;
use crate::operation::{strip_empty_keys, HttpMethod};
use crate::schema_builder::SwaggerPart;
use crate::source::SourceIndex;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: String,
    /// Path of the handler function
    pub handler: String,
    /// Wrapper functions applied to the handler, outermost first
    #[serde(default)]
    pub decorators: Vec<String>,
}

/// Endpoints declared one by one under `plugin.endpoints`.
#[derive(Debug, Clone)]
pub struct SimpleAdapter {
    endpoints: Vec<Endpoint>,
}

impl SimpleAdapter {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    pub fn from_plugin(plugin: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(section(plugin, "endpoints")?))
    }
}

impl Adapter for SimpleAdapter {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn run(&self, index: &SourceIndex) -> Result<SwaggerPart> {
        let mut part = SwaggerPart::new();

        for endpoint in &self.endpoints {
            let method: HttpMethod = endpoint.method.parse()?;
            debug!("Introspecting {} {} -> {}", method, endpoint.path, endpoint.handler);

            let entity = index
                .entity(&endpoint.handler)?
                .with_wrapped(index.wrapper_docs(&endpoint.decorators)?);
            let introspector = DocstringIntrospector::new(&entity);

            part.add_operation(&endpoint.path, method.as_str(), operation(&introspector));
            part.security_definitions
                .extend(introspector.security_definitions());
        }

        Ok(part)
    }
}

fn operation(introspector: &DocstringIntrospector) -> Value {
    let parser = introspector.parser();
    let mut operation = Map::new();
    operation.insert("tags".to_string(), json!(introspector.tags()));
    operation.insert("summary".to_string(), json!(parser.summary()));
    operation.insert("description".to_string(), json!(parser.description()));
    operation.insert("parameters".to_string(), Value::Array(introspector.parameters()));
    operation.insert("responses".to_string(), Value::Object(introspector.responses()));
    operation.insert("security".to_string(), Value::Array(introspector.security()));
    Value::Object(strip_empty_keys(operation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
        /// Login required
        /// ---
        /// parameters:
        /// - name: Authorization
        ///   in: header
        ///   type: string
        /// responses:
        ///   401:
        ///     description: Unauthorized
        pub fn login_required() {}

        /// Get user
        /// Returns a single user
        /// ---
        /// tags:
        /// - users
        /// parameters:
        /// - name: id
        ///   in: path
        ///   type: integer
        ///   required: true
        /// responses:
        ///   200:
        ///     description: The user
        /// securityDefinitions:
        ///   api_key:
        ///     type: apiKey
        ///     name: X-Key
        ///     in: header
        pub fn get_user() {}

        pub fn ping() {}
    "#;

    fn endpoint(path: &str, method: &str, handler: &str, decorators: &[&str]) -> Endpoint {
        Endpoint {
            path: path.to_string(),
            method: method.to_string(),
            handler: handler.to_string(),
            decorators: decorators.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_documented_endpoint() {
        let index = SourceIndex::parse_str(SOURCE).unwrap();
        let adapter = SimpleAdapter::new(vec![endpoint(
            "/users/{id}",
            "GET",
            "get_user",
            &["login_required"],
        )]);

        let part = adapter.run(&index).unwrap();
        let operation = &part.paths["/users/{id}"]["get"];

        assert_eq!(
            *operation,
            json!({
                "tags": ["users"],
                "summary": "Get user",
                "description": "Returns a single user",
                "parameters": [
                    {"name": "Authorization", "in": "header", "type": "string"},
                    {"name": "id", "in": "path", "type": "integer", "required": true}
                ],
                "responses": {
                    "401": {"description": "Unauthorized"},
                    "200": {"description": "The user"}
                }
            })
        );
        assert_eq!(part.security_definitions["api_key"]["name"], "X-Key");
    }

    #[test]
    fn test_undocumented_endpoint_is_empty() {
        let index = SourceIndex::parse_str(SOURCE).unwrap();
        let adapter = SimpleAdapter::new(vec![endpoint("/ping", "get", "ping", &[])]);

        let part = adapter.run(&index).unwrap();

        assert_eq!(part.paths["/ping"]["get"], json!({}));
        assert!(part.security_definitions.is_empty());
    }

    #[test]
    fn test_unknown_handler() {
        let index = SourceIndex::parse_str(SOURCE).unwrap();
        let adapter = SimpleAdapter::new(vec![endpoint("/x", "get", "missing", &[])]);

        assert!(matches!(adapter.run(&index), Err(Error::Resolution(_))));
    }

    #[test]
    fn test_unknown_method() {
        let index = SourceIndex::parse_str(SOURCE).unwrap();
        let adapter = SimpleAdapter::new(vec![endpoint("/x", "fetch", "ping", &[])]);

        assert!(matches!(adapter.run(&index), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_plugin() {
        let plugin: Map<String, Value> = serde_yaml::from_str(
            "endpoints:\n- path: /ping\n  method: get\n  handler: ping",
        )
        .unwrap();

        let adapter = SimpleAdapter::from_plugin(&plugin).unwrap();
        assert_eq!(adapter.endpoints, vec![endpoint("/ping", "get", "ping", &[])]);
    }
}
