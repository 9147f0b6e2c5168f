use super::{section, Adapter};
use crate::error::{Error, Result};
use crate::introspector::{DocstringIntrospector, DocumentedEntity};
use crate::operation::{strip_empty_keys, HttpMethod};
use crate::schema_builder::SwaggerPart;
use crate::source::SourceIndex;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const RESPONDER_PREFIX: &str = "on_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    pub path: String,
    /// Path of the resource type
    pub resource: String,
}

/// Resource types responding through `on_<verb>` methods, listed under `plugin.routes`.
#[derive(Debug, Clone)]
pub struct MicroAdapter {
    routes: Vec<Route>,
}

impl MicroAdapter {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn from_plugin(plugin: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(section(plugin, "routes")?))
    }
}

impl Adapter for MicroAdapter {
    fn name(&self) -> &'static str {
        "micro"
    }

    fn run(&self, index: &SourceIndex) -> Result<SwaggerPart> {
        let mut part = SwaggerPart::new();

        for route in &self.routes {
            let methods = index.methods_of(&route.resource);
            if methods.is_empty() && index.find_type(&route.resource).is_none() {
                return Err(Error::Resolution(format!(
                    "resource '{}' of route '{}' was not found in the scanned sources",
                    route.resource, route.path
                )));
            }

            part.add_path(&route.path);
            for responder in methods {
                let Some(verb) = responder.strip_prefix(RESPONDER_PREFIX) else {
                    continue;
                };
                let Ok(method) = verb.parse::<HttpMethod>() else {
                    debug!("Skipping {}::{}: not an HTTP verb", route.resource, responder);
                    continue;
                };
                if method == HttpMethod::Options {
                    continue;
                }

                let entity = index
                    .method_entity(&route.resource, &responder)
                    .unwrap_or_else(|| DocumentedEntity::undocumented(responder.as_str()));
                let introspector = DocstringIntrospector::new(&entity);

                part.add_operation(&route.path, method.as_str(), operation(&introspector));
                part.security_definitions
                    .extend(introspector.security_definitions());
            }
        }

        Ok(part)
    }
}

/// Tags, summary and description come from the responder's own docs only.
fn operation(introspector: &DocstringIntrospector) -> Value {
    let parser = introspector.parser();
    let mut operation = Map::new();
    operation.insert("tags".to_string(), json!(parser.tags()));
    operation.insert("summary".to_string(), json!(parser.summary()));
    operation.insert("description".to_string(), json!(parser.description()));
    operation.insert("parameters".to_string(), Value::Array(introspector.parameters()));
    operation.insert("responses".to_string(), Value::Object(introspector.responses()));
    operation.insert("security".to_string(), Value::Array(introspector.security()));
    Value::Object(strip_empty_keys(operation))
}
