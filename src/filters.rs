use crate::introspector::DocstringIntrospector;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum FilterBackend {
    /// Exact-match filtering on fields plus an `o` ordering parameter
    Fields {
        #[serde(default)]
        fields: Vec<String>,
    },
    /// Ordering by one of `fields` through a single query parameter
    Ordering {
        #[serde(default = "default_ordering_param")]
        param: String,
        #[serde(default)]
        fields: Vec<String>,
    },
}

/// A filter backend of a list endpoint and the type documenting it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterConfig {
    #[serde(flatten)]
    pub backend: FilterBackend,
    #[serde(default)]
    pub documented: Option<String>,
}

fn default_ordering_param() -> String {
    "ordering".to_string()
}

impl FilterBackend {
    /// Query parameters, the documented ones first.
    pub fn parameters(&self, docs: &DocstringIntrospector) -> Vec<Value> {
        let mut parameters = docs.parameters();
        parameters.extend(self.backend_parameters());
        parameters
    }

    fn backend_parameters(&self) -> Vec<Value> {
        match self {
            FilterBackend::Fields { fields } => {
                let mut parameters: Vec<Value> = fields
                    .iter()
                    .map(|field| {
                        json!({
                            "in": "query",
                            "name": field,
                            "type": "string",
                            "required": false,
                            "description": "Filter parameter",
                        })
                    })
                    .collect();

                let ordering: Vec<String> = fields
                    .iter()
                    .cloned()
                    .chain(fields.iter().map(|field| format!("-{}", field)))
                    .collect();
                parameters.push(json!({
                    "in": "query",
                    "name": "o",
                    "description": "Ordering parameter",
                    "type": "string",
                    "enum": ordering,
                }));
                parameters
            }
            FilterBackend::Ordering { param, fields } => vec![json!({
                "in": "query",
                "name": param,
                "type": "string",
                "enum": fields,
            })],
        }
    }
}
