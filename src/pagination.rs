use crate::data_shape::DataShape;
use crate::introspector::DocstringIntrospector;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const RESULTS_FIELD: &str = "results";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Pagination {
    /// Unpaginated: the response is a plain array
    #[default]
    None,
    PageNumber {
        #[serde(default = "default_page_param")]
        page_query_param: String,
    },
    LimitOffset {
        #[serde(default = "default_limit_param")]
        limit_query_param: String,
        #[serde(default = "default_offset_param")]
        offset_query_param: String,
        #[serde(default)]
        default_limit: Option<u64>,
    },
    Cursor {
        #[serde(default = "default_cursor_param")]
        cursor_query_param: String,
    },
    /// Page number plus an optional client-chosen page size
    Legacy {
        #[serde(default = "default_page_param")]
        page_kwarg: String,
        #[serde(default)]
        paginate_by_param: Option<String>,
        #[serde(default)]
        paginate_by: Option<u64>,
    },
}

/// A configured style and the type documenting it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PaginationConfig {
    #[serde(flatten)]
    pub style: Pagination,
    #[serde(default)]
    pub documented: Option<String>,
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

impl Pagination {
    pub fn page_number() -> Self {
        Pagination::PageNumber {
            page_query_param: default_page_param(),
        }
    }

    pub fn limit_offset(default_limit: Option<u64>) -> Self {
        Pagination::LimitOffset {
            limit_query_param: default_limit_param(),
            offset_query_param: default_offset_param(),
            default_limit,
        }
    }

    pub fn cursor() -> Self {
        Pagination::Cursor {
            cursor_query_param: default_cursor_param(),
        }
    }

    /// Documented parameters followed by the style's own.
    pub fn parameters(&self, docs: &DocstringIntrospector) -> Vec<Value> {
        let mut parameters = docs.parameters();
        parameters.extend(self.style_parameters());
        parameters
    }

    fn style_parameters(&self) -> Vec<Value> {
        match self {
            Pagination::None => Vec::new(),
            Pagination::PageNumber { page_query_param } => {
                vec![query_parameter(page_query_param, "string", "Page parameter".to_string())]
            }
            Pagination::LimitOffset {
                limit_query_param,
                offset_query_param,
                default_limit,
            } => vec![
                query_parameter(
                    limit_query_param,
                    "string",
                    format!("Limit parameter (default={})", display_option(default_limit)),
                ),
                query_parameter(offset_query_param, "integer", "Offset parameter".to_string()),
            ],
            Pagination::Cursor { cursor_query_param } => {
                vec![query_parameter(cursor_query_param, "string", "Cursor parameter".to_string())]
            }
            Pagination::Legacy {
                page_kwarg,
                paginate_by_param,
                paginate_by,
            } => {
                let mut parameters =
                    vec![query_parameter(page_kwarg, "integer", "Page parameter".to_string())];
                if let Some(param) = paginate_by_param {
                    parameters.push(query_parameter(
                        param,
                        "integer",
                        format!("Page size parameter (default={})", display_option(paginate_by)),
                    ));
                }
                parameters
            }
        }
    }

    /// Envelope fields in output order; `None` for unpaginated lists.
    fn response_fields(&self) -> Option<&'static [(&'static str, &'static str)]> {
        const COUNTED: &[(&str, &str)] = &[
            ("count", "integer"),
            ("next", "string"),
            ("previous", "string"),
            (RESULTS_FIELD, "array"),
        ];
        const UNCOUNTED: &[(&str, &str)] = &[
            ("next", "string"),
            ("previous", "string"),
            (RESULTS_FIELD, "array"),
        ];

        match self {
            Pagination::None => None,
            Pagination::Cursor { .. } => Some(UNCOUNTED),
            _ => Some(COUNTED),
        }
    }

    /// Documented responses with the `"200"` envelope of a list returning `shape` set last.
    pub fn responses(&self, shape: &DataShape, docs: &DocstringIntrospector) -> Map<String, Value> {
        let response = match self.response_fields() {
            Some(fields) => {
                let mut required = Vec::new();
                let mut properties = Map::new();
                for (field, field_type) in fields {
                    required.push(json!(field));
                    let property = if *field == RESULTS_FIELD {
                        shape.build_response_object(true, false)
                    } else {
                        json!({ "type": field_type })
                    };
                    properties.insert(field.to_string(), property);
                }

                json!({
                    "description": "Pagination response",
                    "schema": {
                        "type": "object",
                        "id": format!("{}Paginator", shape.name()),
                        "required": required,
                        "properties": properties,
                    }
                })
            }
            None => json!({
                "description": "Default response",
                "schema": shape.build_response_object(true, false),
            }),
        };

        let mut responses = docs.responses();
        responses.insert("200".to_string(), response);
        responses
    }
}

fn query_parameter(name: &str, data_type: &str, description: String) -> Value {
    json!({
        "in": "query",
        "name": name,
        "type": data_type,
        "description": description,
        "required": false,
    })
}

fn display_option(value: &Option<u64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}
