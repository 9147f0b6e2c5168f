use crate::authentication::Authentication;
use crate::data_shape::DataShape;
use crate::error::{Error, Result};
use crate::filters::FilterBackend;
use crate::introspector::{DocstringIntrospector, DocumentedEntity};
use crate::pagination::Pagination;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Method filter value accepted by every operation.
pub const ALLOWED: &str = "all";

static PATH_PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\{(.+?)\}").expect("valid path parameter pattern"));

/// HTTP methods an operation can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// All methods, in the order views are walked.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Lowercase name, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }

    /// Methods whose request body is described by a data shape.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Configuration(format!("unknown HTTP method '{}'", s)))
    }
}

/// How a view dispatches requests to its handler methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// HTTP methods map to named actions (`list`, `create`, ...)
    #[default]
    ViewSet,
    /// One method per HTTP verb (`get`, `post`, ...)
    ApiView,
    /// A function view; the function itself handles every method
    Wrapped,
}

/// Default status code of an action's successful response.
pub fn default_status_code(action: &str) -> u16 {
    match action {
        "create" => 201,
        "destroy" => 204,
        _ => 200,
    }
}

/// Removes unusable parameters and duplicates.
///
/// When any formData parameter is a file upload, body parameters are dropped, otherwise
/// formData parameters are. Parameters whose `methods` list does not contain `method` (or
/// [`ALLOWED`]) are dropped and the `methods` key is removed from the rest. The first
/// parameter with a given name wins.
pub fn clean_parameters(parameters: &[Value], method: &str) -> Vec<Value> {
    let location = |p: &Value| p.get("in").and_then(Value::as_str).map(str::to_string);
    let has_file_upload = parameters.iter().any(|p| {
        location(p).as_deref() == Some("formData")
            && p.get("type").and_then(Value::as_str) == Some("file")
    });
    let dropped = if has_file_upload { "body" } else { "formData" };

    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();
    for parameter in parameters {
        if location(parameter).as_deref() == Some(dropped) {
            continue;
        }

        let name = parameter.get("name").map(parameter_name);
        if let Some(name) = &name {
            if seen.contains(name) {
                continue;
            }
        }

        let mut parameter = parameter.clone();
        let methods = parameter
            .as_object_mut()
            .and_then(|p| p.shift_remove("methods"));
        if !method_allowed(methods.as_ref(), method) {
            debug!("Dropping parameter {:?} for method {}", name, method);
            continue;
        }

        if let Some(name) = name {
            seen.insert(name);
        }
        cleaned.push(parameter);
    }
    cleaned
}

fn parameter_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn method_allowed(methods: Option<&Value>, method: &str) -> bool {
    let allows = |candidate: &Value| {
        candidate
            .as_str()
            .map_or(false, |m| m.eq_ignore_ascii_case(method) || m == ALLOWED)
    };
    match methods {
        None => true,
        Some(Value::Array(methods)) => methods.iter().any(allows),
        Some(single) => allows(single),
    }
}

/// One required string path parameter per `/{name}` placeholder.
pub fn path_parameters(path: &str) -> Vec<Value> {
    PATH_PARAMETER
        .captures_iter(path)
        .map(|captures| {
            json!({
                "name": &captures[1],
                "type": "string",
                "in": "path",
                "required": true,
            })
        })
        .collect()
}

/// Empty strings, sequences and mappings, null and `false`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Number(_) => false,
    }
}

pub fn strip_empty_keys(mut object: Map<String, Value>) -> Map<String, Value> {
    object.retain(|_, value| !is_empty_value(value));
    object
}

/// Title-cases every word: the first letter of each alphabetic run upper, the rest lower.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

/// Human readable view name: `View`/`ViewSet` suffix removed, words split and title-cased.
pub fn view_name(name: &str) -> String {
    let name = name.strip_suffix("View").unwrap_or(name);
    let name = name.strip_suffix("ViewSet").unwrap_or(name);

    let chars: Vec<char> = name.chars().collect();
    let mut spaced = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let after_lower = chars[i - 1].is_lowercase();
            let before_lower = chars.get(i + 1).map_or(false, |next| next.is_lowercase());
            if after_lower || before_lower {
                spaced.push(' ');
            }
        }
        spaced.push(c);
    }

    let words: Vec<&str> = spaced
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    title_case(&words.join(" "))
}

/// Builds the operation of one (view, HTTP method) pair.
#[derive(Debug, Clone)]
pub struct OperationAssembler {
    http_method: HttpMethod,
    action: String,
    path: String,
    display_name: String,
    method: DocstringIntrospector,
    view: DocstringIntrospector,
    request_shape: Option<DataShape>,
    response_shape: Option<DataShape>,
    pagination: (Pagination, DocstringIntrospector),
    filters: Vec<(FilterBackend, DocstringIntrospector)>,
    authentication: Vec<(Authentication, DocstringIntrospector)>,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl OperationAssembler {
    /// `action` is the handler method name (`list`, `get`, ...); `display_name` the view's
    /// human readable name used for default tags and summaries.
    pub fn new(
        http_method: HttpMethod,
        action: impl Into<String>,
        path: impl Into<String>,
        display_name: impl Into<String>,
        method: DocstringIntrospector,
        view: DocstringIntrospector,
    ) -> Self {
        Self {
            http_method,
            action: action.into(),
            path: path.into(),
            display_name: display_name.into(),
            method,
            view,
            request_shape: None,
            response_shape: None,
            pagination: (
                Pagination::None,
                DocstringIntrospector::new(&DocumentedEntity::undocumented("pagination")),
            ),
            filters: Vec::new(),
            authentication: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    pub fn with_shapes(mut self, request: Option<DataShape>, response: Option<DataShape>) -> Self {
        self.request_shape = request;
        self.response_shape = response;
        self
    }

    /// The list pagination style and the documentation of its type.
    pub fn with_pagination(mut self, pagination: Pagination, docs: DocstringIntrospector) -> Self {
        self.pagination = (pagination, docs);
        self
    }

    pub fn with_filters(mut self, filters: Vec<(FilterBackend, DocstringIntrospector)>) -> Self {
        self.filters = filters;
        self
    }

    /// Schemes paired with the documentation of their implementing type.
    pub fn with_authentication(
        mut self,
        authentication: Vec<(Authentication, DocstringIntrospector)>,
    ) -> Self {
        self.authentication = authentication;
        self
    }

    pub fn with_media_types(mut self, consumes: Vec<String>, produces: Vec<String>) -> Self {
        self.consumes = consumes;
        self.produces = produces;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    fn is_list(&self) -> bool {
        self.action.to_lowercase().contains("list")
    }

    /// Data shape path declared in the method docs, then in the view docs.
    pub fn documented_shape(&self, request: bool) -> Option<String> {
        self.method
            .parsers()
            .iter()
            .chain(self.view.parsers())
            .find_map(|parser| parser.serializer(request))
    }

    /// Every data shape path declared in the method and view docs.
    pub fn documented_shapes(&self) -> Vec<String> {
        self.method
            .parsers()
            .iter()
            .chain(self.view.parsers())
            .flat_map(|parser| parser.serializers())
            .collect()
    }

    pub fn tags(&self) -> Vec<String> {
        let tags = self.method.parser().tags();
        if !tags.is_empty() {
            return tags;
        }
        let tags = self.view.parser().tags();
        if !tags.is_empty() {
            return tags;
        }
        vec![self.display_name.to_lowercase()]
    }

    pub fn summary(&self) -> String {
        match self.method.parser().summary() {
            Some(summary) => summary.to_string(),
            None => title_case(
                &format!("{} {}", self.action, self.display_name).replace('_', " "),
            ),
        }
    }

    pub fn description(&self) -> Option<String> {
        self.method.parser().description().map(str::to_string)
    }

    /// Parameters before cleaning.
    pub fn parameters(&self) -> Vec<Value> {
        let mut parameters = self.method.parameters();
        parameters.extend(self.view.parameters());

        if self.http_method.has_body() {
            if let Some(shape) = &self.request_shape {
                parameters.extend(shape.parameters());
            }
        }

        if self.is_list() {
            for (filter, docs) in &self.filters {
                parameters.extend(filter.parameters(docs));
            }
            let (pagination, docs) = &self.pagination;
            parameters.extend(pagination.parameters(docs));
        }

        parameters.extend(path_parameters(&self.path));
        parameters
    }

    pub fn cleaned_parameters(&self) -> Vec<Value> {
        clean_parameters(&self.parameters(), &self.action)
    }

    pub fn responses(&self) -> Map<String, Value> {
        let mut responses = self.view.responses();
        responses.extend(self.method.responses());

        if let Some(shape) = &self.response_shape {
            if responses.get("200").map_or(true, is_empty_value) {
                if self.is_list() {
                    let (pagination, docs) = &self.pagination;
                    responses.extend(pagination.responses(shape, docs));
                } else {
                    let schema = shape
                        .build_response_object(false, false)
                        .get("schema")
                        .cloned()
                        .unwrap_or(Value::Null);
                    responses.insert(
                        "200".to_string(),
                        json!({"description": "Default response", "schema": schema}),
                    );
                }
            }
        }

        let status_code = default_status_code(&self.action);
        let status_key = status_code.to_string();
        // the 200 response is always re-inserted, so it ends up last
        if let Some(mut response) = responses
            .shift_remove("200")
            .filter(|response| !is_empty_value(response))
        {
            if status_code == 204 {
                if let Some(response) = response.as_object_mut() {
                    response.shift_remove("schema");
                }
            }
            if responses.get(&status_key).map_or(true, is_empty_value) {
                responses.insert(status_key.clone(), response);
            }
        }

        if !responses.contains_key(&status_key) {
            responses.insert(status_key, json!({"description": "Empty response"}));
        }
        responses
    }

    pub fn security(&self) -> Vec<Value> {
        let mut security = self.method.security();
        for (scheme, docs) in &self.authentication {
            security.extend(scheme.security(docs));
        }
        security
    }

    pub fn security_definitions(&self) -> Map<String, Value> {
        let mut definitions = self.method.security_definitions();
        for (scheme, docs) in &self.authentication {
            definitions.extend(scheme.security_definitions(docs));
        }
        definitions
    }

    /// The complete operation with empty keys removed.
    pub fn operation(&self) -> Value {
        let mut operation = Map::new();
        operation.insert("tags".to_string(), json!(self.tags()));
        operation.insert("summary".to_string(), json!(self.summary()));
        operation.insert("description".to_string(), json!(self.description()));
        operation.insert("parameters".to_string(), Value::Array(self.cleaned_parameters()));
        operation.insert("consumes".to_string(), json!(self.consumes));
        operation.insert("produces".to_string(), json!(self.produces));
        operation.insert("responses".to_string(), Value::Object(self.responses()));
        operation.insert("security".to_string(), Value::Array(self.security()));
        Value::Object(strip_empty_keys(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_shape::ShapeField;
    use pretty_assertions::assert_eq;

    fn introspector(doc: Option<&str>) -> DocstringIntrospector {
        DocstringIntrospector::new(&DocumentedEntity::new("entity", doc.map(str::to_string)))
    }

    fn assembler(method: HttpMethod, action: &str, doc: Option<&str>) -> OperationAssembler {
        OperationAssembler::new(
            method,
            action,
            "/books/{pk}/",
            "Book",
            introspector(doc),
            introspector(None),
        )
    }

    fn book() -> DataShape {
        let mut object = Map::new();
        object.insert("type".to_string(), json!("string"));
        DataShape::new("Book").with_field(
            "title",
            ShapeField {
                required: true,
                ..ShapeField::new(object)
            },
        )
    }

    fn names(parameters: &[Value]) -> Vec<&str> {
        parameters
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_clean_parameters_dedup_and_methods() {
        let parameters = vec![
            json!({"name": "a", "in": "query", "type": "string"}),
            json!({"name": "a", "in": "query", "type": "integer"}),
            json!({"name": "b", "in": "query", "methods": ["post"]}),
            json!({"name": "c", "in": "query", "methods": ["get", "post"]}),
            json!({"name": "d", "in": "query", "methods": ["all"]}),
        ];

        let cleaned = clean_parameters(&parameters, "get");

        assert_eq!(
            cleaned,
            vec![
                json!({"name": "a", "in": "query", "type": "string"}),
                json!({"name": "c", "in": "query"}),
                json!({"name": "d", "in": "query"}),
            ]
        );
    }

    #[test]
    fn test_clean_parameters_body_vs_formdata() {
        let with_file = vec![
            json!({"name": "data", "in": "body"}),
            json!({"name": "upload", "in": "formData", "type": "file"}),
        ];
        assert_eq!(names(&clean_parameters(&with_file, "post")), vec!["upload"]);

        let without_file = vec![
            json!({"name": "data", "in": "body"}),
            json!({"name": "title", "in": "formData", "type": "string"}),
        ];
        assert_eq!(names(&clean_parameters(&without_file, "post")), vec!["data"]);
    }

    #[test]
    fn test_dropped_parameter_does_not_block_later_duplicate() {
        let parameters = vec![
            json!({"name": "q", "in": "query", "methods": ["post"], "type": "integer"}),
            json!({"name": "q", "in": "query", "type": "string"}),
        ];

        let cleaned = clean_parameters(&parameters, "get");
        assert_eq!(cleaned, vec![json!({"name": "q", "in": "query", "type": "string"})]);
    }

    #[test]
    fn test_path_parameters() {
        assert_eq!(
            path_parameters("/shops/{shop}/books/{pk}/"),
            vec![
                json!({"name": "shop", "type": "string", "in": "path", "required": true}),
                json!({"name": "pk", "type": "string", "in": "path", "required": true}),
            ]
        );
        assert!(path_parameters("/books/").is_empty());
    }

    #[test]
    fn test_view_name_and_title_case() {
        assert_eq!(view_name("BookViewSet"), "Book");
        assert_eq!(view_name("BookListView"), "Book List");
        assert_eq!(view_name("HTTPResponseView"), "Http Response");
        assert_eq!(view_name("list_books"), "List Books");
        assert_eq!(title_case("partial update book"), "Partial Update Book");
        assert_eq!(title_case("o'neil x2y"), "O'Neil X2Y");
    }

    #[test]
    fn test_http_method_parsing() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!(matches!(
            "fetch".parse::<HttpMethod>(),
            Err(Error::Configuration(_))
        ));
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_default_tags_and_summary() {
        let assembler = assembler(HttpMethod::Put, "partial_update", None);

        assert_eq!(assembler.tags(), vec!["book"]);
        assert_eq!(assembler.summary(), "Partial Update Book");
        assert_eq!(assembler.description(), None);
    }

    #[test]
    fn test_documented_tags_and_summary() {
        let assembler = assembler(
            HttpMethod::Get,
            "retrieve",
            Some("Fetch one book\nWith details\n---\ntags:\n- library"),
        );

        assert_eq!(assembler.tags(), vec!["library"]);
        assert_eq!(assembler.summary(), "Fetch one book");
        assert_eq!(assembler.description().as_deref(), Some("With details"));
    }

    #[test]
    fn test_create_moves_default_response() {
        let assembler = assembler(HttpMethod::Post, "create", None).with_shapes(None, Some(book()));
        let responses = assembler.responses();

        assert!(!responses.contains_key("200"));
        assert_eq!(responses["201"]["description"], "Default response");
        assert_eq!(responses["201"]["schema"]["id"], "Book");
    }

    #[test]
    fn test_destroy_strips_schema() {
        let assembler = assembler(
            HttpMethod::Delete,
            "destroy",
            Some("---\nresponses:\n  200:\n    description: gone\n    schema:\n      type: object"),
        );
        let responses = assembler.responses();

        assert_eq!(Value::Object(responses), json!({"204": {"description": "gone"}}));
    }

    #[test]
    fn test_existing_status_response_wins() {
        let assembler = assembler(
            HttpMethod::Post,
            "create",
            Some("---\nresponses:\n  200:\n    description: ok\n  201:\n    description: made"),
        );
        let responses = assembler.responses();

        assert_eq!(Value::Object(responses), json!({"201": {"description": "made"}}));
    }

    #[test]
    fn test_empty_response_placeholder() {
        let responses = assembler(HttpMethod::Get, "retrieve", None).responses();
        assert_eq!(
            Value::Object(responses),
            json!({"200": {"description": "Empty response"}})
        );
    }

    #[test]
    fn test_create_without_shape_gets_empty_response() {
        let responses = assembler(HttpMethod::Post, "create", None).responses();
        assert_eq!(
            Value::Object(responses),
            json!({"201": {"description": "Empty response"}})
        );
    }

    #[test]
    fn test_default_response_is_moved_last() {
        let assembler = assembler(
            HttpMethod::Get,
            "retrieve",
            Some("---\nresponses:\n  200:\n    description: ok\n  404:\n    description: missing"),
        );
        let responses = assembler.responses();

        let keys: Vec<&str> = responses.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["404", "200"]);
        assert_eq!(responses["200"]["description"], "ok");
    }

    #[test]
    fn test_list_parameters_and_envelope() {
        let assembler = OperationAssembler::new(
            HttpMethod::Get,
            "list",
            "/books/",
            "Book",
            introspector(None),
            introspector(None),
        )
        .with_shapes(Some(book()), Some(book()))
        .with_pagination(Pagination::page_number(), introspector(None))
        .with_filters(vec![(
            FilterBackend::Ordering {
                param: "ordering".to_string(),
                fields: vec!["title".to_string()],
            },
            introspector(None),
        )]);

        assert_eq!(names(&assembler.cleaned_parameters()), vec!["ordering", "page"]);
        assert_eq!(assembler.responses()["200"]["schema"]["id"], "BookPaginator");
    }

    #[test]
    fn test_documented_pagination_and_filters() {
        let pagination_docs = introspector(Some(
            "---\nparameters:\n  - name: shelf\n    in: query\n    type: string\n\
             responses:\n  429:\n    description: slow down",
        ));
        let filter_docs = introspector(Some(
            "---\nparameters:\n  - name: q\n    in: query\n    type: string",
        ));
        let list = OperationAssembler::new(
            HttpMethod::Get,
            "list",
            "/books/",
            "Book",
            introspector(None),
            introspector(None),
        )
        .with_shapes(Some(book()), Some(book()))
        .with_pagination(Pagination::page_number(), pagination_docs)
        .with_filters(vec![(
            FilterBackend::Fields {
                fields: vec!["title".to_string()],
            },
            filter_docs,
        )]);

        assert_eq!(
            names(&list.cleaned_parameters()),
            vec!["q", "title", "o", "shelf", "page"]
        );
        let responses = list.responses();
        let keys: Vec<&str> = responses.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["429", "200"]);
        assert_eq!(responses["200"]["schema"]["id"], "BookPaginator");
    }

    #[test]
    fn test_body_parameters_only_for_writes() {
        let post = assembler(HttpMethod::Post, "create", None).with_shapes(Some(book()), None);
        assert_eq!(names(&post.cleaned_parameters()), vec!["data", "pk"]);

        let get = assembler(HttpMethod::Get, "retrieve", None).with_shapes(Some(book()), None);
        assert_eq!(names(&get.cleaned_parameters()), vec!["pk"]);
    }

    #[test]
    fn test_security_from_authentication() {
        let assembler = assembler(HttpMethod::Get, "retrieve", None).with_authentication(vec![(
            Authentication::Token,
            introspector(None),
        )]);

        assert_eq!(assembler.security(), vec![json!({"token_authentication": []})]);
        assert!(assembler
            .security_definitions()
            .contains_key("token_authentication"));
    }

    #[test]
    fn test_operation_strips_empty_keys() {
        let operation = assembler(HttpMethod::Get, "retrieve", None).operation();
        let keys: Vec<&str> = operation
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys, vec!["tags", "summary", "parameters", "responses"]);
    }

    #[test]
    fn test_strip_empty_keys() {
        let object = strip_empty_keys(
            json!({
                "a": "", "b": [], "c": {}, "d": null, "e": false, "f": 0, "g": "x"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        assert_eq!(Value::Object(object), json!({"f": 0, "g": "x"}));
    }
}
