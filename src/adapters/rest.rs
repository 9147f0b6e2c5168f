use super::{section, Adapter};
use crate::authentication::Authentication;
use crate::data_shape::DataShape;
use crate::error::Result;
use crate::filters::{FilterBackend, FilterConfig};
use crate::introspector::{DocstringIntrospector, DocumentedEntity};
use crate::operation::{view_name, HandlerKind, HttpMethod, OperationAssembler};
use crate::pagination::{Pagination, PaginationConfig};
use crate::schema_builder::SwaggerPart;
use crate::source::SourceIndex;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resource {
    pub path: String,
    /// Path of the view type, or of the function for wrapped views
    pub view: String,
    #[serde(default)]
    pub kind: HandlerKind,
    /// HTTP method -> action; derived from the path when empty
    #[serde(default)]
    pub actions: IndexMap<String, String>,
    /// Allowed verbs of api and wrapped views
    #[serde(default)]
    pub methods: Vec<String>,
    /// Data shape used when the docs do not name one
    #[serde(default)]
    pub serializer: Option<String>,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub authentication: Vec<Authentication>,
    /// Media types the view consumes
    #[serde(default = "default_media_types")]
    pub parsers: Vec<String>,
    /// Media types the view produces
    #[serde(default = "default_media_types")]
    pub renderers: Vec<String>,
    /// Wrapper functions applied to the view, outermost first
    #[serde(default)]
    pub decorators: Vec<String>,
}

fn default_media_types() -> Vec<String> {
    vec!["application/json".to_string()]
}

/// Router actions of a view set: detail routes (with a `{...}` placeholder) retrieve, update
/// and destroy; list routes list and create.
pub fn default_actions(path: &str) -> IndexMap<String, String> {
    let pairs: &[(&str, &str)] = if path.contains('{') {
        &[
            ("get", "retrieve"),
            ("put", "update"),
            ("patch", "partial_update"),
            ("delete", "destroy"),
        ]
    } else {
        &[("get", "list"), ("post", "create")]
    };
    pairs
        .iter()
        .map(|(method, action)| (method.to_string(), action.to_string()))
        .collect()
}

/// View sets dispatching HTTP methods to named actions, views with one method per verb, and
/// wrapped function views:
///
/// ```yaml
/// plugin:
///   resources:
///     - path: /books/
///       view: views::BookViewSet
///       serializer: shapes::Book
///       pagination:
///         style: page_number
///         documented: paging::ShelfPagination
///       filters:
///         - backend: ordering
///           fields: [title]
///       authentication: [token]
/// ```
///
/// Every data shape an operation refers to is also published as a definition.
#[derive(Debug, Clone)]
pub struct RestAdapter {
    resources: Vec<Resource>,
}

/// One handler of a view: the HTTP method, the action name and its documented entity.
struct Handler {
    method: HttpMethod,
    action: String,
    entity: DocumentedEntity,
}

impl RestAdapter {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn from_plugin(plugin: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(section(plugin, "resources")?))
    }

    fn handlers(
        &self,
        index: &SourceIndex,
        resource: &Resource,
        view: &DocumentedEntity,
    ) -> Result<Vec<Handler>> {
        let mut handlers = Vec::new();

        match resource.kind {
            HandlerKind::ViewSet => {
                let available = index.methods_of(&resource.view);
                let actions = if resource.actions.is_empty() {
                    default_actions(&resource.path)
                } else {
                    resource.actions.clone()
                };

                for (verb, action) in actions {
                    let method: HttpMethod = verb.parse()?;
                    if !available.contains(&action) {
                        debug!("{} has no action '{}'", resource.view, action);
                        continue;
                    }
                    let entity = index
                        .method_entity(&resource.view, &action)
                        .unwrap_or_else(|| DocumentedEntity::undocumented(action.as_str()));
                    handlers.push(Handler {
                        method,
                        action,
                        entity,
                    });
                }
            }
            HandlerKind::ApiView => {
                let verbs = if resource.methods.is_empty() {
                    let available = index.methods_of(&resource.view);
                    HttpMethod::ALL
                        .into_iter()
                        .filter(|method| available.iter().any(|name| name == method.as_str()))
                        .collect()
                } else {
                    parse_methods(&resource.methods)?
                };

                for method in verbs {
                    let entity = index
                        .method_entity(&resource.view, method.as_str())
                        .unwrap_or_else(|| DocumentedEntity::undocumented(method.as_str()));
                    handlers.push(Handler {
                        method,
                        action: method.as_str().to_string(),
                        entity,
                    });
                }
            }
            HandlerKind::Wrapped => {
                let verbs = if resource.methods.is_empty() {
                    vec![HttpMethod::Get]
                } else {
                    parse_methods(&resource.methods)?
                };

                for method in verbs {
                    handlers.push(Handler {
                        method,
                        action: method.as_str().to_string(),
                        entity: view.clone(),
                    });
                }
            }
        }

        Ok(handlers)
    }

    fn authentication(
        &self,
        index: &SourceIndex,
        resource: &Resource,
    ) -> Result<Vec<(Authentication, DocstringIntrospector)>> {
        resource
            .authentication
            .iter()
            .map(|scheme| {
                let path = match scheme {
                    Authentication::Documented(path) => Some(path.as_str()),
                    _ => None,
                };
                let docs = documentation(index, path, scheme.name().unwrap_or_default())?;
                Ok((scheme.clone(), docs))
            })
            .collect()
    }

    fn pagination(
        &self,
        index: &SourceIndex,
        resource: &Resource,
    ) -> Result<(Pagination, DocstringIntrospector)> {
        let config = &resource.pagination;
        let docs = documentation(index, config.documented.as_deref(), "pagination")?;
        Ok((config.style.clone(), docs))
    }

    fn filters(
        &self,
        index: &SourceIndex,
        resource: &Resource,
    ) -> Result<Vec<(FilterBackend, DocstringIntrospector)>> {
        resource
            .filters
            .iter()
            .map(|config| {
                let docs = documentation(index, config.documented.as_deref(), "filter")?;
                Ok((config.backend.clone(), docs))
            })
            .collect()
    }
}

/// Docs of the type at `path`, or an undocumented entity named `name`.
fn documentation(
    index: &SourceIndex,
    path: Option<&str>,
    name: &str,
) -> Result<DocstringIntrospector> {
    let entity = match path {
        Some(path) => index.entity(path)?,
        None => DocumentedEntity::undocumented(name),
    };
    Ok(DocstringIntrospector::new(&entity))
}

fn parse_methods(methods: &[String]) -> Result<Vec<HttpMethod>> {
    methods.iter().map(|method| method.parse()).collect()
}

fn resolve_shape(index: &SourceIndex, path: Option<String>) -> Result<Option<DataShape>> {
    path.map(|path| DataShape::from_source(index, &path)).transpose()
}

impl Adapter for RestAdapter {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn run(&self, index: &SourceIndex) -> Result<SwaggerPart> {
        let mut part = SwaggerPart::new();
        let mut shape_paths: Vec<String> = Vec::new();

        for resource in &self.resources {
            let view = index
                .entity(&resource.view)?
                .with_wrapped(index.wrapper_docs(&resource.decorators)?);
            let view_docs = DocstringIntrospector::new(&view);
            let display_name = view_name(&view.name);
            let authentication = self.authentication(index, resource)?;
            let (pagination, pagination_docs) = self.pagination(index, resource)?;
            let filters = self.filters(index, resource)?;

            let handlers = self.handlers(index, resource, &view)?;
            if handlers.is_empty() {
                warn!("{} {} has no handlers", resource.path, resource.view);
            }

            for handler in handlers {
                if handler.method == HttpMethod::Options {
                    continue;
                }

                let assembler = OperationAssembler::new(
                    handler.method,
                    handler.action,
                    resource.path.as_str(),
                    display_name.as_str(),
                    DocstringIntrospector::new(&handler.entity),
                    view_docs.clone(),
                )
                .with_pagination(pagination.clone(), pagination_docs.clone())
                .with_filters(filters.clone())
                .with_authentication(authentication.clone())
                .with_media_types(resource.parsers.clone(), resource.renderers.clone());

                let request = assembler
                    .documented_shape(true)
                    .or_else(|| resource.serializer.clone());
                let response = assembler
                    .documented_shape(false)
                    .or_else(|| resource.serializer.clone());
                let assembler = assembler.with_shapes(
                    resolve_shape(index, request)?,
                    resolve_shape(index, response)?,
                );

                shape_paths.extend(assembler.documented_shapes());
                shape_paths.extend(resource.serializer.clone());

                debug!(
                    "{} {} -> {}::{}",
                    handler.method,
                    resource.path,
                    resource.view,
                    assembler.action()
                );
                part.security_definitions
                    .extend(assembler.security_definitions());
                part.add_operation(&resource.path, handler.method.as_str(), assembler.operation());
            }
        }

        let mut seen = HashSet::new();
        for path in shape_paths {
            if !seen.insert(path.clone()) {
                continue;
            }
            let shape = DataShape::from_source(index, &path)?;
            part.definitions
                .insert(shape.name().to_string(), shape.inline_schema());
        }

        Ok(part)
    }
}
