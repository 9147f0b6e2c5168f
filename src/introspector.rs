use crate::docstring::DocstringParser;
use serde_json::{Map, Value};

/// A function, method or type together with every documentation string that applies to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentedEntity {
    /// Display name of the entity (type or function identifier)
    pub name: String,
    /// The entity's own documentation
    pub doc: Option<String>,
    /// Ancestor documentation, most-base first, excluding the entity itself
    pub ancestors: Vec<Option<String>>,
    /// Documentation of wrapped callables, outermost first, excluding the entity itself
    pub wrapped: Vec<Option<String>>,
}

impl DocumentedEntity {
    pub fn new(name: impl Into<String>, doc: Option<String>) -> Self {
        Self {
            name: name.into(),
            doc,
            ancestors: Vec::new(),
            wrapped: Vec::new(),
        }
    }

    /// An entity without any documentation.
    pub fn undocumented(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    pub fn with_ancestors(mut self, ancestors: Vec<Option<String>>) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn with_wrapped(mut self, wrapped: Vec<Option<String>>) -> Self {
        self.wrapped = wrapped;
        self
    }
}

/// Collects documentation fragments from an entity's ancestors, wrapped callables and own
/// doc, and merges them with fixed precedence (ancestors, then wrappers, then own).
#[derive(Debug, Clone)]
pub struct DocstringIntrospector {
    name: String,
    parsers: [DocstringParser; 3],
}

impl DocstringIntrospector {
    pub fn new(entity: &DocumentedEntity) -> Self {
        let inheritance = DocstringParser::from_docs(entity.ancestors.iter().map(Option::as_deref));
        let decorators = DocstringParser::from_docs(entity.wrapped.iter().map(Option::as_deref));
        let own = DocstringParser::new(entity.doc.as_deref());

        Self {
            name: entity.name.clone(),
            parsers: [inheritance, decorators, own],
        }
    }

    /// Name of the introspected entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parser of the entity's own documentation.
    pub fn parser(&self) -> &DocstringParser {
        &self.parsers[2]
    }

    /// Inheritance, decorator and own parsers, in precedence order.
    pub fn parsers(&self) -> &[DocstringParser] {
        &self.parsers
    }

    pub fn tags(&self) -> Vec<String> {
        self.parsers.iter().flat_map(DocstringParser::tags).collect()
    }

    /// Parameters of every layer, concatenated without deduplication.
    pub fn parameters(&self) -> Vec<Value> {
        self.parsers
            .iter()
            .flat_map(DocstringParser::parameters)
            .collect()
    }

    /// Responses of every layer; later layers override the same status code.
    pub fn responses(&self) -> Map<String, Value> {
        let mut responses = Map::new();
        for parser in &self.parsers {
            responses.extend(parser.responses());
        }
        responses
    }

    pub fn security(&self) -> Vec<Value> {
        self.parsers
            .iter()
            .flat_map(DocstringParser::security)
            .collect()
    }

    pub fn security_definitions(&self) -> Map<String, Value> {
        let mut definitions = Map::new();
        for parser in &self.parsers {
            definitions.extend(parser.security_definitions());
        }
        definitions
    }
}
