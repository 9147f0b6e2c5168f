use crate::error::{Error, Result};
use crate::introspector::DocumentedEntity;
use crate::parser::ParsedFile;
use log::debug;
use std::collections::HashSet;
use std::path::{Component, Path};
use syn::meta::ParseNestedMeta;
use syn::visit::{self, Visit};

/// Type information of a field as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// The base type name (e.g., "String", "User", "i32")
    pub name: String,
    /// Generic type arguments
    pub generic_args: Vec<TypeRef>,
    /// Whether this type is wrapped in `Option<T>`
    pub is_option: bool,
    /// Whether this type is a sequence (`Vec<T>`, slices, arrays)
    pub is_vec: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            is_option: false,
            is_vec: false,
        }
    }

    pub fn option(inner: TypeRef) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: true,
            is_vec: false,
        }
    }

    pub fn vec(inner: TypeRef) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: false,
            is_vec: true,
        }
    }

    /// The wrapped type of an `Option<T>` or `Vec<T>`.
    pub fn inner(&self) -> Option<&TypeRef> {
        if self.is_option || self.is_vec {
            self.generic_args.first()
        } else {
            None
        }
    }

    pub fn from_type(ty: &syn::Type) -> Self {
        match ty {
            syn::Type::Path(type_path) => Self::from_path(&type_path.path),
            syn::Type::Reference(reference) => Self::from_type(&reference.elem),
            syn::Type::Paren(paren) => Self::from_type(&paren.elem),
            syn::Type::Group(group) => Self::from_type(&group.elem),
            syn::Type::Slice(slice) => Self::vec(Self::from_type(&slice.elem)),
            syn::Type::Array(array) => Self::vec(Self::from_type(&array.elem)),
            _ => Self::new("Unknown"),
        }
    }

    fn from_path(path: &syn::Path) -> Self {
        let Some(segment) = path.segments.last() else {
            return Self::new("Unknown");
        };
        let type_name = segment.ident.to_string();

        let generic_args: Vec<TypeRef> = match &segment.arguments {
            syn::PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(inner) => Some(Self::from_type(inner)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        if let Some(inner) = generic_args.first().cloned() {
            match type_name.as_str() {
                "Option" => return Self::option(inner),
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => return Self::vec(inner),
                "Box" | "Arc" | "Rc" => return inner,
                _ => {}
            }
        }

        Self {
            name: type_name,
            generic_args,
            is_option: false,
            is_vec: false,
        }
    }
}

/// Serde attributes recognised on fields and containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerdeAttributes {
    pub rename: Option<String>,
    pub rename_all: Option<String>,
    pub skip: bool,
    /// Never read from input, so the field is read-only
    pub skip_deserializing: bool,
    pub default: bool,
    pub flatten: bool,
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub type_ref: TypeRef,
    pub doc: Option<String>,
    pub serde: SerdeAttributes,
}

impl FieldDef {
    pub fn is_required(&self) -> bool {
        !self.type_ref.is_option && !self.serde.default
    }

    pub fn is_read_only(&self) -> bool {
        self.serde.skip_deserializing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Struct(Vec<FieldDef>),
    Enum(Vec<String>),
}

/// A struct or enum declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub module: Vec<String>,
    pub name: String,
    pub doc: Option<String>,
    pub def: TypeDef,
}

#[derive(Debug, Clone)]
struct FnDecl {
    module: Vec<String>,
    name: String,
    doc: Option<String>,
}

#[derive(Debug, Clone)]
struct MethodDecl {
    name: String,
    doc: Option<String>,
}

#[derive(Debug, Clone)]
struct TraitDecl {
    name: String,
    doc: Option<String>,
    supertraits: Vec<String>,
    methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone)]
struct ImplBlock {
    self_ty: String,
    trait_name: Option<String>,
    methods: Vec<MethodDecl>,
}

/// Documented items of a project, built once from its parsed files.
#[derive(Debug, Default)]
pub struct SourceIndex {
    functions: Vec<FnDecl>,
    types: Vec<TypeDecl>,
    traits: Vec<TraitDecl>,
    impls: Vec<ImplBlock>,
}

impl SourceIndex {
    pub fn new(parsed_files: &[ParsedFile]) -> Self {
        let mut index = Self::default();
        for parsed_file in parsed_files {
            index.add_syntax(module_path_for(&parsed_file.path), &parsed_file.syntax_tree);
        }
        debug!(
            "Indexed {} functions, {} types, {} traits and {} impl blocks",
            index.functions.len(),
            index.types.len(),
            index.traits.len(),
            index.impls.len()
        );
        index
    }

    /// Indexes a single source string as the crate root module.
    pub fn parse_str(source: &str) -> Result<Self> {
        let file = syn::parse_file(source)?;
        let mut index = Self::default();
        index.add_syntax(Vec::new(), &file);
        Ok(index)
    }

    /// Adds the items of `file`, declared in `module`.
    pub fn add_syntax(&mut self, module: Vec<String>, file: &syn::File) {
        let mut visitor = IndexVisitor { index: self, module };
        visitor.visit_file(file);
    }

    /// Resolves a function, a type or a `Type::method` path.
    pub fn entity(&self, path: &str) -> Result<DocumentedEntity> {
        if let Some(entity) = self.function_entity(path).or_else(|| self.type_entity(path)) {
            return Ok(entity);
        }

        let segments = split_path(path);
        if let Some((method, type_path)) = segments.split_last() {
            if !type_path.is_empty() {
                if let Some(entity) = self.method_entity(&type_path.join("::"), method) {
                    return Ok(entity);
                }
            }
        }

        Err(Error::Resolution(format!(
            "'{}' was not found in the scanned sources",
            path
        )))
    }

    pub fn function_entity(&self, path: &str) -> Option<DocumentedEntity> {
        find_by_path(&self.functions, path, |f| (&f.module, &f.name))
            .map(|f| DocumentedEntity::new(f.name.clone(), f.doc.clone()))
    }

    /// A type with the docs of every trait it implements as ancestors.
    pub fn type_entity(&self, path: &str) -> Option<DocumentedEntity> {
        let decl = self.find_type(path)?;
        Some(
            DocumentedEntity::new(decl.name.clone(), decl.doc.clone())
                .with_ancestors(self.trait_ancestors(&decl.name)),
        )
    }

    pub fn method_entity(&self, type_path: &str, method: &str) -> Option<DocumentedEntity> {
        let type_name = self.type_name(type_path)?;
        let blocks: Vec<&ImplBlock> = self
            .impls
            .iter()
            .filter(|block| block.self_ty == type_name)
            .collect();

        for block in &blocks {
            if let Some(found) = block.methods.iter().find(|m| m.name == method) {
                let ancestors = block
                    .trait_name
                    .as_deref()
                    .and_then(|name| self.find_trait(name))
                    .and_then(|decl| decl.methods.iter().find(|m| m.name == method))
                    .map(|declared| vec![declared.doc.clone()])
                    .unwrap_or_default();
                return Some(
                    DocumentedEntity::new(method, found.doc.clone()).with_ancestors(ancestors),
                );
            }
        }

        // provided methods of implemented traits
        blocks
            .iter()
            .filter_map(|block| block.trait_name.as_deref())
            .filter_map(|name| self.find_trait(name))
            .find_map(|decl| decl.methods.iter().find(|m| m.name == method))
            .map(|provided| DocumentedEntity::new(method, provided.doc.clone()))
    }

    /// Method names callable on a type: impl blocks in source order, then trait defaults.
    pub fn methods_of(&self, type_path: &str) -> Vec<String> {
        let Some(type_name) = self.type_name(type_path) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        let blocks: Vec<&ImplBlock> = self
            .impls
            .iter()
            .filter(|block| block.self_ty == type_name)
            .collect();

        let own = blocks.iter().flat_map(|block| block.methods.iter());
        let provided = blocks
            .iter()
            .filter_map(|block| block.trait_name.as_deref())
            .filter_map(|name| self.find_trait(name))
            .flat_map(|decl| decl.methods.iter());

        for method in own.chain(provided) {
            if seen.insert(method.name.as_str()) {
                methods.push(method.name.clone());
            }
        }
        methods
    }

    /// Docs of the wrapper functions named in `paths`, in the given order.
    pub fn wrapper_docs(&self, paths: &[String]) -> Result<Vec<Option<String>>> {
        paths
            .iter()
            .map(|path| self.entity(path).map(|entity| entity.doc))
            .collect()
    }

    pub fn find_type(&self, path: &str) -> Option<&TypeDecl> {
        let found = find_by_path(&self.types, path, |t| (&t.module, &t.name));
        if found.is_none() {
            debug!("Type {} not found", path);
        }
        found
    }

    /// Declared name of a type path; types only known through impl blocks resolve too.
    fn type_name(&self, type_path: &str) -> Option<String> {
        if let Some(decl) = self.find_type(type_path) {
            return Some(decl.name.clone());
        }
        let last = split_path(type_path).last()?.to_string();
        self.impls
            .iter()
            .any(|block| block.self_ty == last)
            .then_some(last)
    }

    fn find_trait(&self, name: &str) -> Option<&TraitDecl> {
        let name = split_path(name).last().copied().unwrap_or(name);
        self.traits.iter().find(|t| t.name == name)
    }

    fn trait_ancestors(&self, type_name: &str) -> Vec<Option<String>> {
        let mut docs = Vec::new();
        let mut visited = HashSet::new();
        for block in self.impls.iter().filter(|block| block.self_ty == type_name) {
            if let Some(trait_name) = &block.trait_name {
                self.collect_trait_chain(trait_name, &mut visited, &mut docs);
            }
        }
        docs
    }

    /// Supertraits first, then the trait itself.
    fn collect_trait_chain(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        docs: &mut Vec<Option<String>>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let Some(decl) = self.find_trait(name) else {
            return;
        };
        for supertrait in &decl.supertraits {
            self.collect_trait_chain(supertrait, visited, docs);
        }
        docs.push(decl.doc.clone());
    }
}

struct IndexVisitor<'a> {
    index: &'a mut SourceIndex,
    module: Vec<String>,
}

impl<'ast> Visit<'ast> for IndexVisitor<'_> {
    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        self.module.push(node.ident.to_string());
        visit::visit_item_mod(self, node);
        self.module.pop();
    }

    // function bodies are not indexed
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.index.functions.push(FnDecl {
            module: self.module.clone(),
            name: node.sig.ident.to_string(),
            doc: doc_comment(&node.attrs),
        });
    }

    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        let container = parse_serde_attributes(&node.attrs);
        let fields = match &node.fields {
            syn::Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|field| parse_field(field, container.rename_all.as_deref()))
                .collect(),
            _ => Vec::new(),
        };

        self.index.types.push(TypeDecl {
            module: self.module.clone(),
            name: node.ident.to_string(),
            doc: doc_comment(&node.attrs),
            def: TypeDef::Struct(fields),
        });
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        let container = parse_serde_attributes(&node.attrs);
        let variants = node
            .variants
            .iter()
            .filter_map(|variant| {
                let serde = parse_serde_attributes(&variant.attrs);
                if serde.skip {
                    return None;
                }
                let ident = variant.ident.to_string();
                Some(serde.rename.unwrap_or_else(|| match &container.rename_all {
                    Some(rule) => apply_rename_rule(rule, &ident),
                    None => ident,
                }))
            })
            .collect();

        self.index.types.push(TypeDecl {
            module: self.module.clone(),
            name: node.ident.to_string(),
            doc: doc_comment(&node.attrs),
            def: TypeDef::Enum(variants),
        });
    }

    fn visit_item_trait(&mut self, node: &'ast syn::ItemTrait) {
        let supertraits = node
            .supertraits
            .iter()
            .filter_map(|bound| match bound {
                syn::TypeParamBound::Trait(bound) => {
                    bound.path.segments.last().map(|s| s.ident.to_string())
                }
                _ => None,
            })
            .collect();
        let methods = node
            .items
            .iter()
            .filter_map(|item| match item {
                syn::TraitItem::Fn(method) => Some(MethodDecl {
                    name: method.sig.ident.to_string(),
                    doc: doc_comment(&method.attrs),
                }),
                _ => None,
            })
            .collect();

        self.index.traits.push(TraitDecl {
            name: node.ident.to_string(),
            doc: doc_comment(&node.attrs),
            supertraits,
            methods,
        });
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        let self_ty = match TypeRef::from_type(&node.self_ty) {
            TypeRef { name, .. } if name != "Unknown" => name,
            _ => return,
        };
        let trait_name = node
            .trait_
            .as_ref()
            .and_then(|(_, path, _)| path.segments.last())
            .map(|segment| segment.ident.to_string());
        let methods = node
            .items
            .iter()
            .filter_map(|item| match item {
                syn::ImplItem::Fn(method) => Some(MethodDecl {
                    name: method.sig.ident.to_string(),
                    doc: doc_comment(&method.attrs),
                }),
                _ => None,
            })
            .collect();

        self.index.impls.push(ImplBlock {
            self_ty,
            trait_name,
            methods,
        });
    }
}

fn parse_field(field: &syn::Field, rename_all: Option<&str>) -> Option<FieldDef> {
    let ident = field.ident.as_ref()?.to_string();
    let serde = parse_serde_attributes(&field.attrs);
    if serde.skip {
        debug!("Skipping field {}", ident);
        return None;
    }

    let name = match (&serde.rename, rename_all) {
        (Some(rename), _) => rename.clone(),
        (None, Some(rule)) => apply_rename_rule(rule, &ident),
        (None, None) => ident,
    };

    Some(FieldDef {
        name,
        type_ref: TypeRef::from_type(&field.ty),
        doc: doc_comment(&field.attrs),
        serde,
    })
}

/// Joins `///` lines (or a `#[doc = "..."]` value) into a single string.
pub fn doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(name_value) => match &name_value.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    let mut serde = SerdeAttributes::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                let value: syn::LitStr = meta.value()?.parse()?;
                serde.rename = Some(value.value());
            } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                let value: syn::LitStr = meta.value()?.parse()?;
                serde.rename_all = Some(value.value());
            } else if meta.path.is_ident("skip") {
                serde.skip = true;
            } else if meta.path.is_ident("skip_deserializing") {
                serde.skip_deserializing = true;
            } else if meta.path.is_ident("flatten") {
                serde.flatten = true;
            } else if meta.path.is_ident("default") {
                serde.default = true;
                skip_meta_value(&meta)?;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });

        if let Err(e) = parsed {
            debug!("Ignoring unreadable serde attribute: {}", e);
        }
    }

    serde
}

/// Consumes `= value` or `(...)` after an attribute key we do not interpret.
fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.step(|cursor| {
            let mut rest = *cursor;
            while let Some((_, next)) = rest.token_tree() {
                rest = next;
            }
            Ok(((), rest))
        })?;
    }
    Ok(())
}

/// Applies a serde `rename_all` rule to a field (snake_case) or variant (PascalCase) ident.
fn apply_rename_rule(rule: &str, ident: &str) -> String {
    let words = split_words(ident);
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let capitalized: Vec<String> = lower
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    match rule {
        "lowercase" => lower.concat(),
        "UPPERCASE" => lower.concat().to_uppercase(),
        "snake_case" => lower.join("_"),
        "SCREAMING_SNAKE_CASE" => lower.join("_").to_uppercase(),
        "kebab-case" => lower.join("-"),
        "SCREAMING-KEBAB-CASE" => lower.join("-").to_uppercase(),
        "PascalCase" => capitalized.concat(),
        "camelCase" => match lower.first() {
            Some(first) => std::iter::once(first.clone())
                .chain(capitalized[1..].iter().cloned())
                .collect(),
            None => String::new(),
        },
        other => {
            debug!("Unknown rename_all rule {}", other);
            ident.to_string()
        }
    }
}

fn split_words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in ident.split('_').filter(|p| !p.is_empty()) {
        let mut current = String::new();
        for c in part.chars() {
            if c.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

/// Module path of a source file, relative to the nearest `src` directory.
fn module_path_for(path: &Path) -> Vec<String> {
    let components: Vec<String> = path
        .with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let start = components
        .iter()
        .rposition(|c| c == "src")
        .map(|i| i + 1)
        .unwrap_or(components.len().saturating_sub(1));

    let mut module = components[start.min(components.len())..].to_vec();
    if matches!(module.last().map(String::as_str), Some("lib" | "main" | "mod")) {
        module.pop();
    }
    module
}

fn split_path(path: &str) -> Vec<&str> {
    path.split("::")
        .flat_map(|part| part.split('.'))
        .map(str::trim)
        .filter(|part| !part.is_empty() && !matches!(*part, "crate" | "self" | "super"))
        .collect()
}

/// First item named by `path`, preferring module-suffix matches over crate-prefixed ones.
fn find_by_path<'a, T>(
    items: &'a [T],
    path: &str,
    key: impl Fn(&T) -> (&Vec<String>, &String),
) -> Option<&'a T> {
    let segments = split_path(path);
    items
        .iter()
        .find(|item| {
            let (module, name) = key(item);
            suffix_match(module, name, &segments)
        })
        .or_else(|| {
            items.iter().find(|item| {
                let (module, name) = key(item);
                crate_prefixed_match(module, name, &segments)
            })
        })
}

/// The path prefix is a suffix of the item's module path.
fn suffix_match(module: &[String], name: &str, segments: &[&str]) -> bool {
    let Some((last, prefix)) = segments.split_last() else {
        return false;
    };
    *last == name
        && prefix.len() <= module.len()
        && module[module.len() - prefix.len()..]
            .iter()
            .zip(prefix)
            .all(|(m, p)| m == p)
}

/// The path is the item's full module path behind a leading crate name.
fn crate_prefixed_match(module: &[String], name: &str, segments: &[&str]) -> bool {
    let Some((last, prefix)) = segments.split_last() else {
        return false;
    };
    *last == name
        && prefix.len() == module.len() + 1
        && module.iter().zip(&prefix[1..]).all(|(m, p)| m == p)
}
