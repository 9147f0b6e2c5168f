use crate::error::{Error, Result};
use crate::introspector::DocstringIntrospector;
use crate::source::{FieldDef, SourceIndex, TypeDef, TypeRef};
use indexmap::IndexMap;
use log::debug;
use serde_json::{json, Map, Value};

/// One field of a data shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeField {
    pub required: bool,
    pub read_only: bool,
    pub request: Map<String, Value>,
    pub response: Map<String, Value>,
}

impl ShapeField {
    /// A field described by the same object for requests and responses.
    pub fn new(object: Map<String, Value>) -> Self {
        Self {
            required: false,
            read_only: false,
            request: object.clone(),
            response: object,
        }
    }

    /// Builds a field from an entry of a `fields:` documentation table.
    ///
    /// `required` and `readOnly` are lifted out of the entry; the rest is either one object
    /// used for both directions or separate `request`/`response` objects, each falling back
    /// to the other.
    pub fn from_documented(value: &Value) -> Self {
        let mut object = value.as_object().cloned().unwrap_or_default();
        let required = is_truthy(object.shift_remove("required").as_ref());
        let read_only = is_truthy(object.shift_remove("readOnly").as_ref());

        if !object.contains_key("request") && !object.contains_key("response") {
            return Self {
                required,
                read_only,
                request: object.clone(),
                response: object,
            };
        }

        let request = object.get("request").or_else(|| object.get("response"));
        let response = object.get("response").or_else(|| object.get("request"));
        Self {
            required,
            read_only,
            request: as_map(request),
            response: as_map(response),
        }
    }
}

/// A named, ordered set of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataShape {
    name: String,
    fields: IndexMap<String, ShapeField>,
}

impl DataShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: ShapeField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Builds the shape of the struct at `path`.
    pub fn from_source(index: &SourceIndex, path: &str) -> Result<Self> {
        ShapeBuilder {
            index,
            stack: Vec::new(),
        }
        .build(path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &IndexMap<String, ShapeField> {
        &self.fields
    }

    /// `{schema: {...}}`, or `{type: array, items: {schema: {...}}}` when `multiple`.
    ///
    /// The schema carries the shape name as `id` unless `inline`.
    pub fn build_response_object(&self, multiple: bool, inline: bool) -> Value {
        self.schema(multiple, inline, false)
    }

    /// The id-less response schema, as stored in the definitions table.
    pub fn inline_schema(&self) -> Value {
        match self.build_response_object(false, true) {
            Value::Object(mut object) => object.shift_remove("schema").unwrap_or(Value::Null),
            other => other,
        }
    }

    /// Request parameters: one formData parameter per writable field when any of them is a
    /// file upload, otherwise a single body parameter.
    pub fn parameters(&self) -> Vec<Value> {
        let parameters = self.formdata_parameters();
        if parameters
            .iter()
            .any(|p| p.get("type").and_then(Value::as_str) == Some("file"))
        {
            parameters
        } else {
            self.body_parameters()
        }
    }

    fn formdata_parameters(&self) -> Vec<Value> {
        self.fields
            .iter()
            .filter(|(_, field)| !field.read_only)
            .map(|(name, field)| {
                let mut parameter = field.request.clone();
                parameter.insert("required".to_string(), Value::Bool(field.required));
                parameter.insert("in".to_string(), json!("formData"));
                parameter.insert("name".to_string(), json!(name));
                Value::Object(parameter)
            })
            .collect()
    }

    fn body_parameters(&self) -> Vec<Value> {
        let mut parameter = self.schema(false, false, true);
        if let Value::Object(parameter) = &mut parameter {
            if let Some(Value::Object(schema)) = parameter.get_mut("schema") {
                schema.insert("id".to_string(), json!(format!("Request{}", self.name)));
            }
            parameter.insert("in".to_string(), json!("body"));
            parameter.insert("name".to_string(), json!("data"));
        }
        vec![parameter]
    }

    fn schema(&self, multiple: bool, inline: bool, request: bool) -> Value {
        let mut schema = Map::new();
        if !inline {
            schema.insert("id".to_string(), json!(self.name));
        }
        schema.insert("type".to_string(), json!("object"));

        let mut required = Vec::new();
        let mut properties = Map::new();
        for (name, field) in &self.fields {
            let object = if request {
                &field.request
            } else {
                &field.response
            };

            if request && (field.read_only || is_truthy(object.get("readOnly"))) {
                continue;
            }
            if field.required || is_truthy(object.get("required")) {
                required.push(json!(name));
            }
            properties.insert(name.clone(), Value::Object(object.clone()));
        }

        schema.insert("required".to_string(), Value::Array(required));
        schema.insert("properties".to_string(), Value::Object(properties));

        if multiple {
            json!({"type": "array", "items": {"schema": schema}})
        } else {
            json!({ "schema": schema })
        }
    }
}

/// Builds shapes recursively; `stack` holds the structs being built to cut cycles.
struct ShapeBuilder<'a> {
    index: &'a SourceIndex,
    stack: Vec<String>,
}

impl ShapeBuilder<'_> {
    fn build(&mut self, path: &str) -> Result<DataShape> {
        let index = self.index;
        let decl = index
            .find_type(path)
            .ok_or_else(|| Error::Resolution(format!("data shape '{}' was not found", path)))?;
        let TypeDef::Struct(fields) = &decl.def else {
            return Err(Error::Resolution(format!(
                "data shape '{}' is not a struct",
                path
            )));
        };

        debug!("Building data shape {}", decl.name);
        self.stack.push(decl.name.clone());
        let mut shape = DataShape::new(decl.name.clone());
        for field in fields {
            if field.serde.flatten {
                self.flatten_into(&mut shape, field)?;
                continue;
            }
            let built = self.field(field)?;
            shape.fields.insert(field.name.clone(), built);
        }
        self.stack.pop();

        if let Some(entity) = index.type_entity(path) {
            let introspector = DocstringIntrospector::new(&entity);
            for parser in introspector.parsers() {
                for (name, value) in parser.fields() {
                    shape.fields.insert(name, ShapeField::from_documented(&value));
                }
            }
        }

        Ok(shape)
    }

    fn flatten_into(&mut self, shape: &mut DataShape, field: &FieldDef) -> Result<()> {
        let name = &field.type_ref.name;
        if self.stack.contains(name) {
            debug!("Skipping recursive flatten of {}", name);
            return Ok(());
        }
        let nested = self.build(name)?;
        shape.fields.extend(nested.fields);
        Ok(())
    }

    fn field(&mut self, field: &FieldDef) -> Result<ShapeField> {
        let read_only = field.is_read_only();
        let mut request = self.field_object(&field.type_ref, true)?;
        let mut response = self.field_object(&field.type_ref, false)?;

        let description = field
            .doc
            .as_deref()
            .map(crate::docstring::clean_doc)
            .filter(|doc| !doc.is_empty());
        if let Some(description) = description {
            for object in [&mut request, &mut response] {
                if !object.contains_key("schema") {
                    object.insert("description".to_string(), json!(description));
                }
            }
        }

        Ok(ShapeField {
            required: field.is_required() && !read_only,
            read_only,
            request,
            response,
        })
    }

    fn field_object(&mut self, type_ref: &TypeRef, request: bool) -> Result<Map<String, Value>> {
        if type_ref.is_option {
            if let Some(inner) = type_ref.inner() {
                return self.field_object(inner, request);
            }
        }

        if type_ref.is_vec {
            let items = match type_ref.inner() {
                Some(inner) if self.is_struct(&inner.name) => self.nested(&inner.name)?,
                Some(inner) => self.field_object(inner, request)?,
                None => primitive_object("String", request),
            };
            let mut object = Map::new();
            object.insert("type".to_string(), json!("array"));
            object.insert("items".to_string(), Value::Object(items));
            return Ok(object);
        }

        let index = self.index;
        match index.find_type(&type_ref.name).map(|decl| &decl.def) {
            Some(TypeDef::Struct(_)) => self.nested(&type_ref.name),
            Some(TypeDef::Enum(variants)) => {
                let mut object = Map::new();
                object.insert("type".to_string(), json!("string"));
                object.insert("enum".to_string(), json!(variants));
                Ok(object)
            }
            None => Ok(primitive_object(&type_ref.name, request)),
        }
    }

    /// `{schema: {id, ...}}` of a nested struct, or a plain object for a recursive one.
    fn nested(&mut self, name: &str) -> Result<Map<String, Value>> {
        if self.stack.iter().any(|building| building == name) {
            debug!("Recursive data shape {}, using a plain object", name);
            let mut object = Map::new();
            object.insert("type".to_string(), json!("object"));
            return Ok(object);
        }

        let nested = self.build(name)?;
        Ok(as_map(Some(&nested.build_response_object(false, false))))
    }

    fn is_struct(&self, name: &str) -> bool {
        matches!(
            self.index.find_type(name).map(|decl| &decl.def),
            Some(TypeDef::Struct(_))
        )
    }
}

/// Maps a Rust type name to a swagger `(type, format)` pair.
fn swagger_type(type_name: &str) -> (&'static str, Option<&'static str>) {
    match type_name {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => ("integer", None),
        "f32" | "f64" | "Decimal" | "BigDecimal" => ("number", Some("double")),
        "bool" => ("boolean", None),
        "NaiveDate" | "Date" => ("string", Some("date")),
        "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "PrimitiveDateTime" | "SystemTime" => {
            ("string", Some("date-time"))
        }
        "File" | "UploadedFile" | "TempFile" => ("file", None),
        "Email" | "EmailAddress" => ("string", Some("email")),
        _ => ("string", None),
    }
}

fn primitive_object(type_name: &str, request: bool) -> Map<String, Value> {
    let (data_type, format) = match swagger_type(type_name) {
        ("file", format) if !request => ("string", format),
        other => other,
    };

    let mut object = Map::new();
    object.insert("type".to_string(), json!(data_type));
    if let Some(format) = format {
        object.insert("format".to_string(), json!(format));
    }
    object
}

fn as_map(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(object)) => object.clone(),
        _ => Map::new(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
    }
}
