use log::debug;
use serde_json::{Map, Value};

/// Builds the reference marker for a definition name.
pub fn definition_ref(id: &str) -> Value {
    let mut reference = Map::new();
    reference.insert(
        "$ref".to_string(),
        Value::String(format!("#/definitions/{}", id)),
    );
    Value::Object(reference)
}

/// Extracts identified schemas from `items`, rewriting them in place.
///
/// `nesting_level` is `0` for parameters and responses. The returned schemas still carry
/// their `id` and are ordered parents first, siblings in input order.
pub fn extract_definitions<'a, I>(items: I, nesting_level: usize) -> Vec<Map<String, Value>>
where
    I: IntoIterator<Item = &'a mut Value>,
{
    let mut definitions = Vec::new();

    for item in items {
        let Value::Object(item) = item else {
            continue;
        };
        definitions.extend(extract_from_item(item, nesting_level));
    }

    definitions
}

fn extract_from_item(item: &mut Map<String, Value>, nesting_level: usize) -> Vec<Map<String, Value>> {
    let mut definitions = Vec::new();

    let schema = match item.get_mut("schema") {
        Some(Value::Object(schema)) if !schema.is_empty() => Some(std::mem::take(schema)),
        _ => None,
    };

    if let Some(mut schema) = schema {
        let id = schema_id(&schema);

        let mut nested = Vec::new();
        if let Some(Value::Object(properties)) = schema.get_mut("properties") {
            nested.extend(extract_definitions(properties.values_mut(), nesting_level + 1));
        }
        nested.extend(extract_array_items(&mut schema, nesting_level + 1));

        match id {
            Some(id) => {
                debug!("Hoisting schema definition '{}'", id);
                let reference = definition_ref(&id);
                if nesting_level == 0 {
                    item.insert("schema".to_string(), reference);
                } else {
                    if let Value::Object(reference) = reference {
                        item.extend(reference);
                    }
                    item.shift_remove("schema");
                }
                definitions.push(schema);
            }
            None => {
                item.insert("schema".to_string(), Value::Object(schema));
            }
        }
        definitions.extend(nested);
    }

    definitions.extend(extract_array_items(item, nesting_level + 1));
    definitions
}

/// Recurses into `items` when it wraps a `schema`.
fn extract_array_items(source: &mut Map<String, Value>, nesting_level: usize) -> Vec<Map<String, Value>> {
    match source.get_mut("items") {
        Some(items) if items.get("schema").is_some() => {
            extract_definitions(std::iter::once(items), nesting_level)
        }
        _ => Vec::new(),
    }
}

/// Returns the schema `id` as a definition name; null, empty or missing ids mean "inline".
fn schema_id(schema: &Map<String, Value>) -> Option<String> {
    match schema.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
