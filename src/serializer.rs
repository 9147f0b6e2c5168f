//! Output of a finished [`SwaggerDocument`] as JSON or YAML.

use crate::error::Result;
use crate::schema_builder::SwaggerDocument;
use log::debug;
use std::fs;
use std::path::Path;

/// Pretty-printed JSON, keys in document order.
pub fn serialize_json(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing swagger document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn serialize_yaml(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing swagger document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Writes `content` to `path`, creating missing parent directories.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_builder::SchemaBuilder;
    use crate::settings::Settings;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn document() -> SwaggerDocument {
        let mut builder = SchemaBuilder::new(Settings::new());
        builder.add_operation(
            "/books/{pk}/",
            "get",
            json!({
                "summary": "Retrieve Book",
                "responses": {"200": {"description": "ok", "schema": {"id": "Book", "type": "object"}}}
            }),
        );
        builder.build()
    }

    #[test]
    fn test_json_keeps_document_order() {
        let json = serialize_json(&document()).unwrap();
        let keys: Vec<String> = serde_json::from_str::<serde_json::Value>(&json)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();

        assert_eq!(
            keys,
            vec![
                "swagger",
                "info",
                "host",
                "basePath",
                "schemes",
                "produces",
                "consumes",
                "paths",
                "definitions",
                "securityDefinitions"
            ]
        );
        assert!(json.lines().count() > 10);
    }

    #[test]
    fn test_yaml_round_trip() {
        let doc = document();
        let yaml = serialize_yaml(&doc).unwrap();

        assert!(yaml.starts_with("swagger:"));
        let parsed: SwaggerDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs").join("swagger.json");

        write_to_file("first", &path).unwrap();
        write_to_file("second", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
