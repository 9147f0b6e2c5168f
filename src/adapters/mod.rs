//! Adapters turning a project's configuration and sources into swagger fragments.
//!
//! Each adapter reads its own section of the `plugin:` configuration and produces a
//! [`SwaggerPart`] that the [`SchemaBuilder`](crate::schema_builder::SchemaBuilder) merges
//! into the final document.
//!
//! - [`simple::SimpleAdapter`]: a plain map of `(path, method, handler)` endpoints
//! - [`rest::RestAdapter`]: resource views with data shapes, pagination, filters and auth
//! - [`micro::MicroAdapter`]: resource types responding through `on_<verb>` methods

pub mod micro;
pub mod rest;
pub mod simple;

use crate::error::{Error, Result};
use crate::schema_builder::SwaggerPart;
use crate::source::SourceIndex;
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Produces the paths, definitions and security definitions of one application style.
pub trait Adapter {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Builds the fragment for every configured endpoint.
    ///
    /// Fails with [`Error::Resolution`] when a configured handler, view or type path is not
    /// found in `index`.
    fn run(&self, index: &SourceIndex) -> Result<SwaggerPart>;
}

/// Available adapters
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AdapterKind {
    /// Endpoints mapped to documented functions
    Simple,
    /// Resource views with data shapes
    Rest,
    /// Resource types with `on_<verb>` responders
    Micro,
}

/// Creates the adapter of `kind` from the `plugin:` configuration section.
pub fn adapter_for(kind: AdapterKind, plugin: &Map<String, Value>) -> Result<Box<dyn Adapter>> {
    let adapter: Box<dyn Adapter> = match kind {
        AdapterKind::Simple => Box::new(simple::SimpleAdapter::from_plugin(plugin)?),
        AdapterKind::Rest => Box::new(rest::RestAdapter::from_plugin(plugin)?),
        AdapterKind::Micro => Box::new(micro::MicroAdapter::from_plugin(plugin)?),
    };
    Ok(adapter)
}

/// Deserializes `plugin.<key>`; a missing or null key is a configuration error.
pub(crate) fn section<T: DeserializeOwned>(plugin: &Map<String, Value>, key: &str) -> Result<T> {
    let value = plugin
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| {
            Error::Configuration(format!(
                "Configuration is missing. Please add plugin.{} to your configuration file.",
                key
            ))
        })?;

    serde_json::from_value(value.clone())
        .map_err(|e| Error::Configuration(format!("invalid plugin.{}: {}", key, e)))
}
