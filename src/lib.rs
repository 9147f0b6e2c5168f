//! Swagger From Docs - Swagger 2.0 documents from the doc comments of Rust web projects.
//!
//! Handlers, views and data shapes carry their API documentation in their doc comments: a
//! free-text summary and description, optionally followed by a `---` line and a YAML block
//! with `tags`, `parameters`, `responses`, `security`, `securityDefinitions`, `serializers`
//! and `fields`. This library collects those fragments along trait and wrapper chains,
//! assembles one operation per endpoint and merges everything into a single document, hoisting
//! every identified inline schema into `definitions`.
//!
//! # Architecture
//!
//! 1. [`scanner`] and [`parser`] - find and parse the project's `.rs` files
//! 2. [`source`] - index functions, types, traits and impl blocks with their doc comments
//! 3. [`docstring`] - parse one doc comment into summary, description and YAML fragment
//! 4. [`introspector`] - compose the fragments of an entity, its ancestors and its wrappers
//! 5. [`data_shape`], [`pagination`], [`filters`], [`authentication`] - resource building blocks
//! 6. [`operation`] - assemble a complete operation object
//! 7. [`adapters`] - turn the `plugin:` configuration into swagger fragments
//! 8. [`definitions`] and [`schema_builder`] - hoist schemas and build the document
//! 9. [`serializer`] - write JSON or YAML
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_docs::{
//!     adapters::{adapter_for, AdapterKind},
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     schema_builder::SchemaBuilder,
//!     serializer::serialize_json,
//!     settings::Config,
//!     source::SourceIndex,
//! };
//! use std::path::{Path, PathBuf};
//!
//! let config = Config::load(Path::new("./my-service/swagger.yaml")).unwrap();
//! let scan_result = FileScanner::new(PathBuf::from("./my-service")).scan().unwrap();
//! let outcome = AstParser::parse_files(&scan_result.rust_files);
//! let index = SourceIndex::new(&outcome.files);
//!
//! let adapter = adapter_for(AdapterKind::Simple, &config.plugin).unwrap();
//! let mut builder = SchemaBuilder::new(config.swagger);
//! builder.extend(adapter.run(&index).unwrap());
//!
//! println!("{}", serialize_json(&builder.build()).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! See the [`cli`] module.

pub mod adapters;
pub mod authentication;
pub mod cli;
pub mod data_shape;
pub mod definitions;
pub mod docstring;
pub mod error;
pub mod filters;
pub mod introspector;
pub mod operation;
pub mod pagination;
pub mod parser;
pub mod scanner;
pub mod schema_builder;
pub mod serializer;
pub mod settings;
pub mod source;
