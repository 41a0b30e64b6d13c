//! cs-ts-service - Typed TypeScript service clients from web API controller metadata.
//!
//! The library reads a description of the controllers of a C# web API (types, methods,
//! attributes, XML documentation) and produces TypeScript modules mirroring the API
//! surface: interfaces and `const enum`s for every exchanged class, and one client class
//! per controller with a typed method per action.
//!
//! # Supported Conventions
//!
//! - **ASP.NET Core MVC**: controllers deriving from `Controller`/`ControllerBase`
//! - **ASP.NET Web API**: controllers deriving from `ApiController`
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds type manifests and XML documentation files
//! 2. [`parser`] - Parses manifests into a [`metadata::TypeCatalog`]
//! 3. [`documentation`] - Indexes XML documentation by member signature
//! 4. [`detector`] - Detects which controller convention the catalog follows
//! 5. [`adapter`] - Convention-specific answers about controllers, actions and parameters
//! 6. [`type_resolver`] - Reduces type expressions to a deduplicated, cycle-safe graph
//! 7. [`action_extractor`] - Turns controller methods into actions with routes and parameters
//! 8. [`assembly_builder`] - Walks the controllers and assembles the [`model::AssemblyNode`]
//! 9. [`typescript`] - Emits the TypeScript modules
//! 10. [`serializer`] - Writes modules and model dumps to disk
//!
//! [`optional::Optional`] is the Rust counterpart of the optional-value wrapper whose
//! properties the resolver marks optional: a payload field that is absent, as opposed to
//! present with a null value.
//!
//! # Example Usage
//!
//! ```no_run
//! use cs_ts_service::{
//!     adapter::mvc::MvcAdapter,
//!     assembly_builder::read_controllers,
//!     documentation::Documentation,
//!     parser::ManifestParser,
//!     scanner::FileScanner,
//!     serializer::write_modules,
//!     typescript::{GeneratorOptions, TypeScriptWriter},
//! };
//! use std::path::{Path, PathBuf};
//!
//! let scan_result = FileScanner::new(PathBuf::from("./metadata")).scan().unwrap();
//! let manifests: Vec<_> = ManifestParser::parse_files(&scan_result.manifest_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let catalog = ManifestParser::build_catalog(&manifests);
//!
//! let assembly = read_controllers(&catalog, &MvcAdapter, &Documentation::new());
//!
//! let mut writer = TypeScriptWriter::new(GeneratorOptions::default());
//! writer.write_assembly(&assembly).unwrap();
//! write_modules(writer.output_modules(), Path::new("./services")).unwrap();
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod action_extractor;
pub mod adapter;
pub mod assembly_builder;
pub mod cli;
pub mod detector;
pub mod documentation;
pub mod error;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod optional;
pub mod parser;
pub mod scanner;
pub mod serializer;
pub mod type_resolver;
pub mod typescript;
