//! Apimatic - API documentation from web framework source code.
//!
//! This library scans a project tree for route registrations of common web frameworks
//! and renders them as a Markdown report or an OpenAPI 3.0 document. Recognition is
//! textual and best-effort: extractors match the idioms each framework documents, they
//! do not parse the host language.
//!
//! # Supported Frameworks
//!
//! - **Flask**: `@app.route(...)` / `@bp.route(...)` decorators, with `methods=[...]`
//! - **FastAPI**: `@app.get(...)`, `@router.post(...)`, `@app.api_route(...)`
//! - **Django**: `path(...)` / `re_path(...)` entries in `urls.py`, resolved into `views.py`
//! - **Express**: `app.get(...)`, `router.post(...)`, `app.all(...)` in JS/TS files
//!
//! # Architecture
//!
//! 1. [`detector`] - Sniffs manifests and imports to pick frameworks
//! 2. [`scanner`] - Walks the project tree for candidate files
//! 3. [`extractor`] - Recognizes route registrations per framework
//! 4. [`normalizer`] - Gives every endpoint record the same shape
//! 5. [`enrich`] - Optionally adds generated documentation (Ollama)
//! 6. [`markdown`] / [`openapi_builder`] - Render the final document
//! 7. [`serializer`] - Writes OpenAPI as YAML or JSON
//!
//! [`pipeline`] ties these together.
//!
//! # Example Usage
//!
//! ```no_run
//! use apimatic::cli::OutputFormat;
//! use apimatic::pipeline::{collect_endpoints, project_title, render, validate_root};
//! use std::path::Path;
//!
//! let root = validate_root(Path::new("./my-project")).unwrap();
//! let collection = collect_endpoints(&root, None);
//! let markdown = render(&collection.endpoints, OutputFormat::Markdown, &project_title(&root)).unwrap();
//! println!("{}", markdown);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod detector;
pub mod endpoint;
pub mod enrich;
pub mod error;
pub mod extractor;
pub mod markdown;
pub mod normalizer;
pub mod openapi_builder;
pub mod pipeline;
pub mod scanner;
pub mod serializer;
