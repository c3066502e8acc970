//! Route extraction module for recognizing web framework route registrations.
//!
//! This module provides a unified interface for extracting routes from different
//! web frameworks. Each framework has its own extractor that knows the textual idioms
//! of that framework. Extractors are best-effort pattern matchers: text that does not
//! match a pattern contributes nothing and is never reported as an error.
//!
//! # Supported Frameworks
//!
//! - **Flask**: See [`flask::FlaskExtractor`]
//! - **FastAPI**: See [`fastapi::FastApiExtractor`]
//! - **Django**: See [`django::DjangoExtractor`]
//! - **Express**: See [`express::ExpressExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use apimatic::cli::Framework;
//! use apimatic::extractor::extractor_for;
//! use std::path::Path;
//!
//! let extractor = extractor_for(Framework::Flask);
//! let extraction = extractor.extract_routes(Path::new("./my-project"));
//! println!("Found {} routes", extraction.endpoints.len());
//! ```

pub mod django;
pub mod express;
pub mod fastapi;
pub mod flask;

mod javascript;
mod python;

use crate::cli::Framework;
use crate::endpoint::RawEndpoint;
use crate::error::ScanError;
use crate::scanner::{read_source, relative_display, FileScanner};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Trait for extracting route registrations from a project source tree.
///
/// Implementations only read the file system. A file that cannot be read is recorded
/// as a [`Diagnostic::Scan`] and the scan continues with the remaining files.
pub trait RouteExtractor {
    /// The framework this extractor recognizes.
    fn framework(&self) -> Framework;

    /// Extracts all route registrations found under `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - The project source root; file paths in the result are relative to it
    fn extract_routes(&self, root: &Path) -> Extraction;
}

/// Returns the extractor registered for `framework`.
pub fn extractor_for(framework: Framework) -> Box<dyn RouteExtractor> {
    match framework {
        Framework::Flask => Box::new(flask::FlaskExtractor),
        Framework::Fastapi => Box::new(fastapi::FastApiExtractor),
        Framework::Django => Box::new(django::DjangoExtractor),
        Framework::Express => Box::new(express::ExpressExtractor),
    }
}

/// Output of one extractor run.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Recognized routes, in file order then match order
    pub endpoints: Vec<RawEndpoint>,
    /// Recoverable problems met along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Appends another extraction's results to this one.
    pub fn extend(&mut self, other: Extraction) {
        self.endpoints.extend(other.endpoints);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Number of files and directories skipped because they could not be read
    pub fn skipped_files(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Scan(_)))
            .count()
    }
}

/// A recoverable problem found during extraction.
#[derive(Debug)]
pub enum Diagnostic {
    /// A candidate file could not be read; it contributed no endpoints.
    Scan(ScanError),
    /// A route names a handler whose definition could not be located. The route is
    /// still emitted, without handler source.
    UnresolvedHandler { file: String, handler: String },
}

/// A candidate file loaded into memory.
pub(crate) struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated
    pub relative: String,
    pub text: String,
}

/// Scans `root` with `scanner` and reads every candidate file.
///
/// Unreadable files and directories are recorded in `extraction` and left out of
/// the result.
pub(crate) fn load_sources(
    root: &Path,
    scanner: FileScanner,
    extraction: &mut Extraction,
) -> Vec<SourceFile> {
    let scan = scanner.scan();
    extraction
        .diagnostics
        .extend(scan.warnings.into_iter().map(Diagnostic::Scan));
    let mut sources = Vec::with_capacity(scan.files.len());

    for path in scan.files {
        match read_source(&path) {
            Ok(text) => sources.push(SourceFile {
                relative: relative_display(root, &path),
                path,
                text,
            }),
            Err(e) => {
                warn!("Skipping file: {}", e);
                extraction.diagnostics.push(Diagnostic::Scan(e));
            }
        }
    }

    debug!("Loaded {} candidate files", sources.len());
    sources
}

/// Normalizes a route path so that it starts with exactly one `/`.
///
/// Regex anchors (`^` at the start, `$` at the end) are stripped first, so Django
/// `re_path` patterns come out as plain paths. An empty path becomes `/`.
pub fn normalize_route_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix('^').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('$').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("\\Z").unwrap_or(trimmed);

    format!("/{}", trimmed.trim_start_matches('/'))
}

/// Parses the contents of a `methods=[...]` argument into uppercase verbs.
///
/// Quotes and whitespace are removed, empty entries skipped and duplicates dropped
/// while keeping first-seen order.
pub(crate) fn parse_methods_list(list: &str) -> Vec<String> {
    let mut methods: Vec<String> = Vec::new();

    for item in list.split(',') {
        let method = item
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .trim()
            .to_uppercase();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    methods
}
