//! End-to-end documentation pipeline.
//!
//! Ties the stages together: root validation, framework selection, extraction,
//! normalization and rendering. Enrichment sits between normalization and
//! rendering and is driven by the caller (see [`crate::cli::run`]).
//!
//! Only an unusable project root is an error; every other problem is logged and
//! the run still produces a document.

use crate::cli::{Framework, OutputFormat};
use crate::detector::FrameworkDetector;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::extractor::{extractor_for, Diagnostic, Extraction};
use crate::markdown::render_markdown;
use crate::normalizer::normalize_all;
use crate::openapi_builder::OpenApiBuilder;
use crate::serializer::{serialize_json, serialize_yaml};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// How a run ended. Every outcome still renders a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No framework was given and none could be detected
    NoFrameworkDetected,
    /// Frameworks were selected but no route was recognized
    NoEndpointsFound,
    /// This many endpoints are documented
    Documented(usize),
}

/// Endpoints collected from a project, plus what went wrong along the way.
#[derive(Debug)]
pub struct Collection {
    /// Frameworks whose extractors ran
    pub frameworks: Vec<Framework>,
    /// Normalized endpoints, in extraction order
    pub endpoints: Vec<Endpoint>,
    pub diagnostics: Vec<Diagnostic>,
    /// Files left out because they could not be read
    pub skipped_files: usize,
    /// Routes whose handler definition could not be found
    pub unresolved_handlers: usize,
}

impl Collection {
    pub fn outcome(&self) -> RunOutcome {
        if self.frameworks.is_empty() {
            RunOutcome::NoFrameworkDetected
        } else if self.endpoints.is_empty() {
            RunOutcome::NoEndpointsFound
        } else {
            RunOutcome::Documented(self.endpoints.len())
        }
    }
}

/// Checks that `root` exists and is a directory, returning it canonicalized.
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::RootNotDirectory(root.to_path_buf()));
    }
    Ok(root.canonicalize()?)
}

/// Runs the extractors for `frameworks` (or the detected ones) over `root`.
///
/// Extraction results are concatenated in framework order; nothing is merged or
/// de-duplicated.
pub fn collect_endpoints(root: &Path, frameworks: Option<&[Framework]>) -> Collection {
    // Step 1: Pick frameworks
    let mut frameworks = match frameworks {
        Some(selected) => selected.to_vec(),
        None => {
            info!("Detecting frameworks...");
            FrameworkDetector::detect(root).frameworks
        }
    };
    frameworks.sort();
    frameworks.dedup();
    info!("Frameworks: {:?}", frameworks);

    // Step 2: Extract routes
    let mut extraction = Extraction::default();
    for framework in &frameworks {
        let extractor = extractor_for(*framework);
        let found = extractor.extract_routes(root);
        info!("Found {} {} route(s)", found.endpoints.len(), framework.display_name());
        extraction.extend(found);
    }

    // Step 3: Report diagnostics
    let mut unresolved_handlers = 0;
    for diagnostic in &extraction.diagnostics {
        match diagnostic {
            Diagnostic::Scan(e) => debug!("Skipped: {}", e),
            Diagnostic::UnresolvedHandler { file, handler } => {
                unresolved_handlers += 1;
                warn!("Could not find handler `{}` referenced in {}", handler, file);
            }
        }
    }
    let skipped_files = extraction.skipped_files();

    // Step 4: Normalize
    let endpoints = normalize_all(extraction.endpoints);

    Collection {
        frameworks,
        endpoints,
        diagnostics: extraction.diagnostics,
        skipped_files,
        unresolved_handlers,
    }
}

/// Document title: the project directory's name.
pub fn project_title(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "API".to_string())
}

/// Renders `endpoints` in the requested format.
pub fn render(endpoints: &[Endpoint], format: OutputFormat, title: &str) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(endpoints)),
        OutputFormat::Openapi | OutputFormat::OpenapiJson => {
            let mut builder = OpenApiBuilder::new(title);
            for endpoint in endpoints {
                builder.add_endpoint(endpoint);
            }
            let document = builder.build();
            if format == OutputFormat::Openapi {
                serialize_yaml(&document)
            } else {
                serialize_json(&document)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_root_missing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = validate_root(&missing).unwrap_err();

        assert!(matches!(err, Error::RootNotFound(_)));
    }

    #[test]
    fn test_validate_root_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.py");
        fs::write(&file, "").unwrap();

        assert!(matches!(
            validate_root(&file),
            Err(Error::RootNotDirectory(_))
        ));
    }

    #[test]
    fn test_no_framework_detected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# nothing here").unwrap();

        let collection = collect_endpoints(temp_dir.path(), None);

        assert_eq!(collection.outcome(), RunOutcome::NoFrameworkDetected);
        assert!(collection.endpoints.is_empty());
    }

    #[test]
    fn test_forced_framework_without_routes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.py"), "print('hi')\n").unwrap();

        let collection = collect_endpoints(temp_dir.path(), Some(&[Framework::Flask][..]));

        assert_eq!(collection.outcome(), RunOutcome::NoEndpointsFound);
    }

    #[test]
    fn test_detected_framework_is_extracted_and_normalized() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("app.py"),
            "from flask import Flask\napp = Flask(__name__)\n\n@app.route('ping')\ndef ping():\n    return 'pong'\n",
        )
        .unwrap();

        let collection = collect_endpoints(temp_dir.path(), None);

        assert_eq!(collection.frameworks, vec![Framework::Flask]);
        assert_eq!(collection.outcome(), RunOutcome::Documented(1));
        let endpoint = &collection.endpoints[0];
        assert_eq!(endpoint.method, "GET");
        assert_eq!(endpoint.path, "/ping");
        assert_eq!(endpoint.summary, "GET /ping");
    }

    #[test]
    fn test_duplicate_framework_selection_runs_once() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("app.py"),
            "@app.route('/ping')\ndef ping():\n    return 'pong'\n",
        )
        .unwrap();

        let collection =
            collect_endpoints(temp_dir.path(), Some(&[Framework::Flask, Framework::Flask][..]));

        assert_eq!(collection.frameworks, vec![Framework::Flask]);
        assert_eq!(collection.endpoints.len(), 1);
    }

    #[test]
    fn test_project_title_uses_directory_name() {
        assert_eq!(project_title(Path::new("/work/shop-api")), "shop-api");
        assert_eq!(project_title(Path::new("/")), "API");
    }

    #[test]
    fn test_render_empty_markdown() {
        let content = render(&[], OutputFormat::Markdown, "demo").unwrap();
        assert_eq!(content.trim_end(), "# API Documentation");
    }
}
