use crate::cli::Framework;
use crate::scanner::{read_source, FileScanner};
use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

/// Manifest files that declare Python dependencies, besides `requirements*.txt`.
const PYTHON_MANIFESTS: &[&str] = &["pyproject.toml", "Pipfile", "setup.py", "setup.cfg"];

/// `requirements.txt`, `requirements-prod.txt`, `requirements_dev.txt`, ...
fn is_python_manifest(file_name: &str) -> bool {
    (file_name.starts_with("requirements") && file_name.ends_with(".txt"))
        || PYTHON_MANIFESTS.contains(&file_name)
}

/// Dependency names as they appear in Python manifests.
static PYTHON_DEPENDENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?mi)(?:^|["'\s])(flask|fastapi|django)(?:[\[<>=~!;\s"',]|$)"#)
        .expect("valid python dependency regex")
});

/// Framework imports in Python sources.
static PYTHON_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from|import)\s+(flask|fastapi|django)\b")
        .expect("valid python import regex")
});

/// Express imports in JavaScript and TypeScript sources.
static EXPRESS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(\s*['"]express['"]\s*\)|from\s+['"]express['"]"#)
        .expect("valid express import regex")
});

/// Framework detector for identifying web frameworks used in a project.
///
/// The `FrameworkDetector` sniffs dependency manifests (`requirements.txt`,
/// `pyproject.toml`, `package.json`, ...) and framework imports in source files.
/// Multiple frameworks can be detected if the project uses more than one.
///
/// Currently supports detection of:
/// - Flask (via `flask` dependency or `from flask import ...`)
/// - FastAPI (via `fastapi` dependency or `from fastapi import ...`)
/// - Django (via `django` dependency or `from django... import ...`)
/// - Express (via `express` in `package.json` or `require('express')`)
pub struct FrameworkDetector;

/// Result of framework detection.
///
/// Contains the list of all detected web frameworks in the project.
pub struct DetectionResult {
    /// Detected frameworks, sorted by identifier and without duplicates
    pub frameworks: Vec<Framework>,
}

impl FrameworkDetector {
    /// Detects web frameworks used in the project rooted at `root`.
    ///
    /// Unreadable files are ignored; detection never fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use apimatic::detector::FrameworkDetector;
    /// use std::path::Path;
    ///
    /// let result = FrameworkDetector::detect(Path::new("./my-project"));
    /// println!("Detected {} framework(s)", result.frameworks.len());
    /// ```
    pub fn detect(root: &Path) -> DetectionResult {
        debug!("Detecting frameworks in {}", root.display());

        let mut detected = BTreeSet::new();
        let scan = FileScanner::new(root.to_path_buf()).scan();

        for path in &scan.files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

            let is_python_manifest = is_python_manifest(file_name);
            let is_package_json = file_name == "package.json";
            let is_python = extension == "py";
            let is_script = matches!(extension, "js" | "mjs" | "cjs" | "ts");
            if !(is_python_manifest || is_package_json || is_python || is_script) {
                continue;
            }

            let Ok(text) = read_source(path) else {
                continue;
            };

            if is_python_manifest {
                Self::collect(&PYTHON_DEPENDENCY, &text, &mut detected);
            }
            if is_python {
                Self::collect(&PYTHON_IMPORT, &text, &mut detected);
            }
            if is_package_json && Self::package_json_uses_express(&text) {
                detected.insert(Framework::Express);
            }
            if is_script && EXPRESS_IMPORT.is_match(&text) {
                detected.insert(Framework::Express);
            }
        }

        let frameworks: Vec<Framework> = detected.into_iter().collect();
        debug!("Detected frameworks: {:?}", frameworks);

        DetectionResult { frameworks }
    }

    fn collect(pattern: &Regex, text: &str, detected: &mut BTreeSet<Framework>) {
        for captures in pattern.captures_iter(text) {
            let framework = match captures.get(1).map(|m| m.as_str().to_lowercase()) {
                Some(name) if name == "flask" => Framework::Flask,
                Some(name) if name == "fastapi" => Framework::Fastapi,
                Some(name) if name == "django" => Framework::Django,
                _ => continue,
            };
            detected.insert(framework);
        }
    }

    /// Checks the dependency tables of a `package.json` for `express`.
    fn package_json_uses_express(text: &str) -> bool {
        let Ok(manifest) = serde_json::from_str::<serde_json::Value>(text) else {
            return false;
        };
        ["dependencies", "devDependencies", "peerDependencies"]
            .iter()
            .any(|table| manifest.get(table).and_then(|t| t.get("express")).is_some())
    }
}
