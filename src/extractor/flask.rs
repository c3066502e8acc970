use crate::cli::Framework;
use crate::endpoint::RawEndpoint;
use crate::extractor::python::decorated_function;
use crate::extractor::{
    load_sources, normalize_route_path, parse_methods_list, Extraction, RouteExtractor,
};
use crate::scanner::FileScanner;
use log::debug;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// `@<app|blueprint>.route('<path>'[, ..., methods=[...]])`
static ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@[ \t]*\w+\.route\(\s*(?:'([^']*)'|"([^"]*)")(?:[^)]*?\bmethods\s*=\s*[\[(]([^\])]*)[\])])?"#,
    )
    .expect("valid flask route regex")
});

/// Flask route extractor
///
/// Recognizes `route` decorators on the application object or any blueprint. A
/// decorator without a `methods` list documents a `GET` route.
pub struct FlaskExtractor;

impl RouteExtractor for FlaskExtractor {
    fn framework(&self) -> Framework {
        Framework::Flask
    }

    fn extract_routes(&self, root: &Path) -> Extraction {
        let mut extraction = Extraction::default();
        let scanner = FileScanner::new(root.to_path_buf()).with_extensions(&["py"]);

        for file in load_sources(root, scanner, &mut extraction) {
            for captures in ROUTE.captures_iter(&file.text) {
                let Some(whole) = captures.get(0) else {
                    continue;
                };
                let Some(raw_path) = captures.get(1).or_else(|| captures.get(2)) else {
                    continue;
                };
                let path = normalize_route_path(raw_path.as_str());

                let methods = captures
                    .get(3)
                    .map(|m| parse_methods_list(m.as_str()))
                    .filter(|methods| !methods.is_empty())
                    .unwrap_or_else(|| vec!["GET".to_string()]);

                let source = decorated_function(&file.text, whole.start(), whole.end());

                for method in methods {
                    debug!("Flask route: {} {} in {}", method, path, file.relative);
                    extraction.endpoints.push(
                        RawEndpoint::new(Framework::Flask, &method, &path, &file.relative)
                            .with_source(source.clone()),
                    );
                }
            }
        }

        extraction
    }
}
