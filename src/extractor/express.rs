use crate::cli::Framework;
use crate::endpoint::{RawEndpoint, ANY_METHOD};
use crate::extractor::javascript::{find_function, matching_close, split_top_level};
use crate::extractor::{load_sources, normalize_route_path, Diagnostic, Extraction, RouteExtractor};
use crate::scanner::FileScanner;
use log::debug;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// `<app|router|xxxRouter>.<verb>('<path>', ...handlers)`
static ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:app|router|\w+Router)\.(get|post|put|delete|patch|options|head|all)\(\s*(?:'([^']*)'|"([^"]*)"|`([^`$]*)`)"#,
    )
    .expect("valid express route regex")
});

/// Express route extractor
///
/// Recognizes verb registrations on the application or on router objects. The last
/// handler argument is documented: inline callbacks are captured directly and named
/// handlers are looked up in the same file.
pub struct ExpressExtractor;

/// How the final handler argument of a registration refers to its code.
enum HandlerRef<'a> {
    Inline,
    Named(&'a str),
    Other,
}

fn classify_handler(argument: &str) -> HandlerRef<'_> {
    let argument = argument.trim();
    if argument.contains("=>") || argument.starts_with("function") || argument.starts_with("async")
    {
        return HandlerRef::Inline;
    }
    let is_reference = !argument.is_empty()
        && argument
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
    if is_reference {
        HandlerRef::Named(argument)
    } else {
        HandlerRef::Other
    }
}

impl RouteExtractor for ExpressExtractor {
    fn framework(&self) -> Framework {
        Framework::Express
    }

    fn extract_routes(&self, root: &Path) -> Extraction {
        let mut extraction = Extraction::default();
        let scanner =
            FileScanner::new(root.to_path_buf()).with_extensions(&["js", "mjs", "cjs", "ts"]);

        for file in load_sources(root, scanner, &mut extraction) {
            let text = file.text.as_str();

            for captures in ROUTE.captures_iter(text) {
                let (Some(whole), Some(verb)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                let Some(raw_path) = captures
                    .get(2)
                    .or_else(|| captures.get(3))
                    .or_else(|| captures.get(4))
                else {
                    continue;
                };

                let Some(call_open) = whole.as_str().find('(').map(|i| whole.start() + i) else {
                    continue;
                };
                let call_close = matching_close(text, call_open).unwrap_or(text.len());
                let rest = text.get(whole.end()..call_close).unwrap_or_default();
                let handlers = split_top_level(rest);

                // `app.get('env')` reads a setting; a route needs at least one handler
                let Some(last_handler) = handlers.last() else {
                    continue;
                };

                let method = match verb.as_str() {
                    "all" => ANY_METHOD.to_string(),
                    other => other.to_uppercase(),
                };
                let path = normalize_route_path(raw_path.as_str());

                let source = match classify_handler(last_handler) {
                    HandlerRef::Inline => {
                        let start = text[..whole.start()].rfind('\n').map_or(0, |i| i + 1);
                        let mut end = (call_close + 1).min(text.len());
                        if text[end..].starts_with(';') {
                            end += 1;
                        }
                        Some(text[start..end].trim().to_string())
                    }
                    HandlerRef::Named(reference) => {
                        let name = reference.rsplit('.').next().unwrap_or(reference);
                        let found = find_function(text, name);
                        if found.is_none() {
                            extraction.diagnostics.push(Diagnostic::UnresolvedHandler {
                                file: file.relative.clone(),
                                handler: reference.to_string(),
                            });
                        }
                        found
                    }
                    HandlerRef::Other => None,
                };

                debug!("Express route: {} {} in {}", method, path, file.relative);
                extraction.endpoints.push(
                    RawEndpoint::new(Framework::Express, &method, &path, &file.relative)
                        .with_source(source),
                );
            }
        }

        extraction
    }
}
