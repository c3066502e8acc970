use crate::cli::Framework;
use crate::endpoint::RawEndpoint;
use crate::extractor::python::decorated_function;
use crate::extractor::{
    load_sources, normalize_route_path, parse_methods_list, Extraction, RouteExtractor,
};
use crate::scanner::FileScanner;
use log::debug;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

/// `@<app|router>.<verb>('<path>', ...)`
static VERB_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@[ \t]*\w+\.(get|post|put|delete|patch|options|head)\(\s*(?:'([^']*)'|"([^"]*)")"#,
    )
    .expect("valid fastapi verb regex")
});

/// `@<app|router>.api_route('<path>'[, methods=[...]])`
static API_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@[ \t]*\w+\.api_route\(\s*(?:'([^']*)'|"([^"]*)")(?:[^)]*?\bmethods\s*=\s*[\[(]([^\])]*)[\])])?"#,
    )
    .expect("valid fastapi api_route regex")
});

/// FastAPI route extractor
///
/// Handles the verb decorators (`@app.get`, `@router.post`, ...) and the generic
/// `api_route` decorator with an optional `methods` list.
pub struct FastApiExtractor;

/// One decorator match, before it is expanded into endpoints.
struct DecoratorMatch {
    start: usize,
    end: usize,
    methods: Vec<String>,
    path: String,
}

fn quoted_path(captures: &Captures, first: usize) -> Option<String> {
    captures
        .get(first)
        .or_else(|| captures.get(first + 1))
        .map(|m| normalize_route_path(m.as_str()))
}

impl FastApiExtractor {
    fn decorator_matches(text: &str) -> Vec<DecoratorMatch> {
        let mut matches = Vec::new();

        for captures in VERB_ROUTE.captures_iter(text) {
            let (Some(whole), Some(verb), Some(path)) =
                (captures.get(0), captures.get(1), quoted_path(&captures, 2))
            else {
                continue;
            };
            matches.push(DecoratorMatch {
                start: whole.start(),
                end: whole.end(),
                methods: vec![verb.as_str().to_uppercase()],
                path,
            });
        }

        for captures in API_ROUTE.captures_iter(text) {
            let (Some(whole), Some(path)) = (captures.get(0), quoted_path(&captures, 1)) else {
                continue;
            };
            let methods = captures
                .get(3)
                .map(|m| parse_methods_list(m.as_str()))
                .filter(|methods| !methods.is_empty())
                .unwrap_or_else(|| vec!["GET".to_string()]);
            matches.push(DecoratorMatch {
                start: whole.start(),
                end: whole.end(),
                methods,
                path,
            });
        }

        // Keep source order across both patterns
        matches.sort_by_key(|m| m.start);
        matches
    }
}

impl RouteExtractor for FastApiExtractor {
    fn framework(&self) -> Framework {
        Framework::Fastapi
    }

    fn extract_routes(&self, root: &Path) -> Extraction {
        let mut extraction = Extraction::default();
        let scanner = FileScanner::new(root.to_path_buf()).with_extensions(&["py"]);

        for file in load_sources(root, scanner, &mut extraction) {
            for decorator in Self::decorator_matches(&file.text) {
                let source = decorated_function(&file.text, decorator.start, decorator.end);

                for method in &decorator.methods {
                    debug!("FastAPI route: {} {} in {}", method, decorator.path, file.relative);
                    extraction.endpoints.push(
                        RawEndpoint::new(Framework::Fastapi, method, &decorator.path, &file.relative)
                            .with_source(source.clone()),
                    );
                }
            }
        }

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extract(code: &str) -> Vec<RawEndpoint> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("main.py"), code).unwrap();
        FastApiExtractor.extract_routes(temp_dir.path()).endpoints
    }

    #[test]
    fn test_verb_decorators() {
        let code = r#"
from fastapi import FastAPI
app = FastAPI()

@app.get("/users", response_model=List[dict])
def get_users():
    return users

@app.get("/users/{user_id}")
def get_user(user_id: int):
    raise HTTPException(status_code=404, detail="User not found")

@app.post("/users")
def create_user(user: User):
    return user
"#;
        let routes = extract(code);

        let summary: Vec<(&str, &str)> = routes
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("GET", "/users"),
                ("GET", "/users/{user_id}"),
                ("POST", "/users"),
            ]
        );
        assert!(routes[1].source.as_deref().unwrap().contains("HTTPException"));
        assert!(routes.iter().all(|r| r.framework == Framework::Fastapi));
    }

    #[test]
    fn test_router_and_async_handlers() {
        let code = r#"
router = APIRouter()

@router.delete('/items/{item_id}')
async def delete_item(item_id: int):
    await db.delete(item_id)
"#;
        let routes = extract(code);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].method, "DELETE");
        assert!(routes[0].source.as_deref().unwrap().contains("async def delete_item"));
    }

    #[test]
    fn test_api_route_expands_methods() {
        let code = r#"
@app.api_route("/health", methods=["GET", "HEAD"])
def health():
    return {"ok": True}

@app.api_route("/legacy")
def legacy():
    return {}
"#;
        let routes = extract(code);

        let summary: Vec<(&str, &str)> = routes
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("GET", "/health"), ("HEAD", "/health"), ("GET", "/legacy")]
        );
    }

    #[test]
    fn test_middleware_and_events_are_ignored() {
        let code = r#"
@app.middleware("http")
async def log_requests(request, call_next):
    return await call_next(request)

@app.on_event("startup")
def startup():
    pass
"#;
        assert!(extract(code).is_empty());
    }
}
