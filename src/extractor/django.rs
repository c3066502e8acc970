use crate::cli::Framework;
use crate::endpoint::{RawEndpoint, ANY_METHOD};
use crate::extractor::python::{class_view_methods, find_definition, DefinitionKind};
use crate::extractor::{
    load_sources, normalize_route_path, Diagnostic, Extraction, RouteExtractor, SourceFile,
};
use crate::scanner::{read_source, relative_display, FileScanner};
use log::{debug, warn};
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

/// `path('<route>', views.name[.as_view()], ...)`, also `re_path` and legacy `url`
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:re_path|path|url)\(\s*r?(?:'([^']*)'|"([^"]*)")\s*,\s*([\w.]+)(\.as_view\()?"#,
    )
    .expect("valid django url regex")
});

/// View references that are not views.
const NON_VIEWS: &[&str] = &["include"];

/// Django URLconf extractor
///
/// Reads every `urls.py`, resolves each referenced view in the sibling `views.py`,
/// and documents function views as `ANY` and class-based views once per verb method
/// they define.
pub struct DjangoExtractor;

/// The `views.py` next to a URLconf, loaded on first use.
struct ViewsModule {
    relative: String,
    text: Option<String>,
}

impl DjangoExtractor {
    fn load_views(root: &Path, urls: &SourceFile, extraction: &mut Extraction) -> ViewsModule {
        let views_path = urls
            .path
            .parent()
            .map(|dir| dir.join("views.py"))
            .unwrap_or_else(|| root.join("views.py"));
        let relative = relative_display(root, &views_path);

        let text = match read_source(&views_path) {
            Ok(text) => Some(text),
            Err(e) if e.source.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Skipping file: {}", e);
                extraction.diagnostics.push(Diagnostic::Scan(e));
                None
            }
        };

        ViewsModule { relative, text }
    }
}

impl RouteExtractor for DjangoExtractor {
    fn framework(&self) -> Framework {
        Framework::Django
    }

    fn extract_routes(&self, root: &Path) -> Extraction {
        let mut extraction = Extraction::default();
        let scanner = FileScanner::new(root.to_path_buf())
            .with_extensions(&["py"])
            .with_file_name("urls.py");

        for urls in load_sources(root, scanner, &mut extraction) {
            let mut views: Option<ViewsModule> = None;

            for captures in URL_PATTERN.captures_iter(&urls.text) {
                let (Some(raw_path), Some(view_ref)) =
                    (captures.get(1).or_else(|| captures.get(2)), captures.get(3))
                else {
                    continue;
                };

                let view_name = view_ref.as_str().rsplit('.').next().unwrap_or_default();
                if view_name.is_empty() || NON_VIEWS.contains(&view_name) {
                    continue;
                }
                let path = normalize_route_path(raw_path.as_str());

                let module =
                    views.get_or_insert_with(|| Self::load_views(root, &urls, &mut extraction));
                let definition = module
                    .text
                    .as_deref()
                    .and_then(|text| find_definition(text, view_name));

                let Some((kind, source)) = definition else {
                    debug!("Unresolved Django view {} for {}", view_name, path);
                    extraction.diagnostics.push(Diagnostic::UnresolvedHandler {
                        file: urls.relative.clone(),
                        handler: view_ref.as_str().to_string(),
                    });
                    extraction.endpoints.push(RawEndpoint::new(
                        Framework::Django,
                        ANY_METHOD,
                        &path,
                        &urls.relative,
                    ));
                    continue;
                };

                let mut methods = match kind {
                    DefinitionKind::Class => class_view_methods(&source),
                    DefinitionKind::Function => Vec::new(),
                };
                if methods.is_empty() {
                    methods.push(ANY_METHOD.to_string());
                }

                for method in methods {
                    debug!("Django route: {} {} -> {}", method, path, view_name);
                    extraction.endpoints.push(
                        RawEndpoint::new(Framework::Django, &method, &path, &module.relative)
                            .with_source(Some(source.clone())),
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

    const VIEWS: &str = r#"from django.http import JsonResponse
from django.views import View


def list_users(request):
    return JsonResponse([], safe=False)


class ArticleView(View):
    def get(self, request, pk):
        return JsonResponse({"id": pk})

    def put(self, request, pk):
        return JsonResponse({"id": pk})
"#;

    fn project(urls: &str, views: Option<&str>) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path().join("blog");
        fs::create_dir(&app).unwrap();
        fs::write(app.join("urls.py"), urls).unwrap();
        if let Some(views) = views {
            fs::write(app.join("views.py"), views).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_function_view_is_any_with_source() {
        let temp_dir = project(
            "urlpatterns = [\n    path('users/', views.list_users),\n]\n",
            Some(VIEWS),
        );

        let extraction = DjangoExtractor.extract_routes(temp_dir.path());
        let routes = extraction.endpoints;

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].method, "ANY");
        assert_eq!(routes[0].path, "/users/");
        assert_eq!(routes[0].framework, Framework::Django);
        assert_eq!(routes[0].file, "blog/views.py");
        assert!(routes[0].source.as_deref().unwrap().contains("def list_users"));
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_class_view_emits_one_route_per_verb() {
        let temp_dir = project(
            "urlpatterns = [path(\"articles/<int:pk>/\", views.ArticleView.as_view(), name=\"article\")]\n",
            Some(VIEWS),
        );

        let routes = DjangoExtractor.extract_routes(temp_dir.path()).endpoints;

        let methods: Vec<&str> = routes.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(methods, vec!["GET", "PUT"]);
        assert!(routes.iter().all(|r| r.path == "/articles/<int:pk>/"));
        assert_eq!(routes[0].source, routes[1].source);
    }

    #[test]
    fn test_re_path_anchors_are_stripped() {
        let temp_dir = project(
            "urlpatterns = [re_path(r'^archive/$', views.list_users)]\n",
            Some(VIEWS),
        );

        let routes = DjangoExtractor.extract_routes(temp_dir.path()).endpoints;

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/archive/");
    }

    #[test]
    fn test_unresolved_view_is_still_emitted() {
        let temp_dir = project(
            "urlpatterns = [path('reports/', views.report)]\n",
            Some(VIEWS),
        );

        let extraction = DjangoExtractor.extract_routes(temp_dir.path());

        assert_eq!(extraction.endpoints.len(), 1);
        let route = &extraction.endpoints[0];
        assert_eq!(route.method, "ANY");
        assert_eq!(route.file, "blog/urls.py");
        assert!(route.source.is_none());
        assert!(matches!(
            &extraction.diagnostics[0],
            Diagnostic::UnresolvedHandler { handler, .. } if handler == "views.report"
        ));
    }

    #[test]
    fn test_missing_views_module_is_a_resolution_miss() {
        let temp_dir = project("urlpatterns = [path('', views.home)]\n", None);

        let extraction = DjangoExtractor.extract_routes(temp_dir.path());

        assert_eq!(extraction.endpoints.len(), 1);
        assert_eq!(extraction.endpoints[0].path, "/");
        assert_eq!(extraction.skipped_files(), 0);
    }

    #[test]
    fn test_include_is_not_a_route() {
        let temp_dir = project(
            "urlpatterns = [path('api/', include('api.urls'))]\n",
            Some(VIEWS),
        );

        let extraction = DjangoExtractor.extract_routes(temp_dir.path());

        assert!(extraction.endpoints.is_empty());
    }

    #[test]
    fn test_only_urls_modules_are_read() {
        let temp_dir = project("urlpatterns = []\n", Some(VIEWS));
        fs::write(
            temp_dir.path().join("blog/routes.py"),
            "urlpatterns = [path('hidden/', views.list_users)]\n",
        )
        .unwrap();

        let routes = DjangoExtractor.extract_routes(temp_dir.path()).endpoints;

        assert!(routes.is_empty());
    }
}
