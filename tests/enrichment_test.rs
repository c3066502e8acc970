use apimatic::cli::{Framework, OutputFormat};
use apimatic::endpoint::{QueryParam, ResponseDoc};
use apimatic::enrich::{
    DocBackend, EndpointDoc, Enricher, EnrichmentRequest, PerEndpointEnricher,
};
use apimatic::error::EnrichError;
use apimatic::pipeline::{collect_endpoints, render};
use std::fs;
use tempfile::TempDir;

/// Documents every endpoint except `/stats`, which fails.
struct CannedBackend;

impl DocBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    fn describe(&self, request: &EnrichmentRequest) -> Result<EndpointDoc, EnrichError> {
        if request.path.starts_with("/stats") {
            return Err(EnrichError::Backend("HTTP 500".to_string()));
        }
        Ok(EndpointDoc {
            summary: Some(format!("Handle {} {}", request.method, request.path)),
            description: Some(format!("Defined in {}.", request.file)),
            query_params: vec![QueryParam {
                name: "limit".to_string(),
                description: "Maximum number of results".to_string(),
                param_type: Some("integer".to_string()),
            }],
            request_body: None,
            responses: vec![ResponseDoc {
                status_code: "200".to_string(),
                description: "OK".to_string(),
            }],
        })
    }
}

fn flask_project() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("app.py"),
        include_str!("fixtures/flask_app.py"),
    )
    .expect("Failed to write app");
    temp_dir
}

#[test]
fn test_enriched_endpoints_flow_into_markdown() {
    let project = flask_project();

    // Step 1: Collect
    let collection = collect_endpoints(project.path(), Some(&[Framework::Flask][..]));
    assert_eq!(collection.endpoints.len(), 5);

    // Step 2: Enrich, two requests at a time
    let enricher = PerEndpointEnricher::new(CannedBackend).with_concurrency(2);
    let enriched = enricher.enrich(collection.endpoints);
    assert_eq!(enriched.report.enriched, 4);
    assert_eq!(enriched.report.failures.len(), 1);
    assert!(enriched.report.aborted.is_none());

    // Step 3: Render
    let markdown = render(&enriched.endpoints, OutputFormat::Markdown, "app").unwrap();
    assert!(markdown.contains("### Handle GET /ping\n"));
    assert!(markdown.contains("Defined in app.py.\n"));
    assert!(markdown.contains("| limit | integer | Maximum number of results |\n"));
    assert!(markdown.contains("- `200`: OK\n"));

    // The failed endpoint keeps its identity and default summary
    assert!(markdown.contains("### GET /stats\n"));
    assert!(markdown.contains("_Documentation could not be generated:"));
}

#[test]
fn test_enrichment_keeps_endpoint_identity() {
    let project = flask_project();
    let collection = collect_endpoints(project.path(), Some(&[Framework::Flask][..]));
    let before: Vec<_> = collection
        .endpoints
        .iter()
        .map(|e| (e.framework, e.method.clone(), e.path.clone(), e.file.clone(), e.source.clone()))
        .collect();

    let enriched = PerEndpointEnricher::new(CannedBackend).enrich(collection.endpoints);

    let after: Vec<_> = enriched
        .endpoints
        .iter()
        .map(|e| (e.framework, e.method.clone(), e.path.clone(), e.file.clone(), e.source.clone()))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_enriched_openapi_operations() {
    let project = flask_project();
    let collection = collect_endpoints(project.path(), Some(&[Framework::Flask][..]));
    let enriched = PerEndpointEnricher::new(CannedBackend).enrich(collection.endpoints);

    let json = render(&enriched.endpoints, OutputFormat::OpenapiJson, "app").unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

    let ping = &doc["paths"]["/ping"]["get"];
    assert_eq!(ping["summary"], "Handle GET /ping");
    assert_eq!(ping["description"], "Defined in app.py.");
    assert_eq!(ping["parameters"][0]["name"], "limit");
    assert_eq!(ping["parameters"][0]["in"], "query");
    assert_eq!(ping["parameters"][0]["required"], false);
    assert_eq!(ping["parameters"][0]["schema"]["type"], "integer");
    assert_eq!(ping["responses"]["200"]["description"], "OK");
}
