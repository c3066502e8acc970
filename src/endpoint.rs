//! Endpoint records shared by every stage of the pipeline.
//!
//! Extractors produce [`RawEndpoint`]s, the [`normalizer`](crate::normalizer)
//! turns them into [`Endpoint`]s, enrichment fills in the documentation fields
//! and the generators read them.

use crate::cli::Framework;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Method used when the framework syntax carries no HTTP verb.
pub const ANY_METHOD: &str = "ANY";

/// A route registration as recognized by an extractor, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpoint {
    /// The framework whose extractor recognized the route
    pub framework: Framework,
    /// HTTP verb as written in the source (any case), or `ANY`
    pub method: String,
    /// Route path as written in the source
    pub path: String,
    /// Source file, relative to the scan root
    pub file: String,
    /// Handler source text, when it could be recovered
    pub source: Option<String>,
    /// Optional short title
    pub summary: Option<String>,
}

impl RawEndpoint {
    /// Create a new RawEndpoint with no source and no summary
    pub fn new(framework: Framework, method: &str, path: &str, file: &str) -> Self {
        Self {
            framework,
            method: method.to_string(),
            path: path.to_string(),
            file: file.to_string(),
            source: None,
            summary: None,
        }
    }

    /// Attach recovered handler source
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }
}

/// A documented HTTP endpoint.
///
/// Provenance fields (`framework`, `method`, `path`, `file`, `source`) are set
/// once by extraction and normalization. Enrichment only touches `summary`,
/// `description`, `query_params`, `request_body` and `responses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub framework: Framework,
    /// Uppercase HTTP verb or `ANY`
    pub method: String,
    /// Route path, always starting with exactly one `/`
    pub path: String,
    /// Source file relative to the scan root, `/`-separated
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Short title, `"{method} {path}"` unless something better is known
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub query_params: Vec<QueryParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: Vec<ResponseDoc>,
}

/// A documented query-string parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
}

/// A documented JSON request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub description: String,
    /// JSON schema of the body; `Value::Null` when only prose is known
    #[serde(default)]
    pub schema: serde_json::Value,
}

impl RequestBody {
    /// Whether a schema worth rendering is present
    pub fn has_schema(&self) -> bool {
        match &self.schema {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            serde_json::Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

/// A documented response for one status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDoc {
    pub status_code: String,
    pub description: String,
}

impl Endpoint {
    /// The (METHOD, path) key used to match enrichment results.
    pub fn key(&self) -> (String, String) {
        (self.method.to_uppercase(), self.path.clone())
    }

    /// The default summary for a method and path
    pub fn default_summary(method: &str, path: &str) -> String {
        format!("{} {}", method, path)
    }
}

/// Orders endpoints by framework, then path, then method.
///
/// Used with a stable sort, so equal keys keep their original list order.
pub fn document_order(a: &Endpoint, b: &Endpoint) -> Ordering {
    a.framework
        .as_str()
        .cmp(b.framework.as_str())
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.method.cmp(&b.method))
}

/// Returns references to `endpoints` in document order.
pub fn sorted_for_document(endpoints: &[Endpoint]) -> Vec<&Endpoint> {
    let mut sorted: Vec<&Endpoint> = endpoints.iter().collect();
    sorted.sort_by(|a, b| document_order(a, b));
    sorted
}
