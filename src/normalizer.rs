//! Endpoint normalization.
//!
//! Turns the [`RawEndpoint`]s produced by the extractors into [`Endpoint`]s with a
//! consistent shape, so the generators never have to care which extractor produced
//! a record.

use crate::endpoint::{Endpoint, RawEndpoint, ANY_METHOD};
use crate::extractor::normalize_route_path;

/// Normalizes a single raw endpoint.
///
/// - the method is uppercased, and an empty method becomes `ANY`
/// - the path gets exactly one leading `/`, with regex anchors stripped
/// - the file path uses `/` separators
/// - a missing or blank summary becomes `"{method} {path}"`
/// - documentation collections start out empty
pub fn normalize(raw: RawEndpoint) -> Endpoint {
    let method = match raw.method.trim() {
        "" => ANY_METHOD.to_string(),
        method => method.to_uppercase(),
    };
    let path = normalize_route_path(&raw.path);
    let file = raw.file.replace('\\', "/");

    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Endpoint::default_summary(&method, &path));

    let source = raw.source.filter(|s| !s.trim().is_empty());

    Endpoint {
        framework: raw.framework,
        method,
        path,
        file,
        source,
        summary,
        description: None,
        query_params: Vec::new(),
        request_body: None,
        responses: Vec::new(),
    }
}

/// Normalizes every raw endpoint, keeping their order.
pub fn normalize_all(raw: Vec<RawEndpoint>) -> Vec<Endpoint> {
    raw.into_iter().map(normalize).collect()
}
