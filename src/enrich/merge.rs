//! Keyed merge of batch enrichment results.

use crate::endpoint::Endpoint;
use crate::enrich::apply_doc;
use crate::enrich::response::KeyedDoc;
use log::debug;
use std::collections::HashMap;

/// Merges `docs` into `endpoints` by (METHOD, path).
///
/// Only endpoints already in the list are updated; documents for unknown keys are
/// dropped. When a batch repeats a key, the first document wins. Endpoints sharing
/// a key (the same route in two frameworks) all receive the document. Returns the
/// number of endpoints updated.
pub fn merge_batch(endpoints: &mut [Endpoint], docs: Vec<KeyedDoc>) -> usize {
    let mut by_key = HashMap::with_capacity(docs.len());
    for keyed in docs {
        by_key
            .entry((keyed.method, keyed.path))
            .or_insert(keyed.doc);
    }

    let mut updated = 0;
    for endpoint in endpoints.iter_mut() {
        if let Some(doc) = by_key.get(&endpoint.key()) {
            apply_doc(endpoint, doc.clone());
            updated += 1;
        }
    }

    let unknown = by_key
        .keys()
        .filter(|key| !endpoints.iter().any(|e| &e.key() == *key))
        .count();
    if unknown > 0 {
        debug!("Dropped {} enrichment result(s) for unknown endpoints", unknown);
    }
    updated
}
