//! Parsing of model output into [`EndpointDoc`]s.
//!
//! Models rarely answer in exactly the requested shape. Everything lenient lives
//! here: JSON wrapped in prose or code fences, `logic_explanation` instead of
//! `description`, query parameters given as bare names, `"None."` request bodies,
//! responses as arrays or as maps keyed by status code. Nothing past this module
//! sees anything but the canonical [`EndpointDoc`].

use crate::endpoint::{QueryParam, RequestBody, ResponseDoc};
use crate::enrich::EndpointDoc;
use crate::error::EnrichError;
use crate::extractor::normalize_route_path;
use log::debug;
use serde_json::{Map, Value};

/// Documentation for the endpoint identified by (`method`, `path`).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedDoc {
    pub method: String,
    pub path: String,
    pub doc: EndpointDoc,
}

/// Index of the bracket closing the JSON container opening at `open`.
fn container_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds the first JSON object or array embedded in `text`.
///
/// Candidates are tried left to right, so a stray `[` in leading prose does not
/// hide the real payload behind it.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if value.is_object() || value.is_array() {
            return Some(value);
        }
    }

    text.char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .find_map(|(open, _)| {
            let close = container_end(text, open)?;
            serde_json::from_str::<Value>(&text[open..=close]).ok()
        })
}

/// Whether a model used prose to say "there is nothing here".
fn is_none_text(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches('.').to_ascii_lowercase();
    matches!(normalized.as_str(), "" | "none" | "null" | "n/a" | "no request body")
}

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn parse_query_params(value: Option<&Value>) -> Vec<QueryParam> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) if !is_none_text(name) => Some(QueryParam {
                    name: name.trim().to_string(),
                    description: String::new(),
                    param_type: None,
                }),
                Value::Object(object) => Some(QueryParam {
                    name: string_field(object, &["name", "param", "parameter"])?,
                    description: string_field(object, &["description", "desc"]).unwrap_or_default(),
                    param_type: string_field(object, &["type", "param_type"]),
                }),
                _ => None,
            })
            .collect(),
        Some(Value::Object(object)) => object
            .iter()
            .map(|(name, detail)| QueryParam {
                name: name.clone(),
                description: match detail {
                    Value::String(s) => s.trim().to_string(),
                    Value::Object(inner) => {
                        string_field(inner, &["description", "desc"]).unwrap_or_default()
                    }
                    _ => String::new(),
                },
                param_type: detail
                    .as_object()
                    .and_then(|inner| string_field(inner, &["type"])),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_request_body(value: Option<&Value>) -> Option<RequestBody> {
    let body = match value? {
        Value::String(text) if is_none_text(text) => return None,
        Value::String(text) => RequestBody {
            description: text.trim().to_string(),
            schema: Value::Null,
        },
        Value::Object(object) => RequestBody {
            description: string_field(object, &["description"]).unwrap_or_default(),
            schema: object.get("schema").cloned().unwrap_or(Value::Null),
        },
        _ => return None,
    };

    if is_none_text(&body.description) && !body.has_schema() {
        return None;
    }
    Some(body)
}

fn response_from_detail(status_code: String, detail: &Value) -> ResponseDoc {
    let description = match detail {
        Value::String(s) => s.trim().to_string(),
        Value::Object(object) => string_field(object, &["description", "desc"]).unwrap_or_default(),
        _ => String::new(),
    };
    ResponseDoc {
        status_code,
        description,
    }
}

fn parse_responses(value: Option<&Value>) -> Vec<ResponseDoc> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let object = item.as_object()?;
                let status_code = string_field(object, &["status_code", "status", "code"])?;
                Some(response_from_detail(status_code, item))
            })
            .collect(),
        Some(Value::Object(object)) => object
            .iter()
            .map(|(code, detail)| response_from_detail(code.clone(), detail))
            .collect(),
        _ => Vec::new(),
    }
}

/// Converts one model answer for a single endpoint into canonical form.
pub fn parse_doc(value: &Value) -> Result<EndpointDoc, EnrichError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Array(items) => match items.first() {
            Some(Value::Object(object)) => object,
            _ => {
                return Err(EnrichError::InvalidResponse(
                    "expected a JSON object".to_string(),
                ))
            }
        },
        _ => {
            return Err(EnrichError::InvalidResponse(
                "expected a JSON object".to_string(),
            ))
        }
    };

    Ok(EndpointDoc {
        summary: string_field(object, &["summary", "title"]),
        description: string_field(object, &["description", "logic_explanation"]),
        query_params: parse_query_params(object.get("query_params")),
        request_body: parse_request_body(object.get("request_body")),
        responses: parse_responses(object.get("responses")),
    })
}

/// Parses a free-text model answer for a single endpoint.
pub fn parse_doc_text(text: &str) -> Result<EndpointDoc, EnrichError> {
    let value = extract_json(text)
        .ok_or_else(|| EnrichError::InvalidResponse("no JSON found in model output".to_string()))?;
    parse_doc(&value)
}

/// Parses a batch answer: a JSON array of documents that each name their endpoint.
///
/// Entries without a method or path cannot be matched and are dropped.
pub fn parse_batch(text: &str) -> Result<Vec<KeyedDoc>, EnrichError> {
    let value = extract_json(text)
        .ok_or_else(|| EnrichError::InvalidResponse("no JSON found in model output".to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("endpoints") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(object)],
        },
        _ => {
            return Err(EnrichError::InvalidResponse(
                "expected a JSON array of endpoints".to_string(),
            ))
        }
    };

    let mut docs = Vec::with_capacity(items.len());
    for item in &items {
        let Some(object) = item.as_object() else {
            continue;
        };
        let (Some(method), Some(path)) = (
            string_field(object, &["method"]),
            string_field(object, &["path"]),
        ) else {
            debug!("Dropping enrichment entry without method/path");
            continue;
        };
        docs.push(KeyedDoc {
            method: method.to_uppercase(),
            path: normalize_route_path(&path),
            doc: parse_doc(item)?,
        });
    }

    Ok(docs)
}
