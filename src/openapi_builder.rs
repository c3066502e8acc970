use crate::endpoint::{document_order, Endpoint, ANY_METHOD};
use log::{debug, warn};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `<id>` and `<int:id>` (Flask, Django)
static ANGLE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:(\w+):)?(\w+)>").expect("valid angle parameter regex")
});

/// `{id}` and `{id:int}` (FastAPI / Starlette); `{4}` is a regex quantifier, not a name
static BRACE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_]\w*)(?::(\w+))?\}").expect("valid brace parameter regex")
});

/// `(?P<year>[0-9]{4})` (Django `re_path`), one level of nested groups allowed
static NAMED_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\?P<(\w+)>((?:[^()]|\([^()]*\))*)\)").expect("valid named group regex")
});

/// Group patterns that only match digits, e.g. `[0-9]{4}` or `\d+`
static DIGITS_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[0-9\]|\\d)(?:[+*]|\{\d+(?:,\d*)?\})?$").expect("valid digit pattern regex")
});

/// OpenAPI document builder
///
/// Endpoints are collected first and laid out in [`build`](OpenApiBuilder::build),
/// sorted the same way as the Markdown report. When two endpoints share a path and
/// method (the same route in two frameworks), the later one in that order wins.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    endpoints: Vec<Endpoint>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Routes that accept any method (Django views, Express `all`)
    #[serde(rename = "x-any", skip_serializing_if = "Option::is_none")]
    pub any: Option<Operation>,
}

impl PathItem {
    /// The operation slot for an uppercase method, if OpenAPI has one
    fn slot(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        let slot = match method {
            "GET" => &mut self.get,
            "POST" => &mut self.post,
            "PUT" => &mut self.put,
            "DELETE" => &mut self.delete,
            "PATCH" => &mut self.patch,
            "OPTIONS" => &mut self.options,
            "HEAD" => &mut self.head,
            "TRACE" => &mut self.trace,
            ANY_METHOD => &mut self.any,
            _ => return None,
        };
        Some(slot)
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters (path, query)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    pub info: Info,
    /// Paths in template form, sorted
    pub paths: BTreeMap<String, PathItem>,
}

/// A path parameter found while converting a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    pub name: String,
    /// OpenAPI primitive type
    pub param_type: &'static str,
}

fn converter_type(converter: Option<&str>) -> &'static str {
    match converter {
        Some("int") => "integer",
        Some("float") => "number",
        _ => "string",
    }
}

/// Converts a framework route path to OpenAPI template form.
///
/// `:id` (Express), `<id>` and `<int:id>` (Flask, Django), `(?P<id>...)` (Django
/// `re_path`) and `{id:int}` all become `{id}`. Returns the converted path and its
/// parameters in order.
pub fn convert_path_format(path: &str) -> (String, Vec<PathParam>) {
    let mut params = Vec::new();

    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                let name = name.trim_end_matches('?');
                params.push(PathParam {
                    name: name.to_string(),
                    param_type: "string",
                });
                return format!("{{{}}}", name);
            }

            // Braces first: the angle rewrite produces braces of its own
            let segment = BRACE_PARAM.replace_all(segment, |caps: &Captures| {
                params.push(PathParam {
                    name: caps[1].to_string(),
                    param_type: converter_type(caps.get(2).map(|m| m.as_str())),
                });
                format!("{{{}}}", &caps[1])
            });
            // Named groups before angles: `(?P<year>` contains `<year>`
            let segment = NAMED_GROUP.replace_all(&segment, |caps: &Captures| {
                let param_type = if DIGITS_ONLY.is_match(&caps[2]) {
                    "integer"
                } else {
                    "string"
                };
                params.push(PathParam {
                    name: caps[1].to_string(),
                    param_type,
                });
                format!("{{{}}}", &caps[1])
            });
            ANGLE_PARAM
                .replace_all(&segment, |caps: &Captures| {
                    params.push(PathParam {
                        name: caps[2].to_string(),
                        param_type: converter_type(caps.get(1).map(|m| m.as_str())),
                    });
                    format!("{{{}}}", &caps[2])
                })
                .into_owned()
        })
        .collect();

    (segments.join("/"), params)
}

/// `<method>_<path slug>`, e.g. `get_users_id` for `GET /users/{id}`
fn operation_id(method: &str, openapi_path: &str) -> String {
    let mut slug = String::new();
    for c in openapi_path.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    let slug = if slug.is_empty() { "root" } else { slug };

    format!("{}_{}", method.to_lowercase(), slug)
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder for an API named `title`
    pub fn new(title: &str) -> Self {
        debug!("Initializing OpenApiBuilder for {}", title);
        Self {
            info: Info {
                title: title.to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            endpoints: Vec::new(),
        }
    }

    /// Add an endpoint to the OpenAPI document
    pub fn add_endpoint(&mut self, endpoint: &Endpoint) {
        debug!("Adding endpoint: {} {}", endpoint.method, endpoint.path);
        self.endpoints.push(endpoint.clone());
    }

    fn build_operation(endpoint: &Endpoint, openapi_path: &str, path_params: &[PathParam]) -> Operation {
        let mut parameters: Vec<Parameter> = path_params
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                location: "path".to_string(),
                required: true,
                schema: json!({ "type": p.param_type }),
                description: None,
            })
            .collect();

        parameters.extend(endpoint.query_params.iter().map(|q| Parameter {
            name: q.name.clone(),
            location: "query".to_string(),
            required: false,
            schema: json!({ "type": q.param_type.as_deref().unwrap_or("string") }),
            description: Some(q.description.clone()).filter(|d| !d.is_empty()),
        }));

        let request_body = endpoint.request_body.as_ref().map(|body| {
            let schema = if body.has_schema() {
                body.schema.clone()
            } else {
                json!({ "type": "object" })
            };
            RequestBody {
                description: Some(body.description.clone()).filter(|d| !d.is_empty()),
                required: true,
                content: BTreeMap::from([("application/json".to_string(), MediaType { schema })]),
            }
        });

        let mut responses: BTreeMap<String, Response> = endpoint
            .responses
            .iter()
            .map(|r| {
                let description = if r.description.trim().is_empty() {
                    "Response".to_string()
                } else {
                    r.description.clone()
                };
                (r.status_code.clone(), Response { description })
            })
            .collect();
        if responses.is_empty() {
            // Default response when nothing is documented
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                },
            );
        }

        Operation {
            summary: Some(endpoint.summary.clone()),
            description: endpoint.description.clone().filter(|d| !d.trim().is_empty()),
            operation_id: Some(operation_id(&endpoint.method, openapi_path)),
            tags: vec![endpoint.framework.as_str().to_string()],
            parameters: (!parameters.is_empty()).then_some(parameters),
            request_body,
            responses,
        }
    }

    /// Build the final OpenAPI document
    pub fn build(mut self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        self.endpoints.sort_by(document_order);

        let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
        for endpoint in &self.endpoints {
            let (openapi_path, path_params) = convert_path_format(&endpoint.path);
            let operation = Self::build_operation(endpoint, &openapi_path, &path_params);

            let method = endpoint.method.to_uppercase();
            let path_item = paths.entry(openapi_path.clone()).or_default();
            match path_item.slot(&method) {
                Some(slot) => {
                    if slot.is_some() {
                        debug!(
                            "{} {} defined more than once; keeping the {} one",
                            method, openapi_path, endpoint.framework
                        );
                    }
                    *slot = Some(operation);
                }
                None => warn!("Skipping {} {}: not an OpenAPI method", method, openapi_path),
            }
        }
        paths.retain(|_, item| *item != PathItem::default());

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths,
        }
    }
}
