//! Ollama HTTP backend.
//!
//! Documents one endpoint per `POST /api/generate` call against a running Ollama
//! service, asking for JSON output.

use crate::enrich::prompt::endpoint_prompt;
use crate::enrich::response::parse_doc_text;
use crate::enrich::{DocBackend, EndpointDoc, EnrichmentRequest};
use crate::error::EnrichError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Description for an endpoint whose handler could not be located.
const NO_SOURCE_DESCRIPTION: &str = "_No source code found to generate a description._";

/// Per-endpoint documentation through the Ollama HTTP API.
pub struct OllamaHttpBackend {
    api_base: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl OllamaHttpBackend {
    /// Creates a backend for `model` served at `api_base`.
    ///
    /// `timeout` bounds each request; a request that runs over fails that endpoint
    /// only.
    pub fn new(api_base: &str, model: &str, timeout: Duration) -> Result<Self, EnrichError> {
        let api_base = Self::validate_endpoint(api_base)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::Backend(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            model: model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout,
            client,
        })
    }

    /// Only http/https URLs are accepted; a trailing slash is dropped.
    fn validate_endpoint(endpoint: &str) -> Result<String, EnrichError> {
        let endpoint = endpoint.trim();
        let Some(host) = endpoint
            .strip_prefix("http://")
            .or_else(|| endpoint.strip_prefix("https://"))
        else {
            return Err(EnrichError::Backend(format!(
                "Ollama endpoint must use http or https: {}",
                endpoint
            )));
        };

        let host = host.split('/').next().unwrap_or_default();
        let is_local = ["localhost", "127.0.0.1", "[::1]"]
            .iter()
            .any(|local| host == *local || host.starts_with(&format!("{}:", local)));
        if !is_local {
            warn!(
                "Ollama endpoint is not localhost: {}. Endpoint source code will be sent there.",
                host
            );
        }

        Ok(endpoint.trim_end_matches('/').to_string())
    }

    fn build_request(&self, request: &EnrichmentRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: endpoint_prompt(request),
            stream: false,
            format: "json".to_string(),
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> EnrichError {
        if e.is_connect() {
            EnrichError::Unreachable(format!(
                "failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                self.api_base
            ))
        } else if e.is_timeout() {
            EnrichError::Timeout(format!("no answer within {}s", self.timeout.as_secs()))
        } else {
            EnrichError::Backend(format!("Ollama request failed: {}", e))
        }
    }
}

impl DocBackend for OllamaHttpBackend {
    fn name(&self) -> &str {
        "ollama-http"
    }

    fn describe(&self, request: &EnrichmentRequest) -> Result<EndpointDoc, EnrichError> {
        if request.source.as_deref().map_or(true, |s| s.trim().is_empty()) {
            debug!("No source for {} {}, skipping model", request.method, request.path);
            return Ok(EndpointDoc {
                description: Some(NO_SOURCE_DESCRIPTION.to_string()),
                ..EndpointDoc::default()
            });
        }

        let url = format!("{}/api/generate", self.api_base);
        debug!("Requesting docs for {} {} from {}", request.method, request.path, url);

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(request))
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EnrichError::Backend(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let body: OllamaResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                EnrichError::Timeout(format!("no answer within {}s", self.timeout.as_secs()))
            } else {
                EnrichError::InvalidResponse(format!("failed to parse Ollama response: {}", e))
            }
        })?;

        parse_doc_text(&body.response)
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}
