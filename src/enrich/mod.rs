//! Optional enrichment of endpoints with generated documentation.
//!
//! An [`Enricher`] receives the full endpoint list and hands back the same list with
//! documentation fields filled in. Enrichment never adds or removes endpoints and
//! never touches provenance (`framework`, `method`, `path`, `file`, `source`).
//!
//! Two backend shapes are supported:
//!
//! - per-endpoint backends implementing [`DocBackend`], driven by
//!   [`PerEndpointEnricher`] (see [`ollama_http::OllamaHttpBackend`])
//! - batch enrichers that answer for the whole list at once
//!   (see [`ollama_cli::OllamaCliEnricher`])
//!
//! A failure for one endpoint gives that endpoint a placeholder description and the
//! run continues. Only an unreachable backend stops the stage early; whatever was
//! enriched up to that point is kept.

pub mod merge;
pub mod ollama_cli;
pub mod ollama_http;
pub mod prompt;
pub mod response;

use crate::cli::Framework;
use crate::endpoint::{Endpoint, QueryParam, RequestBody, ResponseDoc};
use crate::error::EnrichError;
use log::{debug, info, warn};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// An enrichment stage.
pub trait Enricher {
    /// Short name used in log output
    fn name(&self) -> &str;

    /// Enriches `endpoints`, returning every one of them in the same order.
    fn enrich(&self, endpoints: Vec<Endpoint>) -> Enriched;
}

/// Output of an enrichment stage.
#[derive(Debug)]
pub struct Enriched {
    pub endpoints: Vec<Endpoint>,
    pub report: EnrichReport,
}

/// What happened during an enrichment stage.
#[derive(Debug, Default)]
pub struct EnrichReport {
    /// Endpoints that received documentation
    pub enriched: usize,
    /// Endpoints that got a placeholder instead, keyed by (METHOD, path)
    pub failures: Vec<((String, String), EnrichError)>,
    /// Set when the backend became unreachable and the stage stopped early
    pub aborted: Option<EnrichError>,
    /// Set when the stage ran out of time
    pub timed_out: bool,
    /// Endpoints left as they were because the stage stopped early
    pub remaining: usize,
}

impl EnrichReport {
    /// Logs a one-line outcome plus a warning per failure.
    pub fn log_summary(&self) {
        for ((method, path), error) in &self.failures {
            warn!("Enrichment failed for {} {}: {}", method, path, error);
        }
        if let Some(ref error) = self.aborted {
            warn!(
                "Enrichment stopped early, {} endpoint(s) left undocumented: {}",
                self.remaining, error
            );
        }
        if self.timed_out {
            warn!(
                "Enrichment time budget exhausted, {} endpoint(s) left undocumented",
                self.remaining
            );
        }
        info!(
            "Enrichment: {} documented, {} failed",
            self.enriched,
            self.failures.len()
        );
    }
}

/// Enricher that returns the endpoints untouched.
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn name(&self) -> &str {
        "none"
    }

    fn enrich(&self, endpoints: Vec<Endpoint>) -> Enriched {
        Enriched {
            endpoints,
            report: EnrichReport::default(),
        }
    }
}

/// What a backend gets to see of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentRequest {
    pub method: String,
    pub path: String,
    pub framework: Framework,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&Endpoint> for EnrichmentRequest {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            framework: endpoint.framework,
            file: endpoint.file.clone(),
            source: endpoint.source.clone(),
        }
    }
}

/// Documentation produced for one endpoint, in canonical form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub query_params: Vec<QueryParam>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<ResponseDoc>,
}

/// Copies the non-empty fields of `doc` onto `endpoint`.
///
/// Empty values never overwrite existing documentation, so applying the same
/// document twice leaves the endpoint unchanged.
pub fn apply_doc(endpoint: &mut Endpoint, doc: EndpointDoc) {
    if let Some(summary) = doc.summary.filter(|s| !s.trim().is_empty()) {
        endpoint.summary = summary.trim().to_string();
    }
    if let Some(description) = doc.description.filter(|s| !s.trim().is_empty()) {
        endpoint.description = Some(description.trim().to_string());
    }
    if !doc.query_params.is_empty() {
        endpoint.query_params = doc.query_params;
    }
    if let Some(body) = doc.request_body {
        endpoint.request_body = Some(body);
    }
    if !doc.responses.is_empty() {
        endpoint.responses = doc.responses;
    }
}

const FAILURE_PREFIX: &str = "_Documentation could not be generated: ";

/// Description given to an endpoint whose enrichment failed.
pub fn failure_placeholder(reason: &str) -> String {
    format!("{}{}_", FAILURE_PREFIX, reason)
}

/// Marks `endpoint` as failed: placeholder description, empty structured fields.
///
/// An endpoint documented by an earlier pass keeps that documentation; only a
/// missing description or a previous failure placeholder is replaced.
pub fn apply_failure(endpoint: &mut Endpoint, error: &EnrichError) {
    let undocumented = endpoint
        .description
        .as_deref()
        .map_or(true, |d| d.trim().is_empty() || d.starts_with(FAILURE_PREFIX));
    if !undocumented {
        debug!(
            "Keeping earlier documentation for {} {} after: {}",
            endpoint.method, endpoint.path, error
        );
        return;
    }
    endpoint.description = Some(failure_placeholder(&error.to_string()));
    endpoint.query_params.clear();
    endpoint.request_body = None;
    endpoint.responses.clear();
}

/// A backend that documents one endpoint per call.
///
/// Each request runs on its own worker thread, so backends are shared through an
/// `Arc` and must be `Send + Sync + 'static`.
pub trait DocBackend: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn describe(&self, request: &EnrichmentRequest) -> Result<EndpointDoc, EnrichError>;
}

/// Drives a [`DocBackend`] over every endpoint.
///
/// Requests go out in chunks of `concurrency`, one worker thread each. A failing
/// request never cancels its siblings. An [`EnrichError::Unreachable`] stops the
/// stage after the current chunk. The deadline bounds the whole stage: answers that
/// arrive after it are dropped and their endpoints are left as they were.
pub struct PerEndpointEnricher<B> {
    backend: Arc<B>,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl<B: DocBackend> PerEndpointEnricher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            concurrency: 1,
            deadline: None,
        }
    }

    /// Number of requests in flight at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Time budget for the whole stage
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Starts one worker per request; each sends `(index, result)` on `tx`.
    fn dispatch(
        &self,
        requests: Vec<(usize, EnrichmentRequest)>,
        tx: &mpsc::Sender<(usize, Result<EndpointDoc, EnrichError>)>,
    ) {
        for (index, request) in requests {
            let backend = Arc::clone(&self.backend);
            let tx = tx.clone();
            thread::spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| backend.describe(&request)))
                    .unwrap_or_else(|_| {
                        Err(EnrichError::Backend("enrichment worker panicked".to_string()))
                    });
                // The stage may have given up on us already
                let _ = tx.send((index, result));
            });
        }
    }
}

impl<B: DocBackend> Enricher for PerEndpointEnricher<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn enrich(&self, mut endpoints: Vec<Endpoint>) -> Enriched {
        let expires_at = self.deadline.map(|deadline| Instant::now() + deadline);
        let mut report = EnrichReport::default();
        let total = endpoints.len();
        let mut processed = 0;

        'chunks: for start in (0..total).step_by(self.concurrency) {
            if expires_at.is_some_and(|at| Instant::now() >= at) {
                report.timed_out = true;
                break;
            }

            let end = (start + self.concurrency).min(total);
            let requests = (start..end)
                .map(|index| (index, EnrichmentRequest::from(&endpoints[index])))
                .collect();
            let (tx, rx) = mpsc::channel();
            self.dispatch(requests, &tx);
            drop(tx);

            for _ in start..end {
                let received = match expires_at {
                    Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                let (index, result) = match received {
                    Ok(answer) => answer,
                    Err(RecvTimeoutError::Timeout) => {
                        debug!("Enrichment deadline passed with requests in flight");
                        report.timed_out = true;
                        break 'chunks;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                let endpoint = &mut endpoints[index];
                match result {
                    Ok(doc) => {
                        debug!("Documented {} {}", endpoint.method, endpoint.path);
                        apply_doc(endpoint, doc);
                        report.enriched += 1;
                    }
                    Err(error) if error.is_channel_failure() => {
                        if report.aborted.is_none() {
                            report.aborted = Some(error);
                        }
                    }
                    Err(error) => {
                        apply_failure(endpoint, &error);
                        report.failures.push((endpoint.key(), error));
                    }
                }
            }
            processed = end;

            if report.aborted.is_some() {
                break;
            }
        }

        report.remaining = total - report.enriched - report.failures.len();
        if processed < total {
            debug!("Enrichment stopped after {} of {} endpoints", processed, total);
        }

        Enriched { endpoints, report }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend answering from a closure, counting calls.
    pub struct FakeBackend<F> {
        pub respond: F,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl<F> FakeBackend<F>
    where
        F: Fn(&EnrichmentRequest) -> Result<EndpointDoc, EnrichError> + Send + Sync + 'static,
    {
        pub fn new(respond: F) -> Self {
            Self {
                respond,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl<F> DocBackend for FakeBackend<F>
    where
        F: Fn(&EnrichmentRequest) -> Result<EndpointDoc, EnrichError> + Send + Sync + 'static,
    {
        fn name(&self) -> &str {
            "fake"
        }

        fn describe(&self, request: &EnrichmentRequest) -> Result<EndpointDoc, EnrichError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push(format!("{} {}", request.method, request.path));
            (self.respond)(request)
        }
    }

    /// Deterministic documentation derived from the request
    pub fn doc_for(request: &EnrichmentRequest) -> EndpointDoc {
        EndpointDoc {
            summary: Some(format!("Handle {}", request.path)),
            description: Some(format!("Serves {} requests on {}.", request.method, request.path)),
            query_params: vec![QueryParam {
                name: "page".to_string(),
                description: "Page number".to_string(),
                param_type: Some("integer".to_string()),
            }],
            request_body: None,
            responses: vec![ResponseDoc {
                status_code: "200".to_string(),
                description: "OK".to_string(),
            }],
        }
    }
}
