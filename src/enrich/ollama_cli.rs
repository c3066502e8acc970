//! Ollama subprocess enricher.
//!
//! Runs `ollama run <model>` once for the whole endpoint list, with a JSON prompt
//! on stdin, and merges the JSON array found on stdout back by (METHOD, path).

use crate::endpoint::Endpoint;
use crate::enrich::merge::merge_batch;
use crate::enrich::prompt::batch_prompt;
use crate::enrich::response::parse_batch;
use crate::enrich::{apply_failure, EnrichReport, Enriched, Enricher, EnrichmentRequest};
use crate::error::EnrichError;
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Batch enrichment through a local `ollama run` process.
pub struct OllamaCliEnricher {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl OllamaCliEnricher {
    pub fn new(model: &str) -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec!["run".to_string(), model.to_string()],
            timeout: None,
        }
    }

    /// Kills the model process if it has not answered within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the command line that is run.
    pub fn with_command(mut self, program: &str, args: &[&str]) -> Self {
        self.program = program.to_string();
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, EnrichError> {
        let wait_failed = |e: std::io::Error| {
            EnrichError::Backend(format!("failed to wait for model: {}", e))
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_failed);
        };

        if let Some(status) = child.wait_timeout(timeout).map_err(wait_failed)? {
            return Ok(status);
        }

        // Out of time: kill and reap so the pipes close
        if let Err(e) = child.kill() {
            warn!("Failed to kill model process: {}", e);
        }
        if let Err(e) = child.wait() {
            warn!("Failed to reap model process: {}", e);
        }
        Err(EnrichError::Timeout(format!(
            "model did not finish within {}s",
            timeout.as_secs_f32()
        )))
    }

    /// Runs the model with `prompt` on stdin and returns its stdout.
    fn run_model(&self, prompt: String) -> Result<String, EnrichError> {
        debug!("Running {} {}", self.program, self.args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EnrichError::Unreachable(format!(
                    "failed to start `{}`: {}. Is Ollama installed?",
                    self.program, e
                ))
            })?;

        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                    debug!("Model closed stdin early: {}", e);
                }
            })
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child);

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        let status = status?;

        if !status.success() {
            return Err(EnrichError::Backend(format!(
                "`{}` exited with {}: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Reads a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl Enricher for OllamaCliEnricher {
    fn name(&self) -> &str {
        "ollama-cli"
    }

    fn enrich(&self, mut endpoints: Vec<Endpoint>) -> Enriched {
        let mut report = EnrichReport::default();
        let requests: Vec<EnrichmentRequest> =
            endpoints.iter().map(EnrichmentRequest::from).collect();

        let outcome = batch_prompt(&requests)
            .map_err(|e| EnrichError::Backend(format!("failed to build prompt: {}", e)))
            .and_then(|prompt| self.run_model(prompt))
            .and_then(|output| parse_batch(&output));

        match outcome {
            Ok(docs) => {
                info!("Model returned {} documented endpoint(s)", docs.len());
                report.enriched = merge_batch(&mut endpoints, docs);
            }
            Err(error) if error.is_channel_failure() => {
                report.remaining = endpoints.len();
                report.aborted = Some(error);
            }
            Err(EnrichError::Timeout(reason)) => {
                debug!("Model timed out: {}", reason);
                report.remaining = endpoints.len();
                report.timed_out = true;
            }
            Err(error) => {
                for endpoint in endpoints.iter_mut() {
                    apply_failure(endpoint, &error);
                    report.failures.push((endpoint.key(), error.clone()));
                }
            }
        }

        Enriched { endpoints, report }
    }
}
