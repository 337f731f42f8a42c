//! Model invocation: one external model call per classification.
//!
//! `ProcessBackend` runs the local model CLI (`ollama run <model>` by default),
//! writes the prompt to stdin and collects stdout. `OllamaHttpBackend` talks to
//! the same model through Ollama's `/api/generate` endpoint. Both bound the call
//! with a hard wall-clock timeout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

use crate::error::InvocationError;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send `prompt` to the model and return its full reply text.
    async fn generate(&self, prompt: &str) -> Result<String, InvocationError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Spawns a fresh model process per call. No reuse or pooling.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
    model: String,
    timeout: Duration,
}

impl ProcessBackend {
    /// The process is run as `<program> <args...> <model>`.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            model: model.into(),
            timeout,
        }
    }

    async fn run(&self, prompt: &str) -> Result<String, InvocationError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // the child is killed when the wait future is dropped on timeout
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn model process {}: {}", self.program, e);
            InvocationError::Spawn(e)
        })?;
        debug!(pid = ?child.id(), "Model process spawned");

        // Write stdin from its own task so a chatty child can't deadlock us on a
        // full stdout pipe. Dropping the handle closes stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = prompt.as_bytes().to_vec();
            tokio::spawn(async move { stdin.write_all(&input).await })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(InvocationError::Io)?;

        if !output.status.success() {
            let stderr = decode_dropping_invalid(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), %stderr, "Model process failed");
            return Err(InvocationError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        if let Some(writer) = writer {
            let written = writer
                .await
                .map_err(|e| InvocationError::Io(std::io::Error::other(e)))?;
            check_prompt_written(written)?;
        }

        Ok(decode_dropping_invalid(&output.stdout).trim().to_string())
    }
}

/// A child that exits without reading its whole prompt closes the pipe on us;
/// its reply still counts. Any other write failure means the model saw a
/// truncated prompt.
fn check_prompt_written(written: std::io::Result<()>) -> Result<(), InvocationError> {
    match written {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("Model process closed stdin early: {}", e);
            Ok(())
        }
        Err(e) => {
            error!("Failed to write prompt to model process: {}", e);
            Err(InvocationError::Io(e))
        }
    }
}

/// UTF-8 decode that skips invalid byte sequences instead of substituting
/// U+FFFD, so a stray byte inside a key doesn't split it.
fn decode_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                bytes = &rest[e.error_len().unwrap_or(rest.len())..];
            }
        }
    }
}

#[async_trait]
impl ModelBackend for ProcessBackend {
    #[instrument(skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, InvocationError> {
        debug!(program = %self.program, model = %self.model, "Invoking model process");
        match tokio::time::timeout(self.timeout, self.run(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Model process timed out and was killed");
                Err(InvocationError::TimedOut(self.timeout))
            }
        }
    }

    fn describe(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(self.model.clone());
        parts.join(" ")
    }
}

// Structures matching Ollama's /api/generate endpoint
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

/// Calls a running Ollama server instead of the CLI.
#[derive(Debug, Clone)]
pub struct OllamaHttpBackend {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaHttpBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaHttpBackend {
    #[instrument(skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, InvocationError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                InvocationError::TimedOut(self.timeout)
            } else {
                InvocationError::Http(e.to_string())
            }
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Ollama API request failed");
            return Err(InvocationError::Http(format!("status {}: {}", status, body)));
        }

        let parsed = response.json::<OllamaResponse>().await.map_err(map_err)?;
        info!(model = %self.model, "Received Ollama response");
        Ok(parsed.response.trim().to_string())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.base_url, self.model)
    }
}
