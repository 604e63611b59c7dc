//! llama.cpp `llama-server` sidecar runtime.
//!
//! Loading spawns `llama-server` for the model file on the loopback
//! interface and polls `GET /health` until the weights are resident.
//! Inference streams `POST /completion` as Server-Sent Events, one
//! `data: {"content": .., "stop": ..}` line per fragment.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::instrument;

use kotodrill_core::traits::{CancelSignal, InferRequest, LoadedModel, ModelLoader, TextStream};
use kotodrill_core::RuntimeError;

use crate::config::RuntimeConfig;
use crate::error::ServerError;

const HOST: &str = "127.0.0.1";
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(250);
const HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const STDERR_TAIL_LINES: usize = 20;

/// OS error for a binary built for another architecture.
#[cfg(windows)]
const EXEC_FORMAT_ERROR: i32 = 193;
#[cfg(not(windows))]
const EXEC_FORMAT_ERROR: i32 = 8;

type StderrTail = Arc<Mutex<VecDeque<String>>>;

/// Loads models by starting (or attaching to) a `llama-server` process.
pub struct LlamaServerLoader {
    config: RuntimeConfig,
    client: reqwest::Client,
}

impl LlamaServerLoader {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Command-line arguments for serving `model_path`.
    fn server_args(&self, model_path: &Path) -> Vec<String> {
        vec![
            "--model".into(),
            model_path.display().to_string(),
            "--host".into(),
            HOST.into(),
            "--port".into(),
            self.config.port.to_string(),
            "--ctx-size".into(),
            self.config.context_size.to_string(),
            "--n-gpu-layers".into(),
            self.config.gpu_layers.to_string(),
            "--threads".into(),
            self.config.threads.to_string(),
        ]
    }

    fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.config.startup_timeout_secs)
    }

    async fn spawn(&self, model_path: &Path) -> Result<LlamaServerModel, RuntimeError> {
        // Anything already answering on the port would pass the health check
        // in place of the child.
        if port_in_use(self.config.port).await {
            return Err(RuntimeError::Platform(format!(
                "port {port} on {HOST} is already in use; stop the process listening there, \
                 pick another `runtime.port`, or set `runtime.server_url` to attach to it",
                port = self.config.port
            )));
        }

        let binary = resolve_binary(&self.config.server_binary)?;
        let args = self.server_args(model_path);
        tracing::debug!(binary = %binary.display(), ?args, "spawning llama-server");

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&binary, e))?;

        let tail = StderrTail::default();
        if let Some(stderr) = child.stderr.take() {
            let tail = Arc::clone(&tail);
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::trace!(target: "kotodrill::llama_server", "{line}");
                    if let Ok(mut tail) = tail.lock() {
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
            });
        }

        let base_url = format!("http://{HOST}:{}", self.config.port);
        let deadline = Instant::now() + self.startup_timeout();

        loop {
            ensure_running(&mut child, model_path, &tail)?;

            if check_health(&self.client, &base_url).await == Health::Ready {
                // The child must still be alive, or the answer came from someone else.
                ensure_running(&mut child, model_path, &tail)?;
                break;
            }

            if Instant::now() >= deadline {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill llama-server after startup timeout");
                }
                return Err(RuntimeError::model_load(
                    model_path,
                    format!(
                        "llama-server did not become ready within {}s",
                        self.config.startup_timeout_secs
                    ),
                ));
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }

        tracing::info!(pid = child.id(), %base_url, "llama-server ready");
        Ok(LlamaServerModel {
            base_url,
            client: self.client.clone(),
            child: Some(child),
        })
    }

    async fn attach(&self, url: &str, model_path: &Path) -> Result<LlamaServerModel, RuntimeError> {
        let base_url = url.trim_end_matches('/').to_string();
        let deadline = Instant::now() + self.startup_timeout();

        loop {
            let health = check_health(&self.client, &base_url).await;
            if health == Health::Ready {
                break;
            }
            if Instant::now() >= deadline {
                return Err(match health {
                    Health::Down => RuntimeError::Platform(format!(
                        "llama-server not reachable at {base_url}"
                    )),
                    _ => RuntimeError::model_load(
                        model_path,
                        format!(
                            "llama-server at {base_url} did not become ready within {}s",
                            self.config.startup_timeout_secs
                        ),
                    ),
                });
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }

        tracing::info!(%base_url, "attached to running llama-server");
        Ok(LlamaServerModel {
            base_url,
            client: self.client.clone(),
            child: None,
        })
    }
}

#[async_trait]
impl ModelLoader for LlamaServerLoader {
    fn name(&self) -> &str {
        "llama-server"
    }

    #[instrument(skip(self), fields(model = %model_path.display()))]
    async fn load(&self, model_path: &Path) -> Result<Box<dyn LoadedModel>, RuntimeError> {
        let model = match self.config.server_url.as_deref() {
            Some(url) => self.attach(url, model_path).await?,
            None => self.spawn(model_path).await?,
        };
        Ok(Box::new(model))
    }
}

/// A model served by a `llama-server` process.
pub struct LlamaServerModel {
    base_url: String,
    client: reqwest::Client,
    /// `None` when attached to a server this process did not start.
    child: Option<Child>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    prompt: String,
    n_predict: u32,
    temperature: f32,
    stop: Vec<String>,
    stream: bool,
    cache_prompt: bool,
}

#[async_trait]
impl LoadedModel for LlamaServerModel {
    #[instrument(skip(self, request), fields(base_url = %self.base_url, max_tokens = request.max_tokens))]
    fn infer(&self, request: &InferRequest) -> TextStream {
        let body = CompletionRequest {
            prompt: request.prompt.clone(),
            n_predict: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences.clone(),
            stream: true,
            cache_prompt: true,
        };
        completion_stream(
            self.client.clone(),
            format!("{}/completion", self.base_url),
            body,
            request.cancel.clone(),
        )
    }

    async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.kill().await {
                Ok(()) => tracing::info!("llama-server stopped"),
                Err(e) => tracing::warn!(error = %e, "failed to stop llama-server"),
            }
        }
    }
}

fn completion_stream(
    client: reqwest::Client,
    url: String,
    body: CompletionRequest,
    cancel: CancelSignal,
) -> TextStream {
    Box::pin(stream! {
        let response = match client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                yield Err(RuntimeError::from(ServerError::from_reqwest(&url, e)));
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            yield Err(RuntimeError::from(ServerError::Http { status: status.as_u16(), message }));
            return;
        }

        let mut bytes = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut exhausted = false;

        while !exhausted {
            if cancel.is_cancelled() {
                tracing::debug!("completion stream cancelled");
                return;
            }

            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    yield Err(RuntimeError::from(ServerError::Stream(e.to_string())));
                    return;
                }
                None => {
                    // Flush a final line that arrived without its newline.
                    exhausted = true;
                    pending.push(b'\n');
                }
            }

            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = pending.drain(..=pos).collect();
                match parse_sse_line(&String::from_utf8_lossy(&raw)) {
                    SseLine::Chunk(chunk) => {
                        if !chunk.content.is_empty() {
                            yield Ok::<String, RuntimeError>(chunk.content);
                        }
                        if chunk.stop {
                            return;
                        }
                    }
                    SseLine::Done => return,
                    SseLine::Error(message) => {
                        yield Err(RuntimeError::from(ServerError::Stream(message)));
                        return;
                    }
                    SseLine::Skip => {}
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    content: String,
    #[serde(default)]
    stop: bool,
}

#[derive(Debug)]
enum SseLine {
    Chunk(StreamChunk),
    Done,
    Error(String),
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    if let Some(message) = line.strip_prefix("error:") {
        return SseLine::Error(message.trim().to_string());
    }
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => SseLine::Chunk(chunk),
        Err(e) => {
            tracing::debug!(error = %e, line = data, "skipping unreadable event");
            SseLine::Skip
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Ready,
    /// Up, but still loading weights (HTTP 503).
    Loading,
    Down,
}

async fn check_health(client: &reqwest::Client, base_url: &str) -> Health {
    let response = client
        .get(format!("{base_url}/health"))
        .timeout(HEALTH_REQUEST_TIMEOUT)
        .send()
        .await;
    match response {
        Ok(r) if r.status().is_success() => Health::Ready,
        Ok(r) => {
            tracing::trace!(status = r.status().as_u16(), "llama-server not ready yet");
            Health::Loading
        }
        Err(_) => Health::Down,
    }
}

/// Fail with `ModelLoad` if the child has already exited.
fn ensure_running(
    child: &mut Child,
    model_path: &Path,
    tail: &StderrTail,
) -> Result<(), RuntimeError> {
    match child.try_wait() {
        Ok(Some(status)) => Err(RuntimeError::model_load(
            model_path,
            format!(
                "llama-server exited with {status} before the model was ready{}",
                render_tail(tail)
            ),
        )),
        Ok(None) => Ok(()),
        Err(e) => Err(RuntimeError::Platform(e.to_string())),
    }
}

/// Whether something accepts connections on `port` of the loopback interface.
async fn port_in_use(port: u16) -> bool {
    matches!(
        tokio::time::timeout(HEALTH_REQUEST_TIMEOUT, TcpStream::connect((HOST, port))).await,
        Ok(Ok(_))
    )
}

fn render_tail(tail: &StderrTail) -> String {
    let lines = match tail.lock() {
        Ok(t) => t.iter().cloned().collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };
    if lines.is_empty() {
        String::new()
    } else {
        format!(": {}", lines.join(" | "))
    }
}

/// Find the server binary: a path is used as-is, a bare name is looked up on `PATH`.
fn resolve_binary(binary: &str) -> Result<PathBuf, RuntimeError> {
    let candidate = Path::new(binary);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(RuntimeError::Platform(format!(
                "{} not found",
                candidate.display()
            )))
        };
    }

    find_on_path(binary)
        .ok_or_else(|| RuntimeError::Platform(format!("`{binary}` not found on PATH")))
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    let with_suffix = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    std::env::split_paths(&paths)
        .flat_map(|dir| [dir.join(name), dir.join(&with_suffix)])
        .find(|p| p.is_file())
}

fn spawn_error(binary: &Path, e: std::io::Error) -> RuntimeError {
    let reason = match e.kind() {
        std::io::ErrorKind::NotFound => format!("{} not found", binary.display()),
        std::io::ErrorKind::PermissionDenied => {
            format!("{} is not executable", binary.display())
        }
        _ if e.raw_os_error() == Some(EXEC_FORMAT_ERROR) => format!(
            "{} cannot run on {}-{}; it was built for a different architecture",
            binary.display(),
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
        _ => format!("failed to start {}: {e}", binary.display()),
    };
    RuntimeError::Platform(reason)
}
