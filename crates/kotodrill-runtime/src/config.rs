//! Runtime configuration and loader factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use kotodrill_core::generator::GeneratorConfig;
use kotodrill_core::traits::ModelLoader;
use kotodrill_core::Difficulty;

use crate::llama_server::LlamaServerLoader;
use crate::mock::MockLoader;

/// Which runtime implementation serves the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// A `llama-server` sidecar process (or an already running server).
    #[default]
    LlamaServer,
    /// Streams `mock_response` instead of running a model.
    Mock,
}

/// The `[runtime]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Binary name looked up on `PATH`, or a path to it.
    #[serde(default = "default_server_binary")]
    pub server_binary: String,
    /// Attach to this running server instead of spawning one.
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_context_size")]
    pub context_size: u32,
    #[serde(default)]
    pub gpu_layers: u32,
    #[serde(default = "default_threads")]
    pub threads: u32,
    /// How long to wait for the model to load.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
    /// Raw completion text streamed by the mock backend.
    #[serde(default)]
    pub mock_response: Option<String>,
}

fn default_server_binary() -> String {
    "llama-server".to_string()
}
fn default_port() -> u16 {
    8089
}
fn default_context_size() -> u32 {
    2048
}
fn default_threads() -> u32 {
    4
}
fn default_startup_timeout() -> u64 {
    120
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            server_binary: default_server_binary(),
            server_url: None,
            port: default_port(),
            context_size: default_context_size(),
            gpu_layers: 0,
            threads: default_threads(),
            startup_timeout_secs: default_startup_timeout(),
            mock_response: None,
        }
    }
}

/// The `[generation]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Wall-clock limit for one completion.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

fn default_max_tokens() -> u32 {
    GeneratorConfig::default().max_tokens
}
fn default_max_chars() -> usize {
    GeneratorConfig::default().max_chars
}
fn default_temperature() -> f32 {
    GeneratorConfig::default().temperature
}
fn default_max_duration_secs() -> u64 {
    GeneratorConfig::default().max_duration.as_secs()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_chars: default_max_chars(),
            temperature: default_temperature(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            max_tokens: self.max_tokens,
            max_chars: self.max_chars,
            temperature: self.temperature,
            max_duration: Duration::from_secs(self.max_duration_secs),
        }
    }
}

/// Top-level kotodrill configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KotodrillConfig {
    /// GGUF model file used when `--model` is not given.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Directory holding `week{N}.json`, `progress.json` and `questions.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default, deserialize_with = "difficulty_from_str")]
    pub default_difficulty: Difficulty,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./kotodrill-data")
}

fn difficulty_from_str<'de, D: Deserializer<'de>>(d: D) -> Result<Difficulty, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Default for KotodrillConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            data_dir: default_data_dir(),
            default_difficulty: Difficulty::default(),
            runtime: RuntimeConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

/// Expand `${VAR}` references in every path-like field.
fn resolve_config(config: &mut KotodrillConfig) {
    config.model_path = config.model_path.as_deref().map(resolve_path);
    config.data_dir = resolve_path(&config.data_dir);
    config.runtime.server_binary = resolve_env_vars(&config.runtime.server_binary);
    config.runtime.server_url = config
        .runtime
        .server_url
        .as_deref()
        .map(resolve_env_vars);
}

/// Apply `KOTODRILL_*` overrides, reading variables through `lookup`.
fn apply_env_overrides(config: &mut KotodrillConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup("KOTODRILL_MODEL_PATH") {
        config.model_path = Some(PathBuf::from(path));
    }
    if let Some(binary) = lookup("KOTODRILL_SERVER_BIN") {
        config.runtime.server_binary = binary;
    }
    if let Some(dir) = lookup("KOTODRILL_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `kotodrill.toml` in the current directory
/// 2. `~/.config/kotodrill/config.toml`
///
/// Environment variable overrides: `KOTODRILL_MODEL_PATH`,
/// `KOTODRILL_SERVER_BIN`, `KOTODRILL_DATA_DIR`.
pub fn load_config() -> Result<KotodrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<KotodrillConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("kotodrill.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<KotodrillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => KotodrillConfig::default(),
    };

    resolve_config(&mut config);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("kotodrill"))
}

/// Create a model loader from the runtime configuration.
pub fn create_loader(config: &RuntimeConfig) -> Result<Box<dyn ModelLoader>> {
    match config.backend {
        Backend::LlamaServer => Ok(Box::new(LlamaServerLoader::new(config.clone()))),
        Backend::Mock => {
            let response = config
                .mock_response
                .as_deref()
                .context("runtime.mock_response is required when backend = \"mock\"")?;
            Ok(Box::new(MockLoader::with_fixed_response(response)))
        }
    }
}
