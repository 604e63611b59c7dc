//! kotodrill-runtime — Local model runtimes.
//!
//! Implements the `ModelLoader` / `LoadedModel` traits from `kotodrill-core`
//! on top of a llama.cpp `llama-server` sidecar, plus a scripted mock for
//! tests, and loads the `kotodrill.toml` configuration.

pub mod config;
pub mod error;
pub mod llama_server;
pub mod mock;

pub use config::{create_loader, load_config, load_config_from, KotodrillConfig, RuntimeConfig};
pub use error::ServerError;
pub use llama_server::LlamaServerLoader;
pub use mock::MockLoader;
