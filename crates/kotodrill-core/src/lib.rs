//! kotodrill-core — Question generation and answer evaluation engine.
//!
//! This crate defines the data model, the model runtime handle and its
//! traits, the response parser, the question generator and its façade, and
//! the answer evaluator and vocabulary selector that the rest of kotodrill
//! builds on.

pub mod error;
pub mod evaluator;
pub mod generator;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod selector;
pub mod service;
pub mod traits;

pub use error::{GenerationError, RuntimeError};
pub use model::{Difficulty, Outcome, ProgressAggregate, Question, VocabularyItem};
pub use runtime::{ModelRuntime, RuntimeState};
pub use service::GenerationService;
pub use traits::CancelSignal;
