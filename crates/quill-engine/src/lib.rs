//! # quill-engine
//!
//! Asynchronous evolution engine for Quill.
//!
//! This crate drives the pure logic in `quill-core` against an external
//! text-generation service:
//!
//! - [`GenerationService`](providers::GenerationService) abstracts the
//!   backend (model listing + text generation); a Gemini implementation
//!   is available behind the `gemini` feature.
//! - [`EvolutionEngine`](engine::EvolutionEngine) owns the single-flight
//!   job state machine, runs the pipeline on a background worker, and
//!   publishes results through a non-blocking channel.
//! - [`JsonlHistoryLog`](history::JsonlHistoryLog) appends one record
//!   per evolution to a durable JSON-lines log.
//! - [`FsDocumentStore`](store::FsDocumentStore) is the flat-file
//!   document store consumed by drivers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_engine::{EvolutionEngineBuilder, JsonlHistoryLog};
//! use quill_engine::providers::GeminiClient;
//!
//! let engine = EvolutionEngineBuilder::new()
//!     .service(Arc::new(GeminiClient::from_env()?))
//!     .history(Arc::new(JsonlHistoryLog::new("history.jsonl")))
//!     .build()?;
//!
//! engine.submit(document)?;
//! while engine.drain().is_none() {
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//! }
//! ```

pub mod config;
pub mod engine;
pub mod history;
pub mod prompts;
pub mod providers;
pub mod store;

// Re-export main types at crate root
pub use config::EngineConfig;
pub use engine::{
    EngineError, EngineEvent, EvolutionEngine, EvolutionEngineBuilder, FailureKind, JobState,
};
pub use history::{HistoryError, HistoryLog, JsonlHistoryLog};
pub use providers::{GenerationError, GenerationService};
pub use store::{DocumentStore, FsDocumentStore, StoreError};
