//! Engine configuration.

use std::time::Duration;

use quill_core::ModelId;

/// Configuration for an [`EvolutionEngine`](crate::engine::EvolutionEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidate models in priority order; the first one the backend
    /// reports as available is selected and reused for all jobs.
    pub preferred_models: Vec<ModelId>,

    /// Optional cap on a single generation call. When it fires the job
    /// fails with a timeout; the generation call itself is not required
    /// to be preemptible.
    pub generation_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preferred_models: vec![
                ModelId::from("models/gemini-1.5-pro-002"),
                ModelId::from("models/gemini-1.5-pro-latest"),
                ModelId::from("models/gemini-1.5-pro"),
                ModelId::from("models/gemini-2.0-pro-exp"),
            ],
            generation_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Replace the preferred-model list.
    pub fn with_preferred_models(mut self, models: Vec<ModelId>) -> Self {
        self.preferred_models = models;
        self
    }

    /// Set a timeout for each generation call.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }
}
