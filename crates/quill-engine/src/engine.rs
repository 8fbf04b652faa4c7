//! The evolution engine state machine.
//!
//! One engine instance runs at most one evolution job at a time. A job
//! accepted by [`EvolutionEngine::submit`] runs on a background worker:
//! model selection, generation, safety validation, transform, history
//! append. The caller never blocks; it polls [`EvolutionEngine::drain`]
//! for results. Errors from the pipeline are delivered as events on the
//! same channel, never raised across the worker boundary.
//!
//! State transitions: `Idle -> Running -> Succeeded | Failed -> Idle`.
//! The terminal states last only until the caller drains the final
//! event of the job.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use quill_core::{
    select_model, DenylistValidator, Document, EvolutionDirection, EvolutionRecord, ModelId,
    RejectReason, SuggestionValidator,
};

use crate::config::EngineConfig;
use crate::history::{HistoryError, HistoryLog};
use crate::prompts;
use crate::providers::{GenerationError, GenerationService};

/// Errors from the evolution engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("suggestion rejected: {0}")]
    ValidationRejected(#[from] RejectReason),

    #[error("no preferred model is available from the backend")]
    NoModelAvailable,

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("history persistence failed: {0}")]
    Persistence(#[from] HistoryError),

    #[error("an evolution job is already running")]
    AlreadyRunning,

    #[error("job cancelled")]
    Cancelled,

    #[error("generation call timed out")]
    Timeout,

    #[error("engine not configured: {0}")]
    NotConfigured(String),
}

impl EngineError {
    /// The job-state bucket for this error.
    fn kind(&self) -> FailureKind {
        match self {
            EngineError::ValidationRejected(_) => FailureKind::Validation,
            EngineError::NoModelAvailable => FailureKind::NoModel,
            EngineError::Generation(_) => FailureKind::Generation,
            EngineError::Persistence(_) => FailureKind::Persistence,
            EngineError::Cancelled => FailureKind::Cancelled,
            EngineError::Timeout => FailureKind::Timeout,
            EngineError::AlreadyRunning | EngineError::NotConfigured(_) => FailureKind::Generation,
        }
    }
}

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    NoModel,
    Generation,
    Persistence,
    Cancelled,
    Timeout,
}

/// The engine's single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No job; `submit` is accepted
    Idle,
    /// A worker is executing the pipeline
    Running,
    /// The job finished; the result is waiting to be drained
    Succeeded,
    /// The job failed; the failure event is waiting to be drained
    Failed(FailureKind),
}

/// A result delivered through the engine's channel.
#[derive(Debug)]
pub enum EngineEvent {
    /// A document evolved successfully. `history_warning` is set when
    /// the evolution applied but the audit append failed - document
    /// evolution and audit logging are independent failure domains.
    Evolved {
        document: Document,
        record: EvolutionRecord,
        history_warning: Option<String>,
    },

    /// A job (or one document of a batch) failed; the original document
    /// is unchanged.
    Failed {
        document_id: String,
        error: EngineError,
    },

    /// Sentinel: a batch finished, either completely or because
    /// cancellation intervened.
    BatchComplete { cancelled: bool },
}

/// Shared state between the engine handle and its worker.
struct Inner {
    service: Arc<dyn GenerationService>,
    history: Arc<dyn HistoryLog>,
    validator: Arc<dyn SuggestionValidator>,
    config: EngineConfig,

    /// The single-flight job slot; `submit` and the worker both touch it
    state: Mutex<JobState>,

    /// Direction for the next accepted job
    direction: Mutex<EvolutionDirection>,

    /// Selected model, chosen once and reused across jobs
    model: RwLock<Option<ModelId>>,

    /// Cooperative cancellation flag, checked at worker checkpoints
    cancel: AtomicBool,

    tx: UnboundedSender<(EngineEvent, bool)>,
}

/// Asynchronous content-evolution engine.
///
/// `submit` and `drain` never block; the worker blocks only on the
/// generation call and on history I/O.
pub struct EvolutionEngine {
    inner: Arc<Inner>,
    rx: Mutex<UnboundedReceiver<(EngineEvent, bool)>>,
}

impl EvolutionEngine {
    /// Create an engine with the default validator and configuration.
    pub fn new(service: Arc<dyn GenerationService>, history: Arc<dyn HistoryLog>) -> Self {
        Self::with_parts(
            service,
            history,
            Arc::new(DenylistValidator::default()),
            EngineConfig::default(),
        )
    }

    fn with_parts(
        service: Arc<dyn GenerationService>,
        history: Arc<dyn HistoryLog>,
        validator: Arc<dyn SuggestionValidator>,
        config: EngineConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                service,
                history,
                validator,
                config,
                state: Mutex::new(JobState::Idle),
                direction: Mutex::new(EvolutionDirection::default()),
                model: RwLock::new(None),
                cancel: AtomicBool::new(false),
                tx,
            }),
            rx: Mutex::new(rx),
        }
    }

    /// Current job state.
    pub fn state(&self) -> JobState {
        *self.inner.state.lock()
    }

    /// Store the direction used by the next accepted job.
    ///
    /// Only allowed while idle; fails with `AlreadyRunning` otherwise.
    pub fn configure(&self, direction: EvolutionDirection) -> Result<(), EngineError> {
        let state = self.inner.state.lock();
        if *state != JobState::Idle {
            return Err(EngineError::AlreadyRunning);
        }
        *self.inner.direction.lock() = direction;
        Ok(())
    }

    /// Submit one document for evolution.
    ///
    /// Returns immediately. If a job is in flight (or its result has not
    /// been drained yet) this fails synchronously with `AlreadyRunning`;
    /// otherwise the pipeline starts on a background worker and exactly
    /// one event will eventually arrive on the channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, document: Document) -> Result<(), EngineError> {
        let direction = self.accept()?;
        tracing::info!(document_id = %document.id, "evolution job accepted");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { run_single(inner, document, direction).await });
        Ok(())
    }

    /// Submit a batch of documents, processed one at a time in order.
    ///
    /// One event is delivered per document as it completes, followed by
    /// a [`EngineEvent::BatchComplete`] sentinel. A failure on one
    /// document does not abort the rest of the batch.
    pub fn submit_batch(&self, documents: Vec<Document>) -> Result<(), EngineError> {
        let direction = self.accept()?;
        tracing::info!(count = documents.len(), "batch evolution accepted");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { run_batch(inner, documents, direction).await });
        Ok(())
    }

    /// Non-blocking poll of the result channel.
    ///
    /// Returns the next pending event, or `None` if the job is still
    /// running or no job exists. Draining the final event of a job
    /// resets the engine to `Idle`.
    pub fn drain(&self) -> Option<EngineEvent> {
        let mut rx = self.rx.lock();
        let (event, terminal) = rx.try_recv().ok()?;
        if terminal {
            *self.inner.state.lock() = JobState::Idle;
        }
        Some(event)
    }

    /// Request cooperative cancellation.
    ///
    /// Takes effect at the next worker checkpoint before a generation
    /// call (or before the next batch item); an in-flight generation
    /// call runs to completion first.
    pub fn cancel(&self) {
        self.inner.cancel.store(true, Ordering::SeqCst);
        tracing::info!("cancellation requested");
    }

    /// Select the generation model now instead of on first use.
    pub async fn ensure_model(&self) -> Result<ModelId, EngineError> {
        ensure_model(&self.inner).await
    }

    /// Forget the selected model; the next job re-selects.
    pub fn reset_model(&self) {
        *self.inner.model.write() = None;
    }

    /// The currently selected model, if any.
    pub fn selected_model(&self) -> Option<ModelId> {
        self.inner.model.read().clone()
    }

    /// Transition `Idle -> Running`, clearing the cancellation flag, and
    /// snapshot the direction for the accepted job.
    fn accept(&self) -> Result<EvolutionDirection, EngineError> {
        let mut state = self.inner.state.lock();
        if *state != JobState::Idle {
            return Err(EngineError::AlreadyRunning);
        }
        *state = JobState::Running;
        self.inner.cancel.store(false, Ordering::SeqCst);
        Ok(self.inner.direction.lock().clone())
    }
}

/// Lazily select the generation model, caching the choice.
async fn ensure_model(inner: &Inner) -> Result<ModelId, EngineError> {
    if let Some(model) = inner.model.read().clone() {
        return Ok(model);
    }
    let available = inner.service.list_models().await?;
    let selected = select_model(&inner.config.preferred_models, &available)
        .ok_or(EngineError::NoModelAvailable)?;
    tracing::info!(
        model = %selected,
        backend = inner.service.name(),
        "selected generation model"
    );
    *inner.model.write() = Some(selected.clone());
    Ok(selected)
}

/// Run the pipeline for one document: model, generate, validate, apply,
/// record.
async fn evolve_one(
    inner: &Inner,
    document: &Document,
    direction: &EvolutionDirection,
) -> Result<(Document, EvolutionRecord, Option<String>), EngineError> {
    if inner.cancel.load(Ordering::SeqCst) {
        return Err(EngineError::Cancelled);
    }

    let model = ensure_model(inner).await?;

    // Last checkpoint before the generation call; the call itself is
    // not preemptible.
    if inner.cancel.load(Ordering::SeqCst) {
        return Err(EngineError::Cancelled);
    }

    let prompt = prompts::build_prompt(document, direction);
    tracing::debug!(document_id = %document.id, prompt_chars = prompt.len(), "requesting suggestion");
    let generation = inner.service.generate(&model, &prompt);
    let suggestion = match inner.config.generation_timeout {
        Some(limit) => tokio::time::timeout(limit, generation)
            .await
            .map_err(|_| EngineError::Timeout)??,
        None => generation.await?,
    };

    inner.validator.validate(&suggestion)?;
    let (evolved, record) = quill_core::apply(document, &suggestion);

    // Audit logging is an independent failure domain: a failed append
    // does not roll back the evolution.
    let history_warning = match inner.history.append(&record) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(
                error = %e,
                document_id = %document.id,
                "evolution applied but history append failed"
            );
            Some(e.to_string())
        }
    };

    Ok((evolved, record, history_warning))
}

async fn run_single(inner: Arc<Inner>, document: Document, direction: EvolutionDirection) {
    match evolve_one(&inner, &document, &direction).await {
        Ok((evolved, record, history_warning)) => {
            tracing::info!(document_id = %evolved.id, "evolution job succeeded");
            finish(
                &inner,
                JobState::Succeeded,
                EngineEvent::Evolved {
                    document: evolved,
                    record,
                    history_warning,
                },
            );
        }
        Err(error) => {
            tracing::error!(error = %error, document_id = %document.id, "evolution job failed");
            finish(
                &inner,
                JobState::Failed(error.kind()),
                EngineEvent::Failed {
                    document_id: document.id,
                    error,
                },
            );
        }
    }
}

async fn run_batch(inner: Arc<Inner>, documents: Vec<Document>, direction: EvolutionDirection) {
    let mut cancelled = false;
    for document in documents {
        if inner.cancel.load(Ordering::SeqCst) {
            cancelled = true;
            break;
        }
        match evolve_one(&inner, &document, &direction).await {
            Ok((evolved, record, history_warning)) => {
                tracing::info!(document_id = %evolved.id, "batch item evolved");
                emit(
                    &inner,
                    EngineEvent::Evolved {
                        document: evolved,
                        record,
                        history_warning,
                    },
                );
            }
            Err(EngineError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(error) => {
                tracing::error!(error = %error, document_id = %document.id, "batch item failed");
                emit(
                    &inner,
                    EngineEvent::Failed {
                        document_id: document.id,
                        error,
                    },
                );
            }
        }
    }

    let state = if cancelled {
        JobState::Failed(FailureKind::Cancelled)
    } else {
        JobState::Succeeded
    };
    tracing::info!(cancelled, "batch evolution finished");
    finish(&inner, state, EngineEvent::BatchComplete { cancelled });
}

/// Publish a non-terminal event.
fn emit(inner: &Inner, event: EngineEvent) {
    let _ = inner.tx.send((event, false));
}

/// Record the job's terminal state, then publish its final event.
/// Draining that event resets the engine to `Idle`.
fn finish(inner: &Inner, state: JobState, event: EngineEvent) {
    *inner.state.lock() = state;
    let _ = inner.tx.send((event, true));
}

/// Builder for [`EvolutionEngine`].
pub struct EvolutionEngineBuilder {
    service: Option<Arc<dyn GenerationService>>,
    history: Option<Arc<dyn HistoryLog>>,
    validator: Arc<dyn SuggestionValidator>,
    config: EngineConfig,
}

impl EvolutionEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            service: None,
            history: None,
            validator: Arc::new(DenylistValidator::default()),
            config: EngineConfig::default(),
        }
    }

    /// Set the generation service.
    pub fn service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Set the history log.
    pub fn history(mut self, history: Arc<dyn HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Replace the default suggestion validator.
    pub fn validator(mut self, validator: Arc<dyn SuggestionValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<EvolutionEngine, EngineError> {
        let service = self
            .service
            .ok_or_else(|| EngineError::NotConfigured("no generation service set".to_string()))?;
        let history = self
            .history
            .ok_or_else(|| EngineError::NotConfigured("no history log set".to_string()))?;
        Ok(EvolutionEngine::with_parts(
            service,
            history,
            self.validator,
            self.config,
        ))
    }
}

impl Default for EvolutionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
