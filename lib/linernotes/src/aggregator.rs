//! Fan-out/fan-in of completion calls into one shared markdown document.
//!
//! Every cycle gets a generation number from [`AggregationState::begin_cycle`].
//! Workers tag their writes with it, and writes from an older generation are
//! dropped, so a refresh never mixes answers from two tracks.

use futures::future::join_all;
use shared::{links::LinkSet, progress::AggregationSnapshot, prompt::PromptSpec};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::traits::CompletionBackend;

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    total_calls: usize,
    completed_calls: usize,
    document: String,
    last_error: Option<String>,
    warning: Option<String>,
    finished: bool,
}

impl Inner {
    fn completed_fraction(&self) -> f64 {
        if self.total_calls == 0 {
            return if self.finished { 1.0 } else { 0.0 };
        }
        (self.completed_calls as f64 / self.total_calls as f64).min(1.0)
    }

    fn count_call(&mut self) {
        self.completed_calls = (self.completed_calls + 1).min(self.total_calls);
    }
}

/// Progress and document of the running cycle, shared between worker tasks
/// and the UI poll. Every access goes through the one mutex.
#[derive(Debug, Default)]
pub struct AggregationState {
    inner: Mutex<Inner>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking worker cannot leave Inner half-written, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a fresh cycle of `total_calls` calls: progress back to 0, empty
    /// document, banners cleared. Returns the new generation.
    pub fn begin_cycle(&self, total_calls: usize) -> u64 {
        let mut inner = self.lock();
        let generation = inner.generation + 1;
        *inner = Inner {
            generation,
            total_calls,
            ..Default::default()
        };
        generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Appends one answer section. Returns false when the write was stale.
    pub fn record_success(&self, generation: u64, title: &str, body: &str) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.finished {
            return false;
        }
        inner.document.push_str(title);
        inner.document.push('\n');
        inner.document.push_str(body);
        inner.document.push('\n');
        inner.count_call();
        true
    }

    /// Counts a failed call as done and keeps its message as the last error.
    pub fn record_failure(&self, generation: u64, message: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.finished {
            return false;
        }
        inner.last_error = Some(message.into());
        inner.count_call();
        true
    }

    /// Appends the links section and seals the cycle.
    pub fn append_links(&self, generation: u64, links: &LinkSet) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.finished {
            return false;
        }
        inner.document.push_str(&links.to_markdown());
        inner.completed_calls = inner.total_calls;
        inner.finished = true;
        true
    }

    /// Flags a failed refresh without touching the current document.
    pub fn set_warning(&self, message: impl Into<String>) {
        self.lock().warning = Some(message.into());
    }

    pub fn completed_fraction(&self) -> f64 {
        self.lock().completed_fraction()
    }

    pub fn snapshot(&self) -> AggregationSnapshot {
        let inner = self.lock();
        AggregationSnapshot {
            generation: inner.generation,
            completed_fraction: inner.completed_fraction(),
            document: inner.document.clone(),
            last_error: inner.last_error.clone(),
            warning: inner.warning.clone(),
            finished: inner.finished,
        }
    }
}

/// Runs one completion call per prompt, all at once.
#[derive(Clone)]
pub struct Aggregator {
    backend: Arc<dyn CompletionBackend>,
}

impl Aggregator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Spawns one task per prompt and waits for all of them. Failures are
    /// recorded and never stop sibling calls. Cancelled calls record nothing.
    pub async fn run(
        &self,
        state: &Arc<AggregationState>,
        generation: u64,
        prompts: Vec<PromptSpec>,
        cancel: &CancellationToken,
    ) {
        info!(
            "Dispatching {} completion calls to {} (cycle {})",
            prompts.len(),
            self.backend.name(),
            generation
        );

        let handles: Vec<_> = prompts
            .into_iter()
            .map(|spec| {
                let backend = Arc::clone(&self.backend);
                let state = Arc::clone(state);
                let cancel = cancel.clone();
                let title = spec.title.clone();
                let handle = tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!("Cycle {} cancelled, dropping '{}'", generation, spec.title);
                            return;
                        }
                        result = backend.complete(&spec.prompt) => result,
                    };
                    match result {
                        Ok(body) => {
                            if state.record_success(generation, &spec.title, &body) {
                                debug!("Got '{}' ({} bytes)", spec.title, body.len());
                            }
                        }
                        Err(e) => {
                            warn!("Completion '{}' failed: {}", spec.title, e);
                            let message = format!("{}: {}", heading_text(&spec.title), e);
                            state.record_failure(generation, message);
                        }
                    }
                });
                (title, handle)
            })
            .collect();

        let (titles, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (title, joined) in titles.iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                warn!("Completion task '{}' did not finish: {}", title, e);
                let message = format!("{}: task failed", heading_text(title));
                state.record_failure(generation, message);
            }
        }

        debug!(
            "Cycle {} joined at {:.0}%",
            generation,
            state.completed_fraction() * 100.0
        );
    }
}

fn heading_text(title: &str) -> &str {
    title.trim_start_matches('#').trim()
}
