//! Scriptable in-process analyzer
//!
//! Answers every batch with `analysis[<index>]: <joined lines>` unless the
//! index is marked as failing. Per-index delays make completion order
//! controllable; call, completion and in-flight counters let tests check what
//! the orchestrators actually dispatched. A side effect can run inside each
//! call, e.g. to change the filesystem while a run is in progress.

use async_trait::async_trait;
use lyra_ai::config::RetryPolicy;
use lyra_ai::error::AnalysisError;
use lyra_ai::models::Batch;
use lyra_ai::services::{AnalyzerClient, ClosingPhraseFilter, LyricAnalyzer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Text the mock returns for a batch
pub fn expected_analysis(index: usize, lines: &[&str]) -> String {
    format!("analysis[{}]: {}", index, lines.join("\n"))
}

type SideEffect = Box<dyn Fn(&Batch) + Send + Sync>;

#[derive(Default)]
pub struct MockAnalyzer {
    failing: HashSet<usize>,
    delays: HashMap<usize, Duration>,
    default_delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completion_order: Mutex<Vec<usize>>,
    side_effect: Option<SideEffect>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every batch with one of these indices
    pub fn failing_on(mut self, indices: &[usize]) -> Self {
        self.failing.extend(indices.iter().copied());
        self
    }

    pub fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// Delay for indices without their own entry
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Run `effect` at the start of every call
    pub fn with_side_effect(mut self, effect: impl Fn(&Batch) + Send + Sync + 'static) -> Self {
        self.side_effect = Some(Box::new(effect));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completion_order(&self) -> Vec<usize> {
        self.completion_order.lock().unwrap().clone()
    }

    /// Wrap in an [`AnalyzerClient`] with no retries and no text cleanup
    /// beyond trimming
    pub fn client(self: &Arc<Self>) -> AnalyzerClient {
        AnalyzerClient::new(
            Arc::clone(self) as Arc<dyn LyricAnalyzer>,
            ClosingPhraseFilter::passthrough(),
            RetryPolicy::none(),
        )
    }
}

/// Decrements the in-flight counter even when the request future is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LyricAnalyzer for MockAnalyzer {
    async fn analyze(&self, batch: &Batch) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(effect) = &self.side_effect {
            effect(batch);
        }

        let delay = self
            .delays
            .get(&batch.index)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.completion_order.lock().unwrap().push(batch.index);

        if self.failing.contains(&batch.index) {
            return Err(AnalysisError::Api(500, format!("scripted failure for batch {}", batch.index)));
        }

        let lines: Vec<&str> = batch.lines.iter().map(String::as_str).collect();
        Ok(expected_analysis(batch.index, &lines))
    }
}
