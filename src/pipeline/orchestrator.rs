//! Research pipeline orchestrator.
//!
//! Drives one run through a fixed sequence of steps:
//!
//! ```text
//! generate_query → recall_memory → web → video → encyclopedia → academic
//!     → summarize → reflect ─┬─ loop_count <= max_loops ─→ web
//!                            └─ otherwise ─→ finalize → notify (each channel) → done
//! ```
//!
//! Source failures are contained at the connector boundary: a
//! `SourceUnavailable` error or a timeout turns into a placeholder block and
//! the cycle continues. Configuration, reasoning and memory-store errors end
//! the run.

use super::report::render_report;
use super::state::{NotificationOutcome, ResearchState, StateUpdate, StepTimings};
use super::steps::{self, LatestBlocks};
use crate::aggregate::{aggregate, citation_list};
use crate::db::MemoryStore;
use crate::llm::LLMClient;
use crate::memory::{MemoryRecall, MemoryUpsert};
use crate::notify::Notifier;
use crate::sources::SourceSet;
use crate::types::{AppError, Result, SourceKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run-wide limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Reflection routes back to the web step while the completed cycle
    /// count is at most this value, so a run performs `max_loops + 1` cycles.
    pub max_loops: u32,
    pub recall_top_k: usize,
    /// Upper bound on one connector call before it is treated as unavailable.
    pub source_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_loops: 3,
            recall_top_k: 5,
            source_timeout: Duration::from_secs(30),
        }
    }
}

/// States of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GenerateQuery,
    RecallMemory,
    Research(SourceKind),
    Summarize,
    Reflect,
    Finalize,
    /// Dispatch through the notifier at this index.
    Notify(usize),
    Done,
}

impl Step {
    /// Name under which the step's duration is recorded, if it is timed.
    pub fn timing_name(&self) -> Option<&'static str> {
        match self {
            Step::GenerateQuery => Some("generate_query"),
            Step::RecallMemory => Some("recall_memory"),
            Step::Research(kind) => Some(kind.step_name()),
            Step::Summarize => Some("summarize"),
            Step::Reflect => Some("reflect"),
            Step::Finalize | Step::Notify(_) | Step::Done => None,
        }
    }

    /// Successor of this step.
    ///
    /// `loop_count` is the number of completed fetch cycles, read after this
    /// step's updates were applied.
    pub fn next(self, loop_count: u32, max_loops: u32, notifier_count: usize) -> Step {
        match self {
            Step::GenerateQuery => Step::RecallMemory,
            Step::RecallMemory => Step::Research(SourceKind::Web),
            Step::Research(SourceKind::Web) => Step::Research(SourceKind::Video),
            Step::Research(SourceKind::Video) => Step::Research(SourceKind::Encyclopedia),
            Step::Research(SourceKind::Encyclopedia) => Step::Research(SourceKind::Academic),
            Step::Research(SourceKind::Academic) => Step::Summarize,
            Step::Summarize => Step::Reflect,
            Step::Reflect => route_after_reflect(loop_count, max_loops),
            Step::Finalize => Step::notify_or_done(0, notifier_count),
            Step::Notify(i) => Step::notify_or_done(i + 1, notifier_count),
            Step::Done => Step::Done,
        }
    }

    fn notify_or_done(index: usize, notifier_count: usize) -> Step {
        if index < notifier_count {
            Step::Notify(index)
        } else {
            Step::Done
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Finalize => f.write_str("finalize"),
            Step::Notify(i) => write!(f, "notify[{}]", i),
            Step::Done => f.write_str("done"),
            other => f.write_str(other.timing_name().unwrap_or("unknown")),
        }
    }
}

/// Routing decision after reflection.
pub fn route_after_reflect(loop_count: u32, max_loops: u32) -> Step {
    if loop_count <= max_loops {
        Step::Research(SourceKind::Web)
    } else {
        Step::Finalize
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutput {
    pub topic: String,
    pub report: String,
    pub timings: StepTimings,
    pub notifications: Vec<NotificationOutcome>,
    pub loops_completed: u32,
    pub started_at: DateTime<Utc>,
}

impl ResearchOutput {
    pub fn delivered_channels(&self) -> impl Iterator<Item = &str> {
        self.notifications
            .iter()
            .filter(|n| n.delivered)
            .map(|n| n.channel.as_str())
    }
}

/// Sequences connectors, memory, reasoning steps and notifiers for research
/// runs. Holds no per-run state, so one pipeline can serve concurrent runs.
pub struct ResearchPipeline {
    llm: Arc<dyn LLMClient>,
    sources: SourceSet,
    recall: MemoryRecall,
    upsert: MemoryUpsert,
    notifiers: Vec<Arc<dyn Notifier>>,
    options: PipelineOptions,
}

impl ResearchPipeline {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        sources: SourceSet,
        store: Arc<dyn MemoryStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            llm,
            sources,
            recall: MemoryRecall::new(store.clone()),
            upsert: MemoryUpsert::new(store),
            notifiers: Vec::new(),
            options,
        }
    }

    /// Add a notification channel. Channels are dispatched in the order added.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    /// Execute one research run for `topic`.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] for a blank topic
    /// - [`AppError::Configuration`] when a connector lacks its credential
    /// - [`AppError::LLM`] / [`AppError::MalformedResponse`] from reasoning steps
    /// - [`AppError::Memory`] when the memory store is unreachable
    ///
    /// Unavailable sources and failed notifications never fail the run.
    pub async fn run(&self, topic: &str) -> Result<ResearchOutput> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("research topic is empty".into()));
        }

        let started_at = Utc::now();
        let mut state = ResearchState::new(topic);
        let mut step = Step::GenerateQuery;

        tracing::info!(topic, max_loops = self.options.max_loops, "Starting research run");

        while step != Step::Done {
            tracing::debug!(step = %step, loop_count = state.loop_count(), "Entering step");
            let step_started = Instant::now();
            if step == Step::GenerateQuery {
                state = state.apply(StateUpdate::Started(step_started));
            }

            let updates = self.execute(step, &state).await?;
            state = updates.into_iter().fold(state, ResearchState::apply);

            if let Some(name) = step.timing_name() {
                let seconds = step_started.elapsed().as_secs_f64();
                tracing::debug!(step = name, elapsed_ms = (seconds * 1000.0) as u64, "Step finished");
                state = state.apply(StateUpdate::Timing {
                    step: name.to_string(),
                    seconds,
                });
            }

            step = step.next(
                state.loop_count(),
                self.options.max_loops,
                self.notifiers.len(),
            );
        }

        let report = state
            .report()
            .ok_or_else(|| AppError::Internal("run finished without a report".into()))?
            .to_string();

        tracing::info!(
            topic,
            loops = state.loop_count(),
            citations = state.citations().len(),
            notified = state.notified().len(),
            "Research run complete"
        );

        Ok(ResearchOutput {
            topic: topic.to_string(),
            report,
            timings: state.timings().clone(),
            notifications: state.notifications().to_vec(),
            loops_completed: state.loop_count(),
            started_at,
        })
    }

    async fn execute(&self, step: Step, state: &ResearchState) -> Result<Vec<StateUpdate>> {
        match step {
            Step::GenerateQuery => {
                let query = steps::generate_query(self.llm.as_ref(), state.topic()).await?;
                Ok(vec![StateUpdate::Query(query)])
            }
            Step::RecallMemory => {
                let fragments = self
                    .recall
                    .recall(state.current_query(), self.options.recall_top_k)
                    .await?;
                Ok(vec![StateUpdate::Memory(fragments)])
            }
            Step::Research(kind) => self.research(kind, state).await,
            Step::Summarize => {
                let latest = LatestBlocks::from_fn(|kind| state.latest_block(kind));
                let summary = steps::summarize(
                    self.llm.as_ref(),
                    state.summary(),
                    state.recalled_memory(),
                    latest,
                    state.topic(),
                )
                .await?;
                Ok(vec![StateUpdate::Summary(summary)])
            }
            Step::Reflect => {
                let query =
                    steps::reflect(self.llm.as_ref(), state.summary(), state.topic()).await?;
                tracing::info!(
                    loop_count = state.loop_count(),
                    next_query = %query,
                    "Research cycle complete"
                );
                Ok(vec![StateUpdate::Query(query)])
            }
            Step::Finalize => Ok(vec![self.finalize(state)]),
            Step::Notify(index) => {
                let outcome = match self.notifiers.get(index) {
                    Some(notifier) => Self::dispatch(notifier.as_ref(), state).await,
                    None => return Ok(Vec::new()),
                };
                Ok(vec![StateUpdate::Notification(outcome)])
            }
            Step::Done => Ok(Vec::new()),
        }
    }

    /// Fetch one source kind, degrading on unavailability.
    async fn research(&self, kind: SourceKind, state: &ResearchState) -> Result<Vec<StateUpdate>> {
        let connector = self.sources.get(kind);
        let loop_count = state.loop_count();

        let fetched = tokio::time::timeout(
            self.options.source_timeout,
            connector.fetch(state.current_query(), loop_count),
        )
        .await
        .unwrap_or_else(|_| Err(AppError::source_unavailable(kind, "retrieval timed out")));

        let mut updates = match fetched {
            Ok(response) => {
                let block = aggregate(
                    response.clone(),
                    connector.max_tokens_per_source(),
                    connector.include_full_content(),
                );
                let citations = citation_list(&response.results);

                let source_id = format!("{}_{}", kind.memory_prefix(), loop_count);
                self.upsert.upsert(&source_id, &block, state.topic()).await?;

                tracing::debug!(
                    source = %kind,
                    results = response.results.len(),
                    "Source block gathered"
                );
                vec![StateUpdate::SourceBlock {
                    kind,
                    block,
                    citations,
                }]
            }
            Err(e) => {
                let reason = match e.degradation_reason() {
                    Some(reason) => reason.to_string(),
                    None => return Err(e),
                };
                tracing::warn!(source = %kind, loop_count, reason = %reason, "Source unavailable, continuing");
                vec![StateUpdate::SourceBlock {
                    kind,
                    block: degraded_block(kind, &reason),
                    citations: Vec::new(),
                }]
            }
        };

        if kind == SourceKind::Academic {
            updates.push(StateUpdate::CycleCompleted);
        }
        Ok(updates)
    }

    fn finalize(&self, state: &ResearchState) -> StateUpdate {
        let total_seconds = state
            .started()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or_default();

        let mut timings = state.timings().clone();
        timings.record(super::state::TOTAL_TIMING, total_seconds);
        let report = render_report(state.topic(), state.summary(), state.citations(), &timings);

        StateUpdate::Finalized {
            total_seconds,
            report,
        }
    }

    /// Dispatch the report through one channel, converting failure into a
    /// recorded outcome.
    ///
    /// Every channel is attempted even when an earlier one failed. Earlier
    /// releases stopped dispatching at the first failing channel.
    async fn dispatch(notifier: &dyn Notifier, state: &ResearchState) -> NotificationOutcome {
        let channel = notifier.channel().to_string();
        let report = state.report().unwrap_or_default();

        match notifier.send(report, state.topic()).await {
            Ok(()) => {
                tracing::info!(channel = %channel, "Notification delivered");
                NotificationOutcome::delivered(channel)
            }
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Notification failed");
                NotificationOutcome::failed(channel, e)
            }
        }
    }
}

/// Placeholder block recorded for a source that could not be reached.
pub fn degraded_block(kind: SourceKind, reason: &str) -> String {
    format!("Sources:\n\n[{} results unavailable: {}]", kind, reason)
}
