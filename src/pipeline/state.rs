//! Research run state.
//!
//! [`ResearchState`] is only ever changed by folding a [`StateUpdate`] into
//! it with [`ResearchState::apply`], which consumes the old value. Steps read
//! the state by reference and return updates; the orchestrator owns the only
//! live copy.

use crate::types::{CitationEntry, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;

/// Name of the timing entry recorded at finalization.
pub const TOTAL_TIMING: &str = "total";

/// Elapsed seconds per step name, in first-recorded order.
///
/// Recording a step again replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTimings {
    entries: Vec<TimingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingEntry {
    pub step: String,
    pub seconds: f64,
}

impl StepTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: impl Into<String>, seconds: f64) {
        let step = step.into();
        match self.entries.iter_mut().find(|e| e.step == step) {
            Some(entry) => entry.seconds = seconds,
            None => self.entries.push(TimingEntry { step, seconds }),
        }
    }

    pub fn get(&self, step: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.step == step)
            .map(|e| e.seconds)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|e| (e.step.clone(), e.seconds))
            .collect()
    }
}

/// Outcome of one notification dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub channel: String,
    pub delivered: bool,
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn delivered(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            delivered: true,
            error: None,
        }
    }

    pub fn failed(channel: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            channel: channel.into(),
            delivered: false,
            error: Some(error.to_string()),
        }
    }
}

/// One change to a [`ResearchState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// Start of the run; captured by query generation.
    Started(Instant),
    /// New current query, from query generation or reflection.
    Query(String),
    /// Latest memory recall, replacing the previous one.
    Memory(Vec<String>),
    /// A formatted block for one source kind plus its citations.
    SourceBlock {
        kind: SourceKind,
        block: String,
        citations: Vec<CitationEntry>,
    },
    /// A full fetch cycle finished.
    CycleCompleted,
    /// New running summary, replacing the previous one.
    Summary(String),
    /// Elapsed time of one step.
    Timing { step: String, seconds: f64 },
    /// Final timing and rendered report.
    Finalized { total_seconds: f64, report: String },
    /// Result of one notification dispatch.
    Notification(NotificationOutcome),
}

/// State of one research run.
#[derive(Debug, Clone)]
pub struct ResearchState {
    topic: String,
    current_query: String,
    result_blocks: BTreeMap<SourceKind, Vec<String>>,
    citations: Vec<CitationEntry>,
    loop_count: u32,
    summary: String,
    recalled_memory: Vec<String>,
    timings: StepTimings,
    notified: BTreeSet<String>,
    notifications: Vec<NotificationOutcome>,
    started: Option<Instant>,
    report: Option<String>,
}

impl ResearchState {
    /// Fresh state with only the topic set.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            current_query: String::new(),
            result_blocks: BTreeMap::new(),
            citations: Vec::new(),
            loop_count: 0,
            summary: String::new(),
            recalled_memory: Vec::new(),
            timings: StepTimings::new(),
            notified: BTreeSet::new(),
            notifications: Vec::new(),
            started: None,
            report: None,
        }
    }

    /// Fold one update into the state.
    pub fn apply(mut self, update: StateUpdate) -> Self {
        match update {
            StateUpdate::Started(at) => {
                self.started.get_or_insert(at);
            }
            StateUpdate::Query(query) => self.current_query = query,
            StateUpdate::Memory(fragments) => self.recalled_memory = fragments,
            StateUpdate::SourceBlock {
                kind,
                block,
                citations,
            } => {
                self.result_blocks.entry(kind).or_default().push(block);
                self.citations.extend(citations);
            }
            StateUpdate::CycleCompleted => self.loop_count += 1,
            StateUpdate::Summary(summary) => self.summary = summary,
            StateUpdate::Timing { step, seconds } => self.timings.record(step, seconds),
            StateUpdate::Finalized {
                total_seconds,
                report,
            } => {
                self.timings.record(TOTAL_TIMING, total_seconds);
                self.report = Some(report);
            }
            StateUpdate::Notification(outcome) => {
                if outcome.delivered {
                    self.notified.insert(outcome.channel.clone());
                }
                self.notifications.push(outcome);
            }
        }
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn current_query(&self) -> &str {
        &self.current_query
    }

    /// Every block gathered for `kind`, oldest first.
    pub fn blocks(&self, kind: SourceKind) -> &[String] {
        self.result_blocks
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent block for `kind`, if any.
    pub fn latest_block(&self, kind: SourceKind) -> Option<&str> {
        self.blocks(kind).last().map(String::as_str)
    }

    pub fn citations(&self) -> &[CitationEntry] {
        &self.citations
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn recalled_memory(&self) -> &[String] {
        &self.recalled_memory
    }

    pub fn timings(&self) -> &StepTimings {
        &self.timings
    }

    pub fn notified(&self) -> &BTreeSet<String> {
        &self.notified
    }

    pub fn notifications(&self) -> &[NotificationOutcome] {
        &self.notifications
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(url: &str) -> CitationEntry {
        CitationEntry {
            title: url.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_new_state_has_only_topic() {
        let state = ResearchState::new("rust");
        assert_eq!(state.topic(), "rust");
        assert_eq!(state.loop_count(), 0);
        assert!(state.citations().is_empty());
        assert!(state.timings().is_empty());
        assert!(state.report().is_none());
    }

    #[test]
    fn test_blocks_and_citations_are_append_only() {
        let state = ResearchState::new("rust")
            .apply(StateUpdate::SourceBlock {
                kind: SourceKind::Web,
                block: "first".into(),
                citations: vec![citation("https://a")],
            })
            .apply(StateUpdate::SourceBlock {
                kind: SourceKind::Web,
                block: "second".into(),
                citations: vec![citation("https://a")],
            });

        assert_eq!(state.blocks(SourceKind::Web), ["first", "second"]);
        assert_eq!(state.latest_block(SourceKind::Web), Some("second"));
        assert_eq!(state.latest_block(SourceKind::Video), None);
        // No dedup across cycles
        assert_eq!(state.citations().len(), 2);
    }

    #[test]
    fn test_summary_and_memory_are_replaced() {
        let state = ResearchState::new("rust")
            .apply(StateUpdate::Summary("one".into()))
            .apply(StateUpdate::Summary("two".into()))
            .apply(StateUpdate::Memory(vec!["a".into()]))
            .apply(StateUpdate::Memory(vec!["b".into()]));
        assert_eq!(state.summary(), "two");
        assert_eq!(state.recalled_memory(), ["b"]);
    }

    #[test]
    fn test_started_is_captured_once() {
        let first = Instant::now();
        let later = first + std::time::Duration::from_secs(5);
        let state = ResearchState::new("rust")
            .apply(StateUpdate::Started(first))
            .apply(StateUpdate::Started(later));
        assert_eq!(state.started(), Some(first));
    }

    #[test]
    fn test_timings_keep_first_position_and_latest_value() {
        let mut timings = StepTimings::new();
        timings.record("web_research", 1.0);
        timings.record("summarize", 2.0);
        timings.record("web_research", 3.0);

        let steps: Vec<_> = timings.iter().map(|e| e.step.as_str()).collect();
        assert_eq!(steps, ["web_research", "summarize"]);
        assert_eq!(timings.get("web_research"), Some(3.0));
        assert_eq!(timings.to_map().len(), 2);
    }

    #[test]
    fn test_notifications_track_delivered_channels() {
        let state = ResearchState::new("rust")
            .apply(StateUpdate::Notification(NotificationOutcome::failed(
                "email", "refused",
            )))
            .apply(StateUpdate::Notification(NotificationOutcome::delivered(
                "discord",
            )));
        assert_eq!(state.notifications().len(), 2);
        assert!(state.notified().contains("discord"));
        assert!(!state.notified().contains("email"));
    }
}
