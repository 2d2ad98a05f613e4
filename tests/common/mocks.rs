//! Mock implementations for testing.
//!
//! Scripted collaborators for driving a [`ResearchPipeline`] without any
//! network access. Each mock records what it was asked so tests can assert
//! on call order and arguments.
//!
//! [`ResearchPipeline`]: deep_research::ResearchPipeline

use async_trait::async_trait;
use deep_research::db::{InMemoryMemoryStore, MemoryMatch, MemoryStore};
use deep_research::llm::LLMClient;
use deep_research::notify::Notifier;
use deep_research::pipeline::prompts::QUERY_WRITER_REQUEST;
use deep_research::sources::{SourceConnector, SourceSet};
use deep_research::types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// ============= Reasoning Service =============

/// Mock LLM client with separate scripts for the three reasoning steps.
///
/// Query generation is recognised by its fixed request text; every other
/// JSON-mode call is treated as reflection. Reflection replies are consumed
/// in order, and the last one repeats once the queue runs dry.
pub struct MockLLMClient {
    query_reply: String,
    summary_reply: String,
    reflections: Mutex<VecDeque<String>>,
    last_reflection: Mutex<String>,
    summary_prompts: Mutex<Vec<String>>,
    reflection_calls: Mutex<usize>,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(query: &str, summary: &str, follow_up: &str) -> Self {
        Self {
            query_reply: format!(r#"{{"query": "{}", "aspect": "overview", "rationale": "start"}}"#, query),
            summary_reply: summary.to_string(),
            reflections: Mutex::new(VecDeque::new()),
            last_reflection: Mutex::new(format!(
                r#"{{"knowledge_gap": "more detail", "follow_up_query": "{}"}}"#,
                follow_up
            )),
            summary_prompts: Mutex::new(Vec::new()),
            reflection_calls: Mutex::new(0),
            should_fail: false,
        }
    }

    /// Raw reply for query generation, used verbatim.
    pub fn with_query_reply(mut self, raw: &str) -> Self {
        self.query_reply = raw.to_string();
        self
    }

    /// Queue raw reflection replies, used verbatim.
    pub fn with_reflections(self, replies: &[&str]) -> Self {
        {
            let mut queue = self.reflections.lock();
            queue.extend(replies.iter().map(|r| r.to_string()));
        }
        self
    }

    /// A client whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("q", "s", "f")
        }
    }

    pub fn summary_prompts(&self) -> Vec<String> {
        self.summary_prompts.lock().clone()
    }

    pub fn reflection_calls(&self) -> usize {
        *self.reflection_calls.lock()
    }

    fn check(&self) -> Result<()> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.check()?;
        self.summary_prompts.lock().push(prompt.to_string());
        Ok(self.summary_reply.clone())
    }

    async fn generate_json(&self, _system: &str, prompt: &str) -> Result<String> {
        self.check()?;
        if prompt == QUERY_WRITER_REQUEST {
            return Ok(self.query_reply.clone());
        }

        *self.reflection_calls.lock() += 1;
        let mut queue = self.reflections.lock();
        match queue.pop_front() {
            Some(reply) => {
                *self.last_reflection.lock() = reply.clone();
                Ok(reply)
            }
            None => Ok(self.last_reflection.lock().clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ============= Source Connectors =============

#[derive(Clone)]
pub enum ConnectorBehavior {
    Results(Vec<SourceResult>),
    Unavailable(String),
    Misconfigured,
    Slow(Duration),
}

/// Mock connector that records every query it receives.
pub struct MockConnector {
    kind: SourceKind,
    behavior: ConnectorBehavior,
    queries: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(kind: SourceKind, behavior: ConnectorBehavior) -> Self {
        Self {
            kind,
            behavior,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Connector returning one result whose title and URL are derived from
    /// its kind.
    pub fn single(kind: SourceKind) -> Self {
        let result = SourceResult::new(
            format!("{} source", kind),
            format!("https://{}.example.org/article", kind),
            format!("Relevant {} content", kind),
        )
        .with_full_content(format!("Full {} content", kind));
        Self::new(kind, ConnectorBehavior::Results(vec![result]))
    }

    pub fn unavailable(kind: SourceKind, reason: &str) -> Self {
        Self::new(kind, ConnectorBehavior::Unavailable(reason.to_string()))
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl SourceConnector for MockConnector {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        self.queries.lock().push(query.to_string());
        match &self.behavior {
            ConnectorBehavior::Results(results) => Ok(SearchResponse::new(results.clone())),
            ConnectorBehavior::Unavailable(reason) => {
                Err(AppError::source_unavailable(self.kind, reason))
            }
            ConnectorBehavior::Misconfigured => Err(AppError::Configuration(format!(
                "{} source requires an API key",
                self.kind
            ))),
            ConnectorBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(SearchResponse::default())
            }
        }
    }

    fn max_tokens_per_source(&self) -> usize {
        500
    }
}

/// One mock connector per kind, kept so tests can inspect them after a run.
pub struct MockSources {
    pub web: Arc<MockConnector>,
    pub video: Arc<MockConnector>,
    pub encyclopedia: Arc<MockConnector>,
    pub academic: Arc<MockConnector>,
}

impl MockSources {
    pub fn healthy() -> Self {
        Self {
            web: Arc::new(MockConnector::single(SourceKind::Web)),
            video: Arc::new(MockConnector::single(SourceKind::Video)),
            encyclopedia: Arc::new(MockConnector::single(SourceKind::Encyclopedia)),
            academic: Arc::new(MockConnector::single(SourceKind::Academic)),
        }
    }

    pub fn with(mut self, connector: MockConnector) -> Self {
        let connector = Arc::new(connector);
        match connector.kind() {
            SourceKind::Web => self.web = connector,
            SourceKind::Video => self.video = connector,
            SourceKind::Encyclopedia => self.encyclopedia = connector,
            SourceKind::Academic => self.academic = connector,
        }
        self
    }

    pub fn set(&self) -> SourceSet {
        SourceSet::new(
            self.web.clone(),
            self.video.clone(),
            self.encyclopedia.clone(),
            self.academic.clone(),
        )
    }
}

// ============= Memory Store =============

/// In-memory store that records upsert ids and can be made to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryMemoryStore,
    upserts: Mutex<Vec<String>>,
    should_fail: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.upserts.lock().clone()
    }
}

#[async_trait]
impl MemoryStore for RecordingStore {
    fn provider_name(&self) -> &'static str {
        "recording"
    }

    async fn upsert(&self, id: &str, text: &str, keywords: &[String]) -> Result<()> {
        if self.should_fail {
            return Err(AppError::Memory("Mock store unreachable".to_string()));
        }
        self.upserts.lock().push(id.to_string());
        self.inner.upsert(id, text, keywords).await
    }

    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        keywords: Option<&[String]>,
    ) -> Result<Vec<MemoryMatch>> {
        if self.should_fail {
            return Err(AppError::Memory("Mock store unreachable".to_string()));
        }
        self.inner.search(query_text, top_k, keywords).await
    }
}

// ============= Notifiers =============

/// Mock notifier that records each report it was given.
pub struct MockNotifier {
    channel: String,
    should_fail: bool,
    sent: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            should_fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(channel: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(channel)
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn send(&self, report: &str, _topic: &str) -> Result<()> {
        self.sent.lock().push(report.to_string());
        if self.should_fail {
            return Err(AppError::notification(&self.channel, "mock delivery failure"));
        }
        Ok(())
    }
}
