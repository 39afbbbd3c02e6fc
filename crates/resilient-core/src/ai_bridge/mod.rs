//! AI bridge: asynchronous, exactly-once request/response channel to a remote chat model.
//!
//! Every query gets a monotonically increasing id and a single-shot completion slot in a
//! concurrent pending map. Whoever removes the slot first (the transport task, an
//! out-of-band `deliver`, or the drop guard) is the only one that completes it, so a
//! caller sees exactly one result per query and nothing is left dangling.
//!
//! There is no cancellation of the remote call. Dropping a [`PendingQuery`] (for example when a
//! caller's timeout fires) frees its slot, and a reply arriving afterwards is ignored.

mod prompts;
mod transport;

pub use prompts::{
    coping_strategies_prompt, journal_prompt_request, mood_analysis_prompt, parse_analysis,
    parse_strategy_json, parse_strategy_list, strip_code_fence, AiRecommendation, AiResource,
    AiStrategy, AnalysisReport, STRATEGY_COUNT,
};
pub use transport::{ChatReply, ChatRequest, ChatTransport, OpenRouterTransport, OPENROUTER_API_BASE};

use crate::error::AiError;
use crate::mood::MoodEntry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

pub type QueryId = u64;

pub const DEFAULT_LIGHT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";
pub const DEFAULT_CAPABLE_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Per-request options forwarded to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    pub model: String,
}

impl ModelOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }
}

/// Named remote model tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap and fast: strategy lists, journal prompts.
    Light,
    /// Better reasoning: pattern analysis.
    Capable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Result of `analyze_mood_patterns`: structured when the model honoured the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum MoodAnalysis {
    Structured(AnalysisReport),
    RawText(String),
}

type Completion = oneshot::Sender<Result<String, AiError>>;

struct BridgeInner {
    transport: Arc<dyn ChatTransport>,
    pending: DashMap<QueryId, Completion>,
    next_id: AtomicU64,
    readiness: watch::Sender<Readiness>,
    light_model: String,
    capable_model: String,
}

impl BridgeInner {
    /// Completes `id` if it is still pending. Returns false when it was already resolved.
    fn complete(&self, id: QueryId, result: Result<String, AiError>) -> bool {
        match self.pending.remove(&id) {
            Some((_, tx)) => {
                if let Err(ref e) = result {
                    tracing::debug!(target: "resilient::ai_bridge", query_id = id, error = %e, "query failed");
                }
                // The caller may have stopped listening; that is not an error.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

/// Completes its query with a failure if the transport task ends without doing so.
struct CompletionGuard {
    inner: Arc<BridgeInner>,
    id: QueryId,
    armed: bool,
}

impl CompletionGuard {
    fn finish(mut self, result: Result<String, AiError>) {
        self.armed = false;
        self.inner.complete(self.id, result);
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.armed {
            self.inner.complete(
                self.id,
                Err(AiError::request_failed(
                    "transport task ended before a response was matched",
                )),
            );
        }
    }
}

/// Handle to one in-flight query. Dropping it releases the pending slot.
pub struct PendingQuery {
    id: QueryId,
    rx: oneshot::Receiver<Result<String, AiError>>,
    inner: Arc<BridgeInner>,
}

impl PendingQuery {
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Waits for the single completion of this query.
    pub async fn wait(mut self) -> Result<String, AiError> {
        match (&mut self.rx).await {
            Ok(result) => result,
            Err(_) => Err(AiError::request_failed("bridge dropped the request")),
        }
    }
}

impl Drop for PendingQuery {
    fn drop(&mut self) {
        // No-op once completed; otherwise a late reply for this id is ignored.
        if self.inner.pending.remove(&self.id).is_some() {
            tracing::debug!(target: "resilient::ai_bridge", query_id = self.id, "query abandoned by caller");
        }
    }
}

#[derive(Clone)]
pub struct AiBridge {
    inner: Arc<BridgeInner>,
}

impl AiBridge {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        let (readiness, _) = watch::channel(Readiness::Pending);
        Self {
            inner: Arc::new(BridgeInner {
                transport,
                pending: DashMap::new(),
                next_id: AtomicU64::new(1),
                readiness,
                light_model: DEFAULT_LIGHT_MODEL.to_string(),
                capable_model: DEFAULT_CAPABLE_MODEL.to_string(),
            }),
        }
    }

    /// Overrides the model names used for each tier. Call before sharing the bridge.
    pub fn with_models(self, light: &str, capable: &str) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.light_model = light.to_string();
                inner.capable_model = capable.to_string();
                inner
            }
            Err(shared) => {
                tracing::warn!(
                    target: "resilient::ai_bridge",
                    "bridge already shared; model override ignored"
                );
                return Self { inner: shared };
            }
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn options_for(&self, tier: ModelTier) -> ModelOptions {
        match tier {
            ModelTier::Light => ModelOptions::new(self.inner.light_model.clone()),
            ModelTier::Capable => ModelOptions::new(self.inner.capable_model.clone()),
        }
    }

    /// Waits for the transport to signal readiness. Once ready, the bridge stays ready.
    pub async fn initialize(&self) -> bool {
        match self.inner.transport.ready().await {
            Ok(()) => {
                self.inner.readiness.send_replace(Readiness::Ready);
                tracing::info!(target: "resilient::ai_bridge", "AI bridge ready");
                true
            }
            Err(e) => {
                self.inner.readiness.send_if_modified(|state| {
                    if *state == Readiness::Ready {
                        false
                    } else {
                        *state = Readiness::Failed;
                        true
                    }
                });
                tracing::warn!(target: "resilient::ai_bridge", error = %e, "AI bridge initialization failed");
                false
            }
        }
    }

    /// Resolves with `true` when the bridge has become ready, `false` if initialization failed.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.inner.readiness.subscribe();
        let ready = match rx.wait_for(|state| *state != Readiness::Pending).await {
            Ok(state) => *state == Readiness::Ready,
            Err(_) => false,
        };
        ready
    }

    pub fn readiness(&self) -> Readiness {
        *self.inner.readiness.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// Number of queries still waiting for a completion.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Starts a query and returns immediately. Must be called inside a Tokio runtime.
    pub fn dispatch(
        &self,
        prompt: impl Into<String>,
        options: ModelOptions,
    ) -> Result<PendingQuery, AiError> {
        if !self.is_ready() {
            return Err(AiError::NotInitialized);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(id, tx);

        let request = ChatRequest {
            query_id: id,
            prompt: prompt.into(),
            options,
        };
        tracing::debug!(
            target: "resilient::ai_bridge",
            query_id = id,
            model = %request.options.model,
            "query dispatched"
        );

        let guard = CompletionGuard {
            inner: Arc::clone(&self.inner),
            id,
            armed: true,
        };
        let transport = Arc::clone(&self.inner.transport);
        tokio::spawn(async move {
            match transport.send(request).await {
                Ok(Some(reply)) => guard.finish(reply.into_result()),
                Ok(None) => guard.disarm(),
                Err(e) => guard.finish(Err(e)),
            }
        });

        Ok(PendingQuery {
            id,
            rx,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Dispatches and waits for the result.
    pub async fn query(&self, prompt: impl Into<String>, options: ModelOptions) -> Result<String, AiError> {
        self.dispatch(prompt, options)?.wait().await
    }

    /// Resolves a query whose reply arrived out of band. Returns false for unknown or finished ids.
    pub fn deliver(&self, id: QueryId, reply: ChatReply) -> bool {
        let matched = self.inner.complete(id, reply.into_result());
        if !matched {
            tracing::debug!(target: "resilient::ai_bridge", query_id = id, "reply for unknown query ignored");
        }
        matched
    }

    /// Fails every pending query, e.g. when the underlying channel breaks.
    pub fn fail_all_pending(&self, reason: &str) -> usize {
        let ids: Vec<QueryId> = self.inner.pending.iter().map(|kv| *kv.key()).collect();
        let failed = ids
            .into_iter()
            .filter(|id| self.inner.complete(*id, Err(AiError::request_failed(reason))))
            .count();
        if failed > 0 {
            tracing::warn!(target: "resilient::ai_bridge", failed, reason, "pending queries failed by transport");
        }
        failed
    }

    /// Sends the mood log to the capable model and asks for structured recommendations.
    /// Malformed JSON degrades to the raw text.
    pub async fn analyze_mood_patterns(&self, entries: &[MoodEntry]) -> Result<MoodAnalysis, AiError> {
        let prompt = mood_analysis_prompt(entries);
        let raw = self.query(prompt, self.options_for(ModelTier::Capable)).await?;
        match parse_analysis(&raw) {
            Ok(report) => Ok(MoodAnalysis::Structured(report)),
            Err(e) => {
                tracing::debug!(target: "resilient::ai_bridge", error = %e, "analysis not in expected shape");
                Ok(MoodAnalysis::RawText(raw.trim().to_string()))
            }
        }
    }

    /// Five short strategies for `mood`; falls back to line splitting when the reply is not JSON.
    pub async fn generate_coping_strategies(
        &self,
        mood: &str,
        trigger: Option<&str>,
    ) -> Result<Vec<String>, AiError> {
        let prompt = coping_strategies_prompt(mood, trigger);
        let raw = self.query(prompt, self.options_for(ModelTier::Light)).await?;
        Ok(parse_strategy_list(&raw))
    }

    /// A 2-3 sentence journaling prompt (length is requested, not enforced).
    pub async fn generate_journal_prompt(&self, mood: &str, trigger: Option<&str>) -> Result<String, AiError> {
        let prompt = journal_prompt_request(mood, trigger);
        let raw = self.query(prompt, self.options_for(ModelTier::Light)).await?;
        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTransport;

    #[async_trait::async_trait]
    impl ChatTransport for EchoTransport {
        async fn ready(&self) -> Result<(), AiError> {
            Ok(())
        }

        async fn send(&self, request: ChatRequest) -> Result<Option<ChatReply>, AiError> {
            Ok(Some(ChatReply::Content(request.prompt)))
        }
    }

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl ChatTransport for PanickingTransport {
        async fn ready(&self) -> Result<(), AiError> {
            Ok(())
        }

        async fn send(&self, _request: ChatRequest) -> Result<Option<ChatReply>, AiError> {
            panic!("script runtime crashed");
        }
    }

    #[tokio::test]
    async fn query_before_initialize_fails() {
        let bridge = AiBridge::new(Arc::new(EchoTransport));
        let err = bridge
            .query("hello", ModelOptions::new("m"))
            .await
            .unwrap_err();
        assert_eq!(err, AiError::NotInitialized);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn echo_roundtrip_clears_pending() {
        let bridge = AiBridge::new(Arc::new(EchoTransport));
        assert!(bridge.initialize().await);
        assert!(bridge.wait_ready().await);
        let out = bridge.query("hello", ModelOptions::new("m")).await.unwrap();
        assert_eq!(out, "hello");
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn transport_panic_still_completes_once() {
        let bridge = AiBridge::new(Arc::new(PanickingTransport));
        assert!(bridge.initialize().await);
        let err = bridge.query("hello", ModelOptions::new("m")).await.unwrap_err();
        assert!(matches!(err, AiError::RequestFailed(_)));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn model_override_applies_before_sharing() {
        let bridge = AiBridge::new(Arc::new(EchoTransport)).with_models("small", "large");
        assert_eq!(bridge.options_for(ModelTier::Light).model, "small");
        assert_eq!(bridge.options_for(ModelTier::Capable).model, "large");
    }
}
