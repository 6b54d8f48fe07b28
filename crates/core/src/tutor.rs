//! Chat Orchestration
//!
//! This module implements the single operation of the teaching service: send
//! a learner's question to the model together with the recent conversation,
//! then turn the model's text reply into a validated [`StructuredResponse`].
//!
//! Conversations are scoped by a session key. Each stored session's history
//! sits behind its own async mutex, held for the whole exchange, so two
//! requests for the same session run one after the other and never see each
//! other's half-finished turns. Different sessions run in parallel.
//!
//! A session only enters the store once its first exchange is recorded.
//! The store is bounded: sessions idle for longer than the configured TTL
//! are dropped, and when it is full the least recently used one is evicted.

use crate::{
    history::{ConversationHistory, ConversationTurn, DEFAULT_HISTORY_LIMIT},
    lesson::StructuredResponse,
    llm_client::{LLMClient, ModelRequest},
    reply::{ParsedReply, clean_reply, parse_reply},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Session used by callers that do not supply a key of their own.
pub const DEFAULT_SESSION: &str = "default";

/// Sessions kept at most, unless configured otherwise.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// How long a session may sit unused before it is dropped, unless configured otherwise.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Failures of a single chat exchange.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,
    /// The model answered with something that is not JSON.
    #[error("the model's reply was not valid JSON")]
    BadUpstreamFormat { raw: String },
    /// The reply was JSON but not a `StructuredResponse`.
    #[error("the model's reply did not match the expected structure: {0}")]
    InvalidShape(#[source] serde_json::Error),
    /// The model call itself failed (network, quota, auth, empty reply).
    #[error("model call failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

/// Bounds of a [`ConversationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Turns kept per session.
    pub history_limit: usize,
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }
}

struct SessionEntry {
    history: Arc<Mutex<ConversationHistory>>,
    last_used: Instant,
}

/// Conversation histories keyed by session.
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    limits: StoreLimits,
}

impl ConversationStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limits,
        }
    }

    /// Returns the stored history for `key` and marks it as used. Never
    /// inserts; a session idle past the TTL is dropped and reported absent.
    pub async fn lookup(&self, key: &str) -> Option<Arc<Mutex<ConversationHistory>>> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let expired = match sessions.get_mut(key) {
            Some(entry) if now.duration_since(entry.last_used) < self.limits.idle_ttl => {
                entry.last_used = now;
                return Some(entry.history.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(session = %key, "Dropping idle session");
            sessions.remove(key);
        }
        None
    }

    /// Stores a history built outside the store for a session's first exchange.
    ///
    /// If a concurrent first exchange already stored the session, the new
    /// turns are appended to that history instead.
    pub async fn adopt(&self, key: &str, history: Arc<Mutex<ConversationHistory>>) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        if let Some(entry) = sessions.get_mut(key) {
            entry.last_used = now;
            let existing = entry.history.clone();
            drop(sessions);
            let turns = history.lock().await.snapshot();
            let mut existing = existing.lock().await;
            for pair in turns.chunks_exact(2) {
                existing.record_exchange(pair[0].content.clone(), pair[1].content.clone());
            }
            return;
        }

        self.evict(&mut sessions, now);
        sessions.insert(
            key.to_string(),
            SessionEntry {
                history,
                last_used: now,
            },
        );
    }

    /// Makes room for one more session: drops idle sessions, then the least
    /// recently used ones while the store is full.
    fn evict(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let ttl = self.limits.idle_ttl;
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < ttl);

        while !sessions.is_empty() && sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!(session = %key, "Evicting least recently used session");
                sessions.remove(&key);
            }
        }
    }

    /// A copy of the turns currently held for `key`. Unknown keys are empty.
    pub async fn snapshot(&self, key: &str) -> Vec<ConversationTurn> {
        let history = self
            .sessions
            .lock()
            .await
            .get(key)
            .map(|entry| entry.history.clone());
        match history {
            Some(history) => history.lock().await.snapshot(),
            None => Vec::new(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

/// The teaching assistant: one model, one system prompt, many conversations.
pub struct TutorService {
    llm_client: Arc<dyn LLMClient>,
    system_prompt: String,
    store: ConversationStore,
}

impl TutorService {
    pub fn new(llm_client: Arc<dyn LLMClient>, system_prompt: String, limits: StoreLimits) -> Self {
        Self {
            llm_client,
            system_prompt,
            store: ConversationStore::new(limits),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Answers `message` within the conversation identified by `session`.
    ///
    /// History is only recorded once the reply parses as JSON; a reply that
    /// parses but has the wrong shape is still recorded before the shape
    /// error is returned. Failed exchanges leave the store untouched.
    #[instrument(name = "handle_chat", skip_all, fields(session = %session))]
    pub async fn handle_chat(
        &self,
        session: &str,
        message: &str,
    ) -> Result<StructuredResponse, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (history, is_new) = match self.store.lookup(session).await {
            Some(history) => (history, false),
            None => (
                Arc::new(Mutex::new(ConversationHistory::new(
                    self.store.limits().history_limit,
                ))),
                true,
            ),
        };
        let mut turns = history.lock().await;

        let request = ModelRequest {
            system_prompt: self.system_prompt.clone(),
            history: turns.snapshot(),
            message: message.to_string(),
        };
        info!(context_turns = request.history.len(), "Sending message to model");

        let raw = self.llm_client.complete(request).await?;
        let cleaned = clean_reply(&raw);

        let value = match parse_reply(&cleaned) {
            ParsedReply::Json(value) => value,
            ParsedReply::Malformed { raw } => {
                warn!(reply_len = raw.len(), "Model reply was not valid JSON");
                return Err(ChatError::BadUpstreamFormat { raw });
            }
        };

        turns.record_exchange(message, cleaned);
        drop(turns);
        if is_new {
            self.store.adopt(session, history).await;
        }

        StructuredResponse::from_value(value).map_err(|e| {
            error!(error = %e, "Model reply failed shape validation");
            ChatError::InvalidShape(e)
        })
    }
}
