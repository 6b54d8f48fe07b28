use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Number of turns kept per conversation unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Drops turns from the front until at most `limit` remain.
pub fn keep_last<T>(turns: &mut VecDeque<T>, limit: usize) {
    while turns.len() > limit {
        turns.pop_front();
    }
}

/// A rolling window of the most recent turns of one conversation.
///
/// Turns only enter through [`ConversationHistory::record_exchange`], so the
/// window always holds whole user/model pairs as long as the limit is even.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    limit: usize,
}

impl ConversationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(limit + 2),
            limit,
        }
    }

    /// Appends a user turn and the model's reply, then trims to the limit.
    pub fn record_exchange(&mut self, user: impl Into<String>, model: impl Into<String>) {
        self.turns.push_back(ConversationTurn::user(user));
        self.turns.push_back(ConversationTurn::model(model));
        keep_last(&mut self.turns, self.limit);
    }

    /// The current window as an owned list, oldest first.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
