//! Turns and the bounded turn history

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Lowercase label used in prompts and transcripts
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Topic labels inferred when the turn was created
    pub tags: BTreeSet<String>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            role,
            text: text.into(),
            tags,
            timestamp: Utc::now(),
        }
    }

    /// Text cut to at most `max_chars` characters, with a trailing `...` when cut
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        truncate_chars(&self.text, max_chars)
    }
}

/// Truncate on a character boundary, appending `...` when anything was dropped
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Ordered turn sequence, oldest first, never longer than `max_turns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl History {
    /// Create an empty history bounded to `max_turns` raw turns
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns.min(64)),
            max_turns,
        }
    }

    /// Build a history from turns in order, evicting the oldest past the bound
    #[must_use]
    pub fn from_turns(turns: Vec<Turn>, max_turns: usize) -> Self {
        let mut history = Self::new(max_turns);
        for turn in turns {
            history.push(turn);
        }
        history
    }

    /// Append a turn, returning how many old turns were evicted
    ///
    /// The new turn's timestamp is raised to the previous turn's if the
    /// clock went backwards, so timestamps never decrease along the history.
    pub fn push(&mut self, mut turn: Turn) -> usize {
        if let Some(last) = self.turns.back()
            && turn.timestamp < last.timestamp
        {
            turn.timestamp = last.timestamp;
        }

        self.turns.push_back(turn);

        let mut evicted = 0;
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Remove every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Most recent turn
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Turn> + ExactSizeIterator {
        self.turns.iter()
    }

    /// The last `count` turns, oldest first
    pub fn tail(&self, count: usize) -> impl DoubleEndedIterator<Item = &Turn> {
        self.turns.iter().skip(self.turns.len().saturating_sub(count))
    }

    /// Owned copy of every turn, oldest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }
}
