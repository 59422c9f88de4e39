//! Conversation context for a single chat session

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::prompt::{ContextLine, EnhancedPrompt};
use super::tags::Keywords;
use super::transcript;
use super::turn::{History, Role, Turn};
use crate::Result;

/// Default persona preamble placed at the top of every prompt
pub const DEFAULT_PREAMBLE: &str = "You are a friendly voice assistant. Answer naturally and \
concisely, and refer back to earlier parts of the conversation when it is relevant.";

/// Number of recent turns shown in a summary
const SUMMARY_RECENT_TURNS: usize = 3;

/// Characters kept per turn in a summary
const SUMMARY_EXCERPT_CHARS: usize = 50;

/// Tuning for context tracking and prompt construction
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Maximum raw turns retained (user and assistant turns each count one)
    pub max_turns: usize,
    /// Number of recent turns considered when picking the current topic
    pub topic_window: usize,
    /// Turns quoted in the prior-context block of a follow-up (1 to 3)
    pub follow_up_context_turns: usize,
    /// Characters kept per quoted turn
    pub excerpt_chars: usize,
    /// Persona/constraints text placed first in every prompt
    pub preamble: String,
    /// Tag table and follow-up cues
    pub keywords: Keywords,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_turns: 30,
            topic_window: 4,
            follow_up_context_turns: 3,
            excerpt_chars: 160,
            preamble: DEFAULT_PREAMBLE.to_string(),
            keywords: Keywords::embedded(),
        }
    }
}

/// Tracks recent turns and builds model-facing prompts
///
/// Owned by the conversation loop that drives it; every read accessor
/// returns an owned snapshot.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    config: ContextConfig,
    history: History,
    topics_discussed: BTreeSet<String>,
}

impl ConversationContext {
    /// Create an empty context
    #[must_use]
    pub fn new(config: ContextConfig) -> Self {
        let history = History::new(config.max_turns);
        Self {
            config,
            history,
            topics_discussed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Append a turn with freshly detected tags, evicting the oldest past the bound
    pub fn record(&mut self, role: Role, text: &str) -> Turn {
        let tags = self.detect_tags(text);
        self.push_turn(role, text, tags)
    }

    fn push_turn(&mut self, role: Role, text: &str, tags: BTreeSet<String>) -> Turn {
        let mut turn = Turn::new(role, text, tags);
        self.topics_discussed.extend(turn.tags.iter().cloned());

        let evicted = self.history.push(turn.clone());
        if let Some(stored) = self.history.last() {
            turn.timestamp = stored.timestamp;
        }
        tracing::debug!(
            %role,
            tags = ?turn.tags,
            len = self.history.len(),
            evicted,
            "recorded turn"
        );
        turn
    }

    /// Forget every turn and topic
    pub fn clear(&mut self) {
        let dropped = self.history.len();
        self.history.clear();
        self.topics_discussed.clear();
        tracing::info!(dropped, "conversation history cleared");
    }

    /// Tags for `text` under the configured keyword table
    #[must_use]
    pub fn detect_tags(&self, text: &str) -> BTreeSet<String> {
        self.config.keywords.tags.detect(text)
    }

    /// Whether `text` refers back to earlier turns
    ///
    /// Requires both a cue phrase and at least one recorded turn.
    #[must_use]
    pub fn is_follow_up(&self, text: &str) -> bool {
        if self.history.is_empty() {
            return false;
        }
        match self.config.keywords.follow_up.find(text) {
            Some(cue) => {
                tracing::trace!(cue, "follow-up cue matched");
                true
            }
            None => false,
        }
    }

    /// Most frequent tag in the recent window
    ///
    /// Ties go to the tag on the most recent turn; among tied tags on that
    /// same turn the alphabetically first wins.
    #[must_use]
    pub fn current_topic(&self) -> Option<String> {
        let window: Vec<&Turn> = self.history.tail(self.config.topic_window).collect();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for turn in &window {
            for tag in &turn.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let best = counts.values().copied().max()?;
        window
            .iter()
            .rev()
            .flat_map(|turn| turn.tags.iter())
            .find(|tag| counts.get(tag.as_str()) == Some(&best))
            .cloned()
    }

    /// Record `user_text` and return the prompt to send to the model
    ///
    /// Exactly one turn is appended. The caller records the assistant reply
    /// once it arrives.
    pub fn build_prompt(&mut self, user_text: &str) -> String {
        self.build_prompt_parts(user_text).render()
    }

    /// Like [`Self::build_prompt`] but returns the unrendered segments
    pub fn build_prompt_parts(&mut self, user_text: &str) -> EnhancedPrompt {
        let tags = self.detect_tags(user_text);
        let follow_up = self.is_follow_up(user_text);

        let prior_context = follow_up.then(|| {
            let count = self.config.follow_up_context_turns.clamp(1, 3);
            self.history
                .tail(count)
                .map(|turn| ContextLine::from_turn(turn, self.config.excerpt_chars))
                .collect::<Vec<_>>()
        });

        self.push_turn(Role::User, user_text, tags);
        let topic = self.current_topic();

        tracing::debug!(follow_up, topic = ?topic, "built prompt");
        EnhancedPrompt::assemble(&self.config.preamble, prior_context, topic, user_text)
    }

    /// Snapshot of every turn, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.history.to_vec()
    }

    /// Snapshot of the last `count` turns, oldest first
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<Turn> {
        self.history.tail(count).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Every tag seen since the session started or was last cleared
    #[must_use]
    pub fn topics_discussed(&self) -> Vec<String> {
        self.topics_discussed.iter().cloned().collect()
    }

    /// Human-readable status of the session
    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            total_turns: self.history.len(),
            topics: self.topics_discussed(),
            last_turn_at: self.history.last().map(|t| t.timestamp),
            recent: self
                .history
                .tail(SUMMARY_RECENT_TURNS)
                .map(|t| ContextLine::from_turn(t, SUMMARY_EXCERPT_CHARS))
                .collect(),
        }
    }

    /// Persist the history to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the transcript cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        transcript::save(path, &self.history.to_vec())
    }

    /// Replace the history with the transcript at `path`
    ///
    /// Stored tags are kept as-is. On any error the current history is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `CorruptTranscript` if the transcript is invalid and `Io` if it
    /// cannot be read
    pub fn load(&mut self, path: &Path) -> Result<Vec<Turn>> {
        let turns = transcript::load(path)?;

        if turns.len() > self.config.max_turns {
            tracing::warn!(
                path = %path.display(),
                stored = turns.len(),
                max_turns = self.config.max_turns,
                "transcript longer than history bound, keeping most recent turns"
            );
        }

        self.restore(turns);
        Ok(self.history())
    }

    /// Replace the history with previously recorded turns
    ///
    /// Tags are taken from the turns, not re-detected. Turns past the bound
    /// are evicted oldest first.
    pub fn restore(&mut self, turns: Vec<Turn>) {
        self.history = History::from_turns(turns, self.config.max_turns);
        self.topics_discussed = self
            .history
            .iter()
            .flat_map(|t| t.tags.iter().cloned())
            .collect();
    }
}

/// Snapshot of session state for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub total_turns: usize,
    pub topics: Vec<String>,
    pub last_turn_at: Option<DateTime<Utc>>,
    /// Last few turns, truncated
    pub recent: Vec<ContextLine>,
}

impl fmt::Display for ContextSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Turns: {}", self.total_turns)?;
        if self.topics.is_empty() {
            writeln!(f, "Topics: none")?;
        } else {
            writeln!(f, "Topics: {}", self.topics.join(", "))?;
        }
        if let Some(at) = self.last_turn_at {
            writeln!(f, "Last turn: {}", at.to_rfc3339())?;
        }
        if !self.recent.is_empty() {
            writeln!(f, "Recent turns:")?;
            for line in &self.recent {
                writeln!(f, "  {}: {}", line.role, line.text)?;
            }
        }
        Ok(())
    }
}
