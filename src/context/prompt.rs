//! Enhanced prompt assembly
//!
//! A prompt is a short list of segments rendered in a fixed order:
//! preamble, prior context, topic hint, then the user's own words.

use std::fmt;

use super::turn::{Role, Turn};

/// One condensed turn inside a prior-context block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    pub role: Role,
    pub text: String,
}

impl ContextLine {
    /// Condense a recorded turn to at most `max_chars` characters
    #[must_use]
    pub fn from_turn(turn: &Turn, max_chars: usize) -> Self {
        Self {
            role: turn.role,
            text: turn.excerpt(max_chars),
        }
    }
}

/// A piece of the model-facing prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSegment {
    /// Persona and constraints from configuration
    Preamble(String),
    /// Recent turns, most recent last, included for follow-up questions
    PriorContext(Vec<ContextLine>),
    /// Dominant tag of the recent window
    TopicHint(String),
    /// The raw user message
    Instruction(String),
}

impl PromptSegment {
    /// Position of this segment kind in a rendered prompt
    const fn rank(&self) -> u8 {
        match self {
            Self::Preamble(_) => 0,
            Self::PriorContext(_) => 1,
            Self::TopicHint(_) => 2,
            Self::Instruction(_) => 3,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Preamble(text) | Self::Instruction(text) => text.clone(),
            Self::PriorContext(lines) => {
                let body: Vec<String> = lines
                    .iter()
                    .map(|l| format!("<{}>\n{}\n</{}>", l.role, l.text, l.role))
                    .collect();
                format!("<prior-context>\n{}\n</prior-context>", body.join("\n"))
            }
            Self::TopicHint(topic) => format!("Current topic: {topic}"),
        }
    }
}

/// Assembled prompt, inspectable per segment before rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedPrompt {
    segments: Vec<PromptSegment>,
}

impl EnhancedPrompt {
    /// Assemble a prompt from its parts
    ///
    /// Empty preambles and empty context blocks are skipped.
    #[must_use]
    pub fn assemble(
        preamble: &str,
        prior_context: Option<Vec<ContextLine>>,
        topic: Option<String>,
        instruction: &str,
    ) -> Self {
        let mut segments = Vec::with_capacity(4);

        if !preamble.trim().is_empty() {
            segments.push(PromptSegment::Preamble(preamble.trim().to_string()));
        }
        if let Some(lines) = prior_context.filter(|l| !l.is_empty()) {
            segments.push(PromptSegment::PriorContext(lines));
        }
        if let Some(topic) = topic {
            segments.push(PromptSegment::TopicHint(topic));
        }
        segments.push(PromptSegment::Instruction(instruction.to_string()));

        debug_assert!(segments.is_sorted_by_key(PromptSegment::rank));
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[PromptSegment] {
        &self.segments
    }

    /// Whether a prior-context block is present
    #[must_use]
    pub fn has_prior_context(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, PromptSegment::PriorContext(_)))
    }

    /// Topic carried by the hint segment
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            PromptSegment::TopicHint(topic) => Some(topic.as_str()),
            _ => None,
        })
    }

    /// Render segments separated by blank lines
    #[must_use]
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(PromptSegment::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for EnhancedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
