//! Conversation context tracking
//!
//! Keeps the bounded turn history for one chat session and turns each user
//! message into an enhanced prompt:
//! - keyword tagging of every turn
//! - follow-up detection against recent history
//! - topic continuity over a recent window
//! - checksummed transcript save/load

mod conversation;
mod prompt;
mod tags;
pub mod transcript;
mod turn;

pub use conversation::{ContextConfig, ContextSummary, ConversationContext, DEFAULT_PREAMBLE};
pub use prompt::{ContextLine, EnhancedPrompt, PromptSegment};
pub use tags::{FollowUpCues, Keywords, TagTable};
pub use turn::{History, Role, Turn};
