//! Colloquy - Conversation context manager for chat front-ends
//!
//! This library provides the core functionality for a text/voice chat
//! front-end that talks to a language model:
//! - Bounded conversation history with keyword tagging
//! - Follow-up detection and topic continuity
//! - Enhanced prompt construction
//! - Checksummed transcript save/load
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Chat loop / CLI                │
//! └──────────────────────┬──────────────────────┘
//!                        │ user text / reply
//! ┌──────────────────────▼──────────────────────┐
//! │           ConversationContext               │
//! │  History  │  Tags  │  Follow-up  │  Prompt  │
//! └──────────────────────┬──────────────────────┘
//!                        │ enhanced prompt
//! ┌──────────────────────▼──────────────────────┐
//! │        ModelClient (Ollama /api/chat)       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod model;

pub use chat::{ChatSession, Command, Outcome};
pub use config::{Config, ModelConfig};
pub use context::{
    ContextConfig, ContextSummary, ConversationContext, EnhancedPrompt, FollowUpCues, History,
    Keywords, PromptSegment, Role, TagTable, Turn,
};
pub use error::{Error, Result};
pub use model::{ModelClient, OllamaClient};
