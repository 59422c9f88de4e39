//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use colloquy::{
    ContextConfig, ConversationContext, Error, FollowUpCues, Keywords, ModelClient, TagTable,
};

/// Context with the embedded keyword tables and no preamble
#[must_use]
pub fn default_context(max_turns: usize) -> ConversationContext {
    ConversationContext::new(ContextConfig {
        max_turns,
        preamble: String::new(),
        ..ContextConfig::default()
    })
}

/// Context with minimal fixture tables
#[must_use]
pub fn fixture_context(
    tags: &[(&str, &[&str])],
    cues: &[&str],
    preamble: &str,
) -> ConversationContext {
    ConversationContext::new(ContextConfig {
        preamble: preamble.to_string(),
        keywords: Keywords {
            tags: TagTable::new(
                tags.iter()
                    .map(|(label, triggers)| (*label, triggers.iter().copied())),
            ),
            follow_up: FollowUpCues::new(cues.iter().copied()),
        },
        ..ContextConfig::default()
    })
}

/// Model client that answers from a script and remembers every prompt
#[derive(Default)]
pub struct StubModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    /// Answer with `replies` in order; afterwards echo a fixed reply
    #[must_use]
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next request with a model error
    pub fn fail_next(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_front(Err(message.to_string()));
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn complete(&self, prompt: &str) -> colloquy::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(Error::Model(message)),
            None => Ok("ok".to_string()),
        }
    }
}
