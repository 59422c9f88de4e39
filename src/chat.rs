//! Interactive text chat loop
//!
//! Drives one [`ConversationContext`] against one [`ModelClient`]. Lines
//! starting with `/` are commands; everything else goes to the model.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::Result;
use crate::context::{ConversationContext, Role, transcript};
use crate::model::ModelClient;

const HELP: &str = "\
Commands:
  /help          Show this help
  /quit          Exit (also /exit, quit, exit)
  /clear         Clear conversation history
  /status        Show conversation status
  /save [path]   Save the conversation transcript
  /load <path>   Load a saved transcript
Anything else is sent to the assistant.";

/// A slash command recognised by the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Clear,
    Status,
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
}

impl Command {
    /// Parse a trimmed input line; `None` means the line is a message
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (head, arg) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        let command = match head.to_lowercase().as_str() {
            "/quit" | "/exit" | "quit" | "exit" if arg.is_none() => Self::Quit,
            "/help" => Self::Help,
            "/clear" => Self::Clear,
            "/status" => Self::Status,
            "/save" => Self::Save(arg.map(PathBuf::from)),
            "/load" => Self::Load(arg.map(PathBuf::from)),
            _ => return None,
        };
        Some(command)
    }
}

/// Result of handling one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to show
    Idle,
    /// The assistant's reply
    Reply(String),
    /// Informational output from a command
    Notice(String),
    /// Stop the loop
    Quit,
}

/// One interactive conversation
pub struct ChatSession<M> {
    context: ConversationContext,
    model: M,
    data_dir: PathBuf,
}

impl<M: ModelClient> ChatSession<M> {
    /// Create a session; `data_dir` receives transcripts saved without a path
    #[must_use]
    pub fn new(context: ConversationContext, model: M, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            context,
            model,
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub const fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub const fn context_mut(&mut self) -> &mut ConversationContext {
        &mut self.context
    }

    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Send one message through the context manager to the model
    ///
    /// The user turn is recorded before the request; if the request fails or
    /// is abandoned it stays in history without an answer.
    ///
    /// # Errors
    ///
    /// Returns the model client's error unchanged
    pub async fn ask(&mut self, text: &str) -> Result<String> {
        let prompt = self.context.build_prompt(text);
        let reply = self.model.complete(&prompt).await?;
        self.context.record(Role::Assistant, &reply);
        Ok(reply)
    }

    /// Handle a single input line
    ///
    /// # Errors
    ///
    /// Returns model and storage errors for the caller to render
    pub async fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Idle);
        }

        let Some(command) = Command::parse(line) else {
            return self.ask(line).await.map(Outcome::Reply);
        };

        tracing::debug!(?command, "chat command");
        let outcome = match command {
            Command::Quit => Outcome::Quit,
            Command::Help => Outcome::Notice(HELP.to_string()),
            Command::Clear => {
                self.context.clear();
                Outcome::Notice("Conversation history cleared.".to_string())
            }
            Command::Status => Outcome::Notice(self.context.summary().to_string()),
            Command::Save(path) => {
                let path = path
                    .unwrap_or_else(|| transcript::default_transcript_path(&self.data_dir));
                self.context.save(&path)?;
                Outcome::Notice(format!("Conversation saved to {}", path.display()))
            }
            Command::Load(Some(path)) => {
                let turns = self.context.load(&path)?;
                Outcome::Notice(format!(
                    "Loaded {} turns from {}",
                    turns.len(),
                    path.display()
                ))
            }
            Command::Load(None) => Outcome::Notice("Usage: /load <path>".to_string()),
        };
        Ok(outcome)
    }

    /// Read lines until quit or end of input, writing replies to `out`
    ///
    /// Errors from individual lines are reported and the loop continues.
    /// Ctrl-C while waiting for the model abandons that request; Ctrl-C at
    /// the prompt ends the loop.
    ///
    /// # Errors
    ///
    /// Returns error if reading input or writing output fails
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(out, "You: ")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                writeln!(out)?;
                break;
            };

            let outcome = tokio::select! {
                outcome = self.handle_line(&line) => outcome,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("request cancelled");
                    writeln!(out, "(cancelled)")?;
                    continue;
                }
            };

            match outcome {
                Ok(Outcome::Idle) => {}
                Ok(Outcome::Reply(reply)) => writeln!(out, "AI: {reply}")?,
                Ok(Outcome::Notice(notice)) => writeln!(out, "{}", notice.trim_end())?,
                Ok(Outcome::Quit) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "chat line failed");
                    writeln!(out, "Error: {e}")?;
                }
            }
        }

        Ok(())
    }
}

/// Load a transcript into `context` if `path` is given, logging the result
///
/// # Errors
///
/// Returns the load error so the caller can decide whether to continue
pub fn preload(context: &mut ConversationContext, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        let turns = context.load(path)?;
        tracing::info!(path = %path.display(), turns = turns.len(), "resumed conversation");
    }
    Ok(())
}
