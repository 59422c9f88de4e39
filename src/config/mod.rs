//! Configuration management for Colloquy

pub mod file;

use std::path::PathBuf;

use crate::context::{ContextConfig, Keywords};
use crate::{Error, Result};

/// Colloquy configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Context tracking and prompt construction
    pub context: ContextConfig,

    /// Model endpoint settings
    pub model: ModelConfig,

    /// Directory for saved transcripts
    pub data_dir: PathBuf,
}

/// Model endpoint configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Ollama-compatible chat endpoint
    pub url: String,

    /// Model name
    pub name: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling options sent with every request
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub repeat_penalty: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/chat".to_string(),
            name: "mistral".to_string(),
            timeout_secs: 60,
            temperature: 0.7,
            top_p: 0.9,
            num_ctx: 4096,
            repeat_penalty: 1.1,
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid or a
    /// configured keywords file cannot be loaded
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups
    ///
    /// `env` maps a variable name to its value; values that fail to parse
    /// fall through to the file or default.
    ///
    /// # Errors
    ///
    /// Returns error if `max_turns` or `excerpt_chars` resolves to zero, or
    /// the keywords file is unreadable or invalid
    pub fn resolve(
        fc: file::ColloquyConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = ContextConfig::default();

        let max_turns = env("COLLOQUY_MAX_TURNS")
            .and_then(|s| s.parse().ok())
            .or(fc.context.max_turns)
            .unwrap_or(defaults.max_turns);
        if max_turns == 0 {
            return Err(Error::Config("max_turns must be at least 1".to_string()));
        }

        let excerpt_chars = fc.context.excerpt_chars.unwrap_or(defaults.excerpt_chars);
        if excerpt_chars == 0 {
            return Err(Error::Config("excerpt_chars must be at least 1".to_string()));
        }

        let keywords = match env("COLLOQUY_KEYWORDS_FILE").or(fc.context.keywords_file) {
            Some(path) => Keywords::load(&expand_home(&path))?,
            None => defaults.keywords,
        };

        let context = ContextConfig {
            max_turns,
            topic_window: env("COLLOQUY_TOPIC_WINDOW")
                .and_then(|s| s.parse().ok())
                .or(fc.context.topic_window)
                .unwrap_or(defaults.topic_window),
            follow_up_context_turns: fc
                .context
                .follow_up_context_turns
                .unwrap_or(defaults.follow_up_context_turns),
            excerpt_chars,
            preamble: env("COLLOQUY_PREAMBLE")
                .or(fc.context.preamble)
                .unwrap_or(defaults.preamble),
            keywords,
        };

        let model_defaults = ModelConfig::default();
        let model = ModelConfig {
            url: env("OLLAMA_URL")
                .or(fc.model.url)
                .unwrap_or(model_defaults.url),
            name: env("OLLAMA_MODEL")
                .or(fc.model.name)
                .unwrap_or(model_defaults.name),
            timeout_secs: env("OLLAMA_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .or(fc.model.timeout_secs)
                .unwrap_or(model_defaults.timeout_secs),
            temperature: fc.model.temperature.unwrap_or(model_defaults.temperature),
            top_p: fc.model.top_p.unwrap_or(model_defaults.top_p),
            num_ctx: fc.model.num_ctx.unwrap_or(model_defaults.num_ctx),
            repeat_penalty: fc
                .model
                .repeat_penalty
                .unwrap_or(model_defaults.repeat_penalty),
        };

        let data_dir = env("COLLOQUY_DATA_DIR")
            .or(fc.storage.data_dir)
            .map_or_else(default_data_dir, |p| expand_home(&p));

        Ok(Self {
            context,
            model,
            data_dir,
        })
    }

    /// Make sure the data directory exists
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Default data directory: `~/.local/share/colloquy` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/colloquy"),
        |d| d.data_dir().join("colloquy"),
    )
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(rest);
    }
    PathBuf::from(path)
}
