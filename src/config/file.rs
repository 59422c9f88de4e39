//! TOML configuration file loading
//!
//! Supports `~/.config/colloquy/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ColloquyConfigFile {
    /// Context tracking and prompt construction
    #[serde(default)]
    pub context: ContextFileConfig,

    /// Model endpoint
    #[serde(default)]
    pub model: ModelFileConfig,

    /// Where transcripts are kept
    #[serde(default)]
    pub storage: StorageFileConfig,
}

/// Context configuration
#[derive(Debug, Default, Deserialize)]
pub struct ContextFileConfig {
    /// History bound in raw turns
    pub max_turns: Option<usize>,

    /// Recent turns considered for the current topic
    pub topic_window: Option<usize>,

    /// Turns quoted for follow-up questions
    pub follow_up_context_turns: Option<usize>,

    /// Characters kept per quoted turn
    pub excerpt_chars: Option<usize>,

    /// Persona preamble
    pub preamble: Option<String>,

    /// Replacement keywords file (same layout as the embedded one)
    pub keywords_file: Option<String>,
}

/// Model endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct ModelFileConfig {
    /// Chat endpoint (e.g. "http://localhost:11434/api/chat")
    pub url: Option<String>,

    /// Model name (e.g. "mistral")
    pub name: Option<String>,

    pub timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub num_ctx: Option<u32>,
    pub repeat_penalty: Option<f32>,
}

/// Storage configuration
#[derive(Debug, Default, Deserialize)]
pub struct StorageFileConfig {
    /// Directory for saved transcripts
    pub data_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ColloquyConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> ColloquyConfigFile {
    config_file_path().map_or_else(ColloquyConfigFile::default, |path| {
        load_config_file_from(&path)
    })
}

/// Load a TOML config file from an explicit path
///
/// Returns `ColloquyConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file_from(path: &Path) -> ColloquyConfigFile {
    if !path.exists() {
        return ColloquyConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ColloquyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ColloquyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/colloquy/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("colloquy").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let fc: ColloquyConfigFile = toml::from_str(
            r#"
            [context]
            max_turns = 12

            [model]
            name = "llama3.1"
            "#,
        )
        .unwrap();

        assert_eq!(fc.context.max_turns, Some(12));
        assert_eq!(fc.context.topic_window, None);
        assert_eq!(fc.model.name.as_deref(), Some("llama3.1"));
        assert!(fc.storage.data_dir.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("nope.toml"));
        assert!(fc.context.max_turns.is_none());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[context\nmax_turns = ").unwrap();
        let fc = load_config_file_from(&path);
        assert!(fc.context.max_turns.is_none());
    }
}
