//! Keyword-driven turn tagging and follow-up cue matching
//!
//! Both tables are plain data. The defaults are compiled in from
//! `assets/keywords.toml` and can be replaced by a file with the same layout.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Keyword tables shipped with the binary
const EMBEDDED_KEYWORDS: &str = include_str!("../../assets/keywords.toml");

/// On-disk layout of a keywords file
#[derive(Debug, Default, Deserialize)]
struct KeywordsFile {
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    follow_up: FollowUpSection,
}

#[derive(Debug, Default, Deserialize)]
struct FollowUpSection {
    #[serde(default)]
    cues: Vec<String>,
}

/// Mapping from tag label to the substrings that trigger it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl TagTable {
    /// Build a table from label/trigger pairs
    ///
    /// Triggers are lower-cased but not trimmed: a leading or trailing space
    /// marks a word edge. Blank triggers are dropped.
    #[must_use]
    pub fn new<L, T, I>(entries: impl IntoIterator<Item = (L, I)>) -> Self
    where
        L: Into<String>,
        T: AsRef<str>,
        I: IntoIterator<Item = T>,
    {
        let entries = entries
            .into_iter()
            .map(|(label, triggers)| {
                let triggers = triggers
                    .into_iter()
                    .map(|t| t.as_ref().to_lowercase())
                    .filter(|t| !t.trim().is_empty())
                    .collect();
                (label.into(), triggers)
            })
            .collect();
        Self { entries }
    }

    /// Classify an utterance into zero or more tags
    ///
    /// Categories are matched independently; the result carries no default
    /// label when nothing matches. The text is padded with a space on each
    /// side so word-edge triggers also match at the start and end.
    #[must_use]
    pub fn detect(&self, text: &str) -> BTreeSet<String> {
        let lower = format!(" {} ", text.to_lowercase());
        self.entries
            .iter()
            .filter(|(_, triggers)| triggers.iter().any(|t| lower.contains(t.as_str())))
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Tag labels known to this table
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Backward-referring cue phrases that mark a follow-up question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpCues {
    phrases: Vec<String>,
}

impl FollowUpCues {
    /// Build a cue list; phrases are normalized the same way input text is
    #[must_use]
    pub fn new<T: AsRef<str>>(phrases: impl IntoIterator<Item = T>) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// First cue found in `text`, if any
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.phrases
            .iter()
            .find(|cue| normalized.contains(cue.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

/// Lower-case and trim
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Tag table and follow-up cues loaded together from one keywords document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub tags: TagTable,
    pub follow_up: FollowUpCues,
}

impl Keywords {
    /// Parse a keywords document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid TOML of the expected shape
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: KeywordsFile = toml::from_str(content)?;
        Ok(Self {
            tags: TagTable::new(file.tags),
            follow_up: FollowUpCues::new(file.follow_up.cues),
        })
    }

    /// Load a keywords document from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let keywords = Self::from_toml(&content).map_err(|e| {
            Error::Config(format!("invalid keywords file {}: {e}", path.display()))
        })?;
        tracing::info!(
            path = %path.display(),
            tags = keywords.tags.entries.len(),
            cues = keywords.follow_up.phrases.len(),
            "loaded keywords file"
        );
        Ok(keywords)
    }

    /// Tables compiled into the binary
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_KEYWORDS).unwrap_or_else(|e| {
            tracing::error!(error = %e, "embedded keywords failed to parse");
            Self {
                tags: TagTable::default(),
                follow_up: FollowUpCues::default(),
            }
        })
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_keywords_parse() {
        let keywords = Keywords::from_toml(EMBEDDED_KEYWORDS).unwrap();
        assert!(!keywords.tags.is_empty());
        assert!(!keywords.follow_up.phrases().is_empty());
        assert!(keywords.tags.labels().any(|l| l == "programming"));
    }

    #[test]
    fn detect_multiple_tags() {
        let table = Keywords::embedded().tags;
        let tags = table.detect("How do I print in Python");
        assert!(tags.contains("programming"));
        assert!(tags.contains("technical"));
    }

    #[test]
    fn detect_is_case_insensitive() {
        let table = TagTable::new([("programming", ["Python"])]);
        assert_eq!(
            table.detect("PYTHON rocks"),
            BTreeSet::from(["programming".to_string()])
        );
    }

    #[test]
    fn detect_without_match_is_empty() {
        let table = Keywords::embedded().tags;
        assert!(table.detect("").is_empty());
        assert!(table.detect("zzz qqq").is_empty());
    }

    #[test]
    fn empty_triggers_are_ignored() {
        let table = TagTable::new([("everything", [""]), ("spaces", ["  "])]);
        assert!(table.detect("anything at all").is_empty());
    }

    #[test]
    fn word_edge_triggers_match_at_message_ends() {
        let table = TagTable::new([("greeting", [" hi ", " hi!"])]);
        assert!(table.detect("hi").contains("greeting"));
        assert!(table.detect("Oh hi!").contains("greeting"));
        assert!(table.detect("this is fine").is_empty());
    }

    #[test]
    fn embedded_greetings_need_whole_words() {
        let table = Keywords::embedded().tags;
        for text in ["Hi", "Hi!", "hey", "Hey, you there?", "Hi, I'm John", "hello"] {
            assert!(table.detect(text).contains("greeting"), "{text:?}");
        }
        for text in ["They said the build is fine", "this is it", "whey protein"] {
            assert!(!table.detect(text).contains("greeting"), "{text:?}");
        }
    }

    #[test]
    fn embedded_rust_needs_whole_word() {
        let table = Keywords::embedded().tags;
        for text in [
            "I'm learning Rust",
            "Rust, mostly",
            "is rust fast?",
            "rust's borrow checker",
        ] {
            assert!(table.detect(text).contains("programming"), "{text:?}");
        }
        for text in ["I trust you", "the gate is rusty", "frustrating day"] {
            assert!(!table.detect(text).contains("programming"), "{text:?}");
        }
    }

    #[test]
    fn cues_match_normalized_text() {
        let cues = FollowUpCues::new(["  The Previous One "]);
        assert_eq!(cues.phrases(), ["the previous one"]);
        assert_eq!(
            cues.find("  What about THE PREVIOUS ONE?  "),
            Some("the previous one")
        );
        assert!(!cues.matches("something new"));
    }

    #[test]
    fn keywords_file_sections_are_optional() {
        let keywords = Keywords::from_toml("[tags]\nweather = [\"rain\"]\n").unwrap();
        assert!(keywords.follow_up.phrases().is_empty());
        assert!(keywords.tags.detect("Rain again").contains("weather"));
    }

    #[test]
    fn load_reports_bad_file_as_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.toml");
        std::fs::write(&path, "tags = 3").unwrap();
        assert!(matches!(Keywords::load(&path), Err(Error::Config(_))));
    }
}
