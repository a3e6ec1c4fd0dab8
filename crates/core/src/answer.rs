use crate::CleanerError;
use regex::Regex;
use std::sync::LazyLock;

pub const REASONING_OPEN: &str = "<think>";
pub const REASONING_CLOSE: &str = "</think>";

static DEFAULT_CLEANER: LazyLock<AnswerCleaner> = LazyLock::new(|| {
    AnswerCleaner::with_markers(REASONING_OPEN, REASONING_CLOSE)
        .expect("built-in reasoning markers form a valid pattern")
});

/// Turns raw model output into displayable text: reasoning spans are dropped,
/// blank-line runs collapse to a single blank line, outer whitespace is trimmed.
#[derive(Debug, Clone)]
pub struct AnswerCleaner {
    reasoning: Regex,
    blank_lines: Regex,
}

impl AnswerCleaner {
    pub fn with_markers(open: &str, close: &str) -> Result<Self, CleanerError> {
        if open.is_empty() || close.is_empty() {
            return Err(CleanerError::EmptyMarker);
        }

        Ok(Self {
            reasoning: Regex::new(&format!(
                "(?s){}.*?{}",
                regex::escape(open),
                regex::escape(close)
            ))?,
            blank_lines: Regex::new(r"\n\s*\n")?,
        })
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        // removing one span can splice a new marker pair together
        loop {
            let stripped = self.reasoning.replace_all(&text, "");
            if stripped.len() == text.len() {
                break;
            }
            text = stripped.into_owned();
        }

        self.blank_lines
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }
}

impl Default for AnswerCleaner {
    fn default() -> Self {
        DEFAULT_CLEANER.clone()
    }
}

pub fn clean_answer(raw: &str) -> String {
    DEFAULT_CLEANER.clean(raw)
}
