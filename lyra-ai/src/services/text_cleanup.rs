//! Removal of boilerplate closing phrases from model output

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Blank line runs, including lines holding only whitespace
static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line regex is valid"));

/// Strips configured closing phrases and collapses blank lines
#[derive(Debug, Clone)]
pub struct ClosingPhraseFilter {
    patterns: Vec<Regex>,
}

impl ClosingPhraseFilter {
    /// Compile patterns case-insensitively
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| RegexBuilder::new(p.as_ref()).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Filter that only trims and collapses blank lines
    pub fn passthrough() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Trim, remove every closing-phrase match, collapse blank-line runs to a
    /// single blank line, trim again
    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = text.trim().to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        BLANK_LINE_RUN
            .replace_all(&cleaned, "\n\n")
            .trim()
            .to_string()
    }
}
