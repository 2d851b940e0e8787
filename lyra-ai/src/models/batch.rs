//! Batches of lyric lines and their analysis results

/// Contiguous group of lyric lines sent to the analyzer as one request
///
/// `index` is 1-based and contiguous within a song. Each line is non-empty and
/// already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub lines: Vec<String>,
}

impl Batch {
    pub fn new(index: usize, lines: Vec<String>) -> Self {
        Self { index, lines }
    }

    /// Lines joined with `\n`, as submitted to the analyzer
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Outcome of analysing one batch
///
/// A failed batch keeps its slot in the song output as a sentinel line so the
/// reader can see exactly which lines are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// Cleaned completion text
    Analyzed(String),
    /// Every attempt failed; rendered as the failure sentinel
    Failed { index: usize },
}

impl AnalysisResult {
    /// Deterministic placeholder text for a failed batch
    pub fn failure_sentinel(index: usize) -> String {
        format!("Error: Unable to process batch {}.", index)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisResult::Failed { .. })
    }

    /// Text written to the output file for this batch
    pub fn into_text(self) -> String {
        match self {
            AnalysisResult::Analyzed(text) => text,
            AnalysisResult::Failed { index } => Self::failure_sentinel(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_uses_newlines() {
        let batch = Batch::new(1, vec!["a".into(), "b".into()]);
        assert_eq!(batch.joined(), "a\nb");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_failure_sentinel_names_batch() {
        let result = AnalysisResult::Failed { index: 7 };
        assert!(result.is_failure());
        assert_eq!(result.into_text(), "Error: Unable to process batch 7.");
    }
}
