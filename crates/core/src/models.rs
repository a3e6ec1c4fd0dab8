use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded PDF as received from the upload boundary.
#[derive(Debug, Clone)]
pub struct PdfSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub name: String,
    pub checksum: String,
    pub page_count: usize,
    pub char_count: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

/// One question/answer exchange. `answer` is what gets displayed and fed back
/// into later prompts; `raw_answer` is the untouched model output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub raw_answer: String,
    pub asked_at: DateTime<Utc>,
}

/// What happens to the rest of a multi-document upload when one file fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPolicy {
    #[default]
    SkipAndReport,
    AbortBatch,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub separator: &'static str,
    pub top_k: usize,
    pub condense_question: bool,
    pub batch_policy: BatchPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 1_000,
            chunk_overlap_chars: 200,
            separator: "\n",
            top_k: 4,
            condense_question: true,
            batch_policy: BatchPolicy::SkipAndReport,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), crate::IngestError> {
        if self.chunk_max_chars == 0 {
            return Err(crate::IngestError::InvalidChunkConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap_chars >= self.chunk_max_chars {
            return Err(crate::IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                self.chunk_overlap_chars, self.chunk_max_chars
            )));
        }
        if self.separator.is_empty() {
            return Err(crate::IngestError::InvalidChunkConfig(
                "separator must not be empty".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(crate::IngestError::InvalidArgument(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SkippedPdf {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub documents: Vec<DocumentFingerprint>,
    pub skipped: Vec<SkippedPdf>,
    pub char_count: usize,
    pub chunk_count: usize,
}
