use crate::models::SkippedPdf;
use thiserror::Error;

/// Message shown by the question boundary when nothing has been processed yet.
pub const NOT_READY_MESSAGE: &str = "Please upload and process a PDF first before asking questions.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("{backend} returned an empty {what}")]
    EmptyResponse { backend: String, what: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error in {document}: {reason}")]
    PdfParse { document: String, reason: String },

    #[error("none of the uploaded pdfs could be read: {}", describe_skipped(.0))]
    UnreadableBatch(Vec<SkippedPdf>),

    #[error("nothing to index: {0}")]
    EmptyInput(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("embedding dimension {found} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("embedding service failed: {0}")]
    Service(#[from] ServiceError),
}

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("reasoning markers must not be empty")]
    EmptyMarker,

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{}", NOT_READY_MESSAGE)]
    NotReady,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IngestError),

    #[error("model service failed: {0}")]
    Service(#[from] ServiceError),
}

fn describe_skipped(skipped: &[SkippedPdf]) -> String {
    skipped
        .iter()
        .map(|item| format!("{} ({})", item.name, item.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
