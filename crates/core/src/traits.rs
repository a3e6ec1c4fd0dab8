use crate::{IngestError, ScoredChunk, ServiceError};

/// Nearest-neighbour lookup over embedded chunks.
pub trait VectorIndex: Send + Sync {
    /// Returns at most `k` chunks, closest first.
    fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IngestError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Blocks until the model has produced a full completion for `prompt`.
    fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}
