use crate::embeddings::Embedder;
use crate::stores::MemoryIndex;
use crate::{IngestError, TextChunk};
use tracing::{debug, info};

/// Embeds every chunk and loads the vectors into a fresh [`MemoryIndex`].
pub fn build_index(chunks: &[TextChunk], embedder: &dyn Embedder) -> Result<MemoryIndex, IngestError> {
    if chunks.is_empty() {
        return Err(IngestError::EmptyInput(
            "cannot build an index over zero chunks".to_string(),
        ));
    }

    let mut index = MemoryIndex::new();
    for chunk in chunks {
        let embedding = embedder.embed(&chunk.text)?;
        debug!(chunk_index = chunk.chunk_index, dimensions = embedding.len(), "embedded chunk");
        index.insert(chunk.clone(), embedding)?;
    }

    info!(
        embedder = embedder.name(),
        chunk_count = chunks.len(),
        dimensions = index.dimensions().unwrap_or_default(),
        "vector index built"
    );

    Ok(index)
}
