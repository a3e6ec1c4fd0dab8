use crate::traits::VectorIndex;
use crate::{IngestError, ScoredChunk, TextChunk};

/// Exact k-NN over an in-process list of chunk vectors, ranked by cosine similarity.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    entries: Vec<(TextChunk, Vec<f32>)>,
    dimensions: Option<usize>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn insert(&mut self, chunk: TextChunk, embedding: Vec<f32>) -> Result<(), IngestError> {
        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                return Err(IngestError::DimensionMismatch {
                    expected,
                    found: embedding.len(),
                });
            }
            None => {
                if embedding.is_empty() {
                    return Err(IngestError::InvalidArgument(format!(
                        "chunk {} has an empty embedding",
                        chunk.chunk_index
                    )));
                }
                self.dimensions = Some(embedding.len());
            }
            _ => {}
        }

        self.entries.push((chunk, embedding));
        Ok(())
    }
}

impl VectorIndex for MemoryIndex {
    fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IngestError> {
        if let Some(expected) = self.dimensions {
            if expected != query_vector.len() {
                return Err(IngestError::DimensionMismatch {
                    expected,
                    found: query_vector.len(),
                });
            }
        }

        let mut hits = self
            .entries
            .iter()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(query_vector, embedding),
            })
            .collect::<Vec<_>>();

        hits.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then(left.chunk.chunk_index.cmp(&right.chunk.chunk_index))
        });
        hits.truncate(k);

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
