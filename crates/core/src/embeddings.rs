use crate::error::ServiceError;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Turns chunk text and questions into vectors of one fixed dimension.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;
    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;
}

/// Offline embedder hashing character trigrams into a fixed number of buckets.
///
/// Needs no model server, so a question and the chunk it paraphrases still
/// land close together as long as they share spelling.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn name(&self) -> &str {
        "char-trigram"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return Ok(vector);
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::{CharacterNgramEmbedder, Embedder};

    fn cosine(left: &[f32], right: &[f32]) -> f32 {
        left.iter().zip(right).map(|(a, b)| a * b).sum()
    }

    #[test]
    fn same_chunk_embeds_identically() {
        let embedder = CharacterNgramEmbedder::default();
        let chunk = "Invoices are due on the 1st of each month.";
        assert_eq!(embedder.embed(chunk).unwrap(), embedder.embed(chunk).unwrap());
    }

    #[test]
    fn dimension_follows_configuration() {
        let embedder = CharacterNgramEmbedder { dimensions: 32 };
        assert_eq!(embedder.embed("Late fees apply").unwrap().len(), 32);
        assert_eq!(embedder.embed("").unwrap(), vec![0.0; 32]);
    }

    #[test]
    fn question_is_closer_to_its_answer_chunk() {
        let embedder = CharacterNgramEmbedder::default();
        let question = embedder.embed("When are invoices due?").unwrap();
        let invoices = embedder.embed("Invoices are due on the 1st of each month.").unwrap();
        let pumps = embedder.embed("Hydraulic pumps are inspected every quarter.").unwrap();

        assert!(cosine(&question, &invoices) > cosine(&question, &pumps));
        let norm = cosine(&invoices, &invoices).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
