pub mod answer;
pub mod chunking;
pub mod conversation;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod ollama;
pub mod prompts;
pub mod session;
pub mod store;
pub mod stores;
pub mod traits;

pub use answer::{clean_answer, AnswerCleaner};
pub use chunking::{build_chunks, split_text, ChunkingConfig};
pub use conversation::{ConversationEngine, Reply};
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, CleanerError, IngestError, ServiceError, NOT_READY_MESSAGE};
pub use extractor::{extract_documents, ExtractedBatch, LopdfExtractor, PdfExtractor};
pub use ingest::{digest_bytes, discover_pdf_files, load_pdf_sources};
pub use models::{
    BatchPolicy, DocumentFingerprint, PageText, PdfSource, PipelineOptions, ProcessSummary,
    ScoredChunk, SkippedPdf, TextChunk, Turn,
};
pub use ollama::{OllamaClient, OllamaConfig, OllamaEmbedder, OllamaModel};
pub use session::ChatSession;
pub use store::build_index;
pub use stores::MemoryIndex;
pub use traits::{LanguageModel, VectorIndex};
