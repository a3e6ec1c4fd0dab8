use crate::chunking::{build_chunks, ChunkingConfig};
use crate::conversation::{ConversationEngine, Reply};
use crate::embeddings::Embedder;
use crate::extractor::{extract_documents, PdfExtractor};
use crate::store::build_index;
use crate::traits::LanguageModel;
use crate::{
    ChatError, DocumentFingerprint, IngestError, PdfSource, PipelineOptions, ProcessSummary, Turn,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything one user conversation owns: the capabilities used to build an
/// index and, once a batch has been processed, the engine bound to it.
pub struct ChatSession {
    id: Uuid,
    options: PipelineOptions,
    extractor: Box<dyn PdfExtractor>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    engine: Option<ConversationEngine>,
    documents: Vec<DocumentFingerprint>,
}

impl ChatSession {
    pub fn new(
        options: PipelineOptions,
        extractor: Box<dyn PdfExtractor>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self, IngestError> {
        options.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            options,
            extractor,
            embedder,
            llm,
            engine: None,
            documents: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn documents(&self) -> &[DocumentFingerprint] {
        &self.documents
    }

    pub fn history(&self) -> &[Turn] {
        self.engine
            .as_ref()
            .map(ConversationEngine::history)
            .unwrap_or_default()
    }

    /// Extracts, chunks and indexes the upload, then binds a fresh engine.
    ///
    /// Any previous index and its history are dropped only once the new index
    /// is built; a failed batch leaves the session as it was.
    pub fn process(&mut self, sources: &[PdfSource]) -> Result<ProcessSummary, IngestError> {
        if sources.is_empty() {
            return Err(IngestError::EmptyInput("no pdf files were uploaded".to_string()));
        }

        let batch = extract_documents(
            self.extractor.as_ref(),
            sources,
            self.options.batch_policy,
        )?;
        if batch.documents.is_empty() && !batch.skipped.is_empty() {
            warn!(session = %self.id, skipped = batch.skipped.len(), "no uploaded pdf could be parsed");
            return Err(IngestError::UnreadableBatch(batch.skipped));
        }
        let char_count = batch.text.chars().count();

        let chunks = build_chunks(&batch.text, ChunkingConfig::from(&self.options));
        if chunks.is_empty() {
            warn!(session = %self.id, skipped = batch.skipped.len(), "uploaded pdfs contain no text");
            return Err(IngestError::EmptyInput(format!(
                "no extractable text in {} uploaded file(s)",
                sources.len()
            )));
        }

        let index = build_index(&chunks, self.embedder.as_ref())?;
        let engine = ConversationEngine::new(
            Box::new(index),
            Arc::clone(&self.embedder),
            Arc::clone(&self.llm),
            self.options.top_k,
        )
        .with_condense_question(self.options.condense_question);

        if self.engine.replace(engine).is_some() {
            info!(session = %self.id, "previous index and history discarded");
        }
        self.documents = batch.documents.clone();

        info!(
            session = %self.id,
            documents = batch.documents.len(),
            skipped = batch.skipped.len(),
            chars = char_count,
            chunk_count = chunks.len(),
            "pdfs processed"
        );

        Ok(ProcessSummary {
            documents: batch.documents,
            skipped: batch.skipped,
            char_count,
            chunk_count: chunks.len(),
        })
    }

    pub fn ask(&mut self, question: &str) -> Result<Reply<'_>, ChatError> {
        let session = self.id;
        let Some(engine) = self.engine.as_mut() else {
            warn!(session = %session, "question asked before any pdf was processed");
            return Err(ChatError::NotReady);
        };
        engine.ask(question)
    }
}
