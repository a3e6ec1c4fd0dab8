use crate::answer::AnswerCleaner;
use crate::embeddings::Embedder;
use crate::prompts::{answer_prompt, condense_question_prompt};
use crate::traits::{LanguageModel, VectorIndex};
use crate::{ChatError, ScoredChunk, Turn};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one answered question.
#[derive(Debug)]
pub struct Reply<'a> {
    pub answer: String,
    pub raw_answer: String,
    pub sources: Vec<ScoredChunk>,
    pub history: &'a [Turn],
}

/// Retrieval-augmented chat bound to one vector index. History only grows;
/// a new index means a new engine.
pub struct ConversationEngine {
    index: Box<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    cleaner: AnswerCleaner,
    top_k: usize,
    condense_question: bool,
    history: Vec<Turn>,
}

impl ConversationEngine {
    pub fn new(
        index: Box<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            cleaner: AnswerCleaner::default(),
            top_k,
            condense_question: true,
            history: Vec::new(),
        }
    }

    pub fn with_condense_question(mut self, enabled: bool) -> Self {
        self.condense_question = enabled;
        self
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn ask(&mut self, question: &str) -> Result<Reply<'_>, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let search_text = self.standalone_question(question)?;
        let query_vector = self.embedder.embed(&search_text)?;
        let sources = self.index.query(&query_vector, self.top_k)?;
        debug!(
            retrieved = sources.len(),
            top_score = sources.first().map(|hit| hit.score).unwrap_or_default(),
            "retrieved context"
        );

        let prompt = answer_prompt(&self.history, &sources, question);
        let raw_answer = self.llm.complete(&prompt)?;
        let answer = self.cleaner.clean(&raw_answer);

        self.history.push(Turn {
            question: question.to_string(),
            answer: answer.clone(),
            raw_answer: raw_answer.clone(),
            asked_at: Utc::now(),
        });
        info!(
            model = self.llm.name(),
            turn = self.history.len(),
            answer_chars = answer.chars().count(),
            "question answered"
        );

        Ok(Reply {
            answer,
            raw_answer,
            sources,
            history: &self.history,
        })
    }

    /// Rewrites a follow-up into a standalone question for retrieval.
    fn standalone_question(&self, question: &str) -> Result<String, ChatError> {
        if !self.condense_question || self.history.is_empty() {
            return Ok(question.to_string());
        }

        let rewritten = self
            .llm
            .complete(&condense_question_prompt(&self.history, question))?;
        let rewritten = self.cleaner.clean(&rewritten);
        debug!(original = question, standalone = %rewritten, "condensed follow-up");

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten)
        }
    }
}
