use crate::{ScoredChunk, Turn};
use std::fmt::Write;

const CONDENSE_INSTRUCTIONS: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language. \
Reply with the standalone question only.";

const ANSWER_INSTRUCTIONS: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

pub fn format_history(history: &[Turn]) -> String {
    let mut rendered = String::new();
    for turn in history {
        let _ = writeln!(rendered, "Human: {}", turn.question);
        let _ = writeln!(rendered, "Assistant: {}", turn.answer);
    }
    rendered
}

pub fn format_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt that rewrites a follow-up into a question retrievable on its own.
pub fn condense_question_prompt(history: &[Turn], question: &str) -> String {
    format!(
        "{CONDENSE_INSTRUCTIONS}\n\nChat History:\n{}\nFollow Up Input: {question}\nStandalone question:",
        format_history(history)
    )
}

pub fn answer_prompt(history: &[Turn], hits: &[ScoredChunk], question: &str) -> String {
    let mut prompt = format!("{ANSWER_INSTRUCTIONS}\n\n{}\n\n", format_context(hits));
    if !history.is_empty() {
        let _ = write!(prompt, "Chat History:\n{}\n", format_history(history));
    }
    let _ = write!(prompt, "Question: {question}\nHelpful Answer:");
    prompt
}
