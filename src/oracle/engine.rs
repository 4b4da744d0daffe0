use tracing::{debug, info};

use super::gate::{RelevanceDecision, RelevanceGate, parse_verdict};
use super::lang::Lang;
use super::passage::Passage;
use super::prompt;
use crate::gemini::{Embedder, GeminiError, Generator};
use crate::pinecone::{PineconeError, VectorIndex};

pub const DEFAULT_TOP_K: usize = 5;

/// Pipeline failure, tagged with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("No question provided.")]
    InvalidInput,

    #[error("embedding failed: {0}")]
    Embedding(#[source] GeminiError),

    #[error("vector index query failed: {0}")]
    Index(#[source] PineconeError),

    #[error("relevance classification failed: {0}")]
    Classification(#[source] GeminiError),

    #[error("answer generation failed: {0}")]
    Generation(#[source] GeminiError),
}

/// Which prompt variant produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPath {
    Grounded,
    Fallback,
}

#[derive(Debug)]
pub struct Answer {
    pub text: String,
    pub path: AnswerPath,
    pub decision: RelevanceDecision,
}

/// Question → embedding → nearest verses → relevance gate → prompt → generated answer.
///
/// Clients are injected once at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct Oracle<E, I, G> {
    embedder: E,
    index: I,
    generator: G,
    gate: RelevanceGate,
    top_k: usize,
}

impl<E, I, G> Oracle<E, I, G>
where
    E: Embedder,
    I: VectorIndex,
    G: Generator,
{
    pub fn new(embedder: E, index: I, generator: G, gate: RelevanceGate, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            generator,
            gate,
            top_k: top_k.max(1),
        }
    }

    pub async fn answer(&self, question: &str, lang: Lang) -> Result<Answer, OracleError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(OracleError::InvalidInput);
        }

        info!(question, lang = lang.name(), "answering question");

        let embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(OracleError::Embedding)?;

        let mut matches = self
            .index
            .query(&embedding, self.top_k)
            .await
            .map_err(OracleError::Index)?;
        matches.truncate(self.top_k);

        let passages: Vec<Passage> = matches.iter().map(Passage::from_match).collect();
        let scores: Vec<f32> = passages.iter().map(|p| p.score).collect();
        debug!(
            retrieved = passages.len(),
            top_match = ?matches.first().map(|m| m.id.as_str()),
            "verses retrieved"
        );

        let verdict = if self.gate.needs_classifier(&scores) {
            let reply = self
                .generator
                .generate(&prompt::classifier(question), None)
                .await
                .map_err(OracleError::Classification)?;
            Some(parse_verdict(&reply))
        } else {
            None
        };

        let decision = self.gate.decide(&scores, verdict);
        info!(
            retrieved = decision.match_count,
            max_score = decision.max_score,
            classifier = ?decision.classifier,
            grounded = decision.grounded,
            "relevance gate"
        );

        let (path, text) = if decision.grounded {
            let prompt = prompt::grounded(question, &passages, lang);
            let text = self
                .generator
                .generate(&prompt, Some(prompt::GROUNDED_SAMPLING))
                .await
                .map_err(OracleError::Generation)?;
            (AnswerPath::Grounded, text)
        } else {
            let prompt = prompt::fallback(question, lang);
            let text = self
                .generator
                .generate(&prompt, None)
                .await
                .map_err(OracleError::Generation)?;
            (AnswerPath::Fallback, text)
        };

        info!(path = ?path, chars = text.chars().count(), "answer generated");
        debug!(answer = %text, "generated text");

        Ok(Answer {
            text,
            path,
            decision,
        })
    }
}
