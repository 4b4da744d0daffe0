//! Prompt templates for the grounded and fallback answer paths, plus the relevance classifier.

use super::lang::Lang;
use super::passage::Passage;
use crate::gemini::SamplingParams;
use crate::markdown::{italic_blockquote, sanitize_inline};

/// Lower-variance sampling for answers that must stay close to the quoted verses.
pub const GROUNDED_SAMPLING: SamplingParams = SamplingParams {
    temperature: Some(0.4),
    top_p: Some(0.9),
    top_k: Some(32),
};

const GROUNDED_PREAMBLE: &str = "\
You are the Bhagavad Gita, responding in a calm, wise, saintly tone.
Use the verses below to guide your answer.

Formatting rules:
- Open with a `##` heading that names the core idea of your answer in a few words.
- Use `###` headings for any further sections.
- Use **bold** for key teachings and *italics* for gentle emphasis.
- When you quote Sanskrit, put it in a `>` blockquote in italics.
- Cite verses as Chapter X, Verse Y.
- You may close with one short reflective remark, set apart after a horizontal rule.";

const FALLBACK_PREAMBLE: &str = "\
You are a calm, wise spiritual guide speaking in the spirit of the Bhagavad Gita.
No specific verse was found for this question, so answer from the Gita's broader teachings
on duty, detachment, devotion and self-knowledge. Do not invent verse numbers or quotations.
If the question is unrelated to spiritual life, answer briefly and kindly, and gently relate
it back to inner steadiness where that is natural.";

const CLASSIFIER_RUBRIC: &str = "\
Classify the question below. Answer with exactly one word: YES or NO.

YES: the question is spiritually or philosophically reflective (purpose, duty, fear, grief,
attachment, the self, right action, devotion, inner peace, ethical dilemmas).
NO: the question is factual, technical, trivia, small talk, or otherwise unrelated to
spiritual reflection.";

/// One verse block: heading, quoted Sanskrit, meaning in the requested language.
pub fn verse_block(passage: &Passage, lang: Lang) -> String {
    let mut block = format!(
        "### 📖 Chapter {}, Verse {}\n\n",
        passage.chapter, passage.verse
    );
    let sanskrit = italic_blockquote(&passage.sanskrit);
    if !sanskrit.is_empty() {
        block.push_str("**Sanskrit:**\n\n");
        block.push_str(&sanskrit);
        block.push_str("\n\n");
    }
    block.push_str("**Meaning:** ");
    block.push_str(passage.meaning(lang).trim());
    block
}

/// Verse blocks in ranked order, separated by blank lines.
pub fn verse_context(passages: &[Passage], lang: Lang) -> String {
    passages
        .iter()
        .map(|p| verse_block(p, lang))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn language_line(lang: Lang) -> String {
    format!("Respond in {} in Markdown format.", lang.name())
}

pub fn grounded(question: &str, passages: &[Passage], lang: Lang) -> String {
    format!(
        "{GROUNDED_PREAMBLE}\n\n{}\nKeep your answer spiritual, practical, and graceful.\n\n{}\n\nNow answer this question:\n\n**{}**\n",
        language_line(lang),
        verse_context(passages, lang),
        sanitize_inline(question),
    )
}

pub fn fallback(question: &str, lang: Lang) -> String {
    format!(
        "{FALLBACK_PREAMBLE}\n\n{}\n\nQuestion:\n\n**{}**\n",
        language_line(lang),
        sanitize_inline(question),
    )
}

pub fn classifier(question: &str) -> String {
    format!(
        "{CLASSIFIER_RUBRIC}\n\nQuestion: {}",
        sanitize_inline(question)
    )
}
