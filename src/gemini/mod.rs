//! Gemini REST client: query embeddings and text generation.

pub mod client;
mod extract;
pub mod types;

pub use client::{Embedder, GeminiClient, GeminiError, Generator};
pub use types::SamplingParams;
