//! Pinecone REST client: index host resolution and nearest-neighbour queries.

pub mod client;
pub mod types;

pub use client::{PineconeClient, PineconeError, VectorIndex};
pub use types::ScoredVector;
