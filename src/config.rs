use std::net::SocketAddr;

use clap::Parser;

use crate::gemini::client::{DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL};
use crate::oracle::gate::DEFAULT_THRESHOLD;
use crate::oracle::{DEFAULT_TOP_K, GatePolicy, RelevanceGate};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("relevance threshold must be within 0.0..=1.0, got {0}")]
    Threshold(f32),

    #[error("top-k must be at least 1")]
    TopK,
}

/// Server configuration. Every flag falls back to the environment variable of the same
/// purpose; values from a `.env` file are loaded into the environment before parsing.
#[derive(Parser, Debug, Clone)]
#[command(name = "geeta", version, about = "Bhagavad Gita question answering over Pinecone and Gemini")]
pub struct Config {
    /// Pinecone API key
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Name of the pre-populated Pinecone index holding verse embeddings
    #[arg(long, env = "INDEX_NAME")]
    pub index_name: String,

    /// Index data-plane host; resolved through the Pinecone control plane when omitted
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_index_host: Option<String>,

    /// Gemini model used for answers and relevance classification
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Gemini embedding model; must match the one the index was built with
    #[arg(long, env = "GEMINI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Number of nearest verses retrieved per question
    #[arg(long, env = "TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Minimum best-match similarity for a verse-grounded answer
    #[arg(long, env = "RELEVANCE_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub relevance_threshold: f32,

    /// How similarity and the YES/NO relevance classifier combine
    #[arg(long, env = "GATE_POLICY", value_enum, default_value_t = GatePolicy::Score)]
    pub gate_policy: GatePolicy,

    /// Allowed CORS origin (repeatable); any origin when omitted
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load `.env` (if present), parse flags/environment and validate.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("PINECONE_API_KEY", &self.pinecone_api_key),
            ("GEMINI_API_KEY", &self.gemini_api_key),
            ("INDEX_NAME", &self.index_name),
            ("GEMINI_MODEL", &self.gemini_model),
            ("GEMINI_EMBEDDING_MODEL", &self.embedding_model),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Blank(name));
            }
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(ConfigError::Threshold(self.relevance_threshold));
        }
        if self.top_k == 0 {
            return Err(ConfigError::TopK);
        }
        Ok(())
    }

    pub fn gate(&self) -> RelevanceGate {
        RelevanceGate {
            policy: self.gate_policy,
            threshold: self.relevance_threshold,
        }
    }

    /// Host override with blank values treated as absent.
    pub fn index_host(&self) -> Option<&str> {
        self.pinecone_index_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}
