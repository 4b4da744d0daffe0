use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::oracle::Oracle;
use crate::pinecone::PineconeClient;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout; individual upstream calls may set a shorter one.
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);

pub type GeminiOracle = Oracle<GeminiClient, PineconeClient, GeminiClient>;

/// Process-wide handles, built once at startup and shared read-only by every request.
pub struct AppState {
    pub oracle: GeminiOracle,
}

impl AppState {
    pub async fn initialize(config: &Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()?;

        info!(index = %config.index_name, "connecting to Pinecone");
        let index = PineconeClient::connect(
            http.clone(),
            &config.pinecone_api_key,
            &config.index_name,
            config.index_host(),
        )
        .await?;
        info!("Pinecone index ready");

        let gemini = GeminiClient::new(
            http,
            &config.gemini_api_key,
            &config.gemini_model,
            &config.embedding_model,
        );
        info!(model = %config.gemini_model, embedding_model = %config.embedding_model, "Gemini client ready");

        let oracle = Oracle::new(gemini.clone(), index, gemini, config.gate(), config.top_k);
        Ok(Arc::new(Self { oracle }))
    }
}
