use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::extract::extract_text;
use super::types::{
    ApiError, Content, EmbedContentRequest, EmbedContentResponse, GenerateContentRequest,
    GenerateContentResponse, MaybeApiError, Part, SamplingParams, TaskType,
};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Model returned no text (possibly blocked by safety settings)")]
    EmptyResponse,

    #[error("Embedding response contained no values")]
    EmptyEmbedding,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Text → vector, used on the query side of retrieval.
/// Implemented by `GeminiClient` for production; mock implementations used in tests.
pub trait Embedder {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, GeminiError>> + Send;
}

/// Prompt → generated text.
pub trait Generator {
    fn generate(
        &self,
        prompt: &str,
        sampling: Option<SamplingParams>,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    embedding_model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: &str, model: &str, embedding_model: &str) -> Self {
        Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model: model.trim().to_string(),
            embedding_model: embedding_model.trim().to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn post<Req, Resp>(&self, url: &str, request: &Req) -> Result<Resp, GeminiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned + MaybeApiError,
    {
        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited");
            return Err(GeminiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<Resp>(&text)
                && let Some(err) = body.api_error()
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Gemini API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "Gemini API error (no structured body)");
            return Err(GeminiError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: Resp = response.json().await?;

        if let Some(err) = body.api_error() {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GeminiError> {
        let url = format!("{}/{}:embedContent", self.base_url, self.embedding_model);
        let request = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
                role: None,
            },
            task_type: TaskType::RetrievalQuery,
        };

        let body: EmbedContentResponse = self.post(&url, &request).await?;
        let values = body.embedding.map(|e| e.values).unwrap_or_default();
        if values.is_empty() {
            return Err(GeminiError::EmptyEmbedding);
        }

        debug!(model = %self.embedding_model, dimensions = values.len(), "gemini embed complete");
        Ok(values)
    }
}

impl Generator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        sampling: Option<SamplingParams>,
    ) -> Result<String, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
                role: Some("user".to_string()),
            }],
            generation_config: sampling,
        };

        let body: GenerateContentResponse = self.post(&url, &request).await?;
        debug!(model = %self.model, "gemini generate complete");

        extract_text(&body).ok_or(GeminiError::EmptyResponse)
    }
}

fn classify_api_error(err: &ApiError) -> GeminiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => GeminiError::RateLimited,
        Some(403) => GeminiError::QuotaExhausted(message),
        Some(code) => GeminiError::Api { code, message },
        None => GeminiError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_sends_query_task_type_and_returns_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/embedding-001:embedContent$"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "models/embedding-001",
                "taskType": "RETRIEVAL_QUERY",
                "content": {"parts": [{"text": "Who is Arjuna?"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": {"values": [0.1, 0.2, 0.3]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let vector = client.embed("Who is Arjuna?").await.unwrap();
        assert_eq!(vector, vec![0.1f32, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_without_values_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":embedContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": {"values": []}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.embed("test").await;
        assert!(matches!(result, Err(GeminiError::EmptyEmbedding)));
    }

    #[tokio::test]
    async fn generate_success_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/gemini-2\.5-flash:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{"text": "## Courage\n\nStand firm."}],
                        "role": "model"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let text = client.generate("prompt", None).await.unwrap();
        assert_eq!(text, "## Courage\n\nStand firm.");
    }

    #[tokio::test]
    async fn generate_forwards_sampling_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":generateContent$"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"topK": 32}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let sampling = SamplingParams {
            temperature: Some(0.4),
            top_p: Some(0.9),
            top_k: Some(32),
        };
        let text = client.generate("prompt", Some(sampling)).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn generate_without_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("prompt", None).await;
        assert!(matches!(result, Err(GeminiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn generate_429_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":generateContent$"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("test", None).await;
        assert!(matches!(result, Err(GeminiError::RateLimited)));
    }

    #[tokio::test]
    async fn generate_500_with_error_body_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":generateContent$"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {
                    "code": 500,
                    "message": "Internal server error"
                }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("test", None).await;
        match &result {
            Err(GeminiError::Api { code: 500, message }) => {
                assert!(message.contains("Internal server error"));
            }
            other => panic!("expected Api(500) with body message, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_500_with_invalid_body_returns_generic_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":embedContent$"))
            .respond_with(ResponseTemplate::new(500).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.embed("test").await;
        match &result {
            Err(GeminiError::Api { code: 500, message }) => {
                assert!(message.contains("not json"), "expected body snippet in error, got: {message}");
            }
            other => panic!("expected Api(500) without body, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_200_with_error_field_returns_classified_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r":generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {
                    "code": 403,
                    "message": "Quota exceeded"
                }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("test", None).await;
        assert!(matches!(result, Err(GeminiError::QuotaExhausted(_))));
    }
}
