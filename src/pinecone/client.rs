use std::future::Future;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::types::{ErrorBody, IndexDescription, QueryRequest, QueryResponse, ScoredVector};

const CONTROL_PLANE: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2025-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Characters escaped when an index name is placed in a single URL path segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'"')
    .add(b'<')
    .add(b'>');

/// Errors returned by Pinecone control- and data-plane calls.
#[derive(Debug, thiserror::Error)]
pub enum PineconeError {
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Pinecone rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Pinecone rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("Invalid index host: {0}")]
    InvalidHost(String),

    #[error("Pinecone API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Nearest-neighbour lookup over a pre-populated index.
pub trait VectorIndex {
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<ScoredVector>, PineconeError>> + Send;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Data-plane client bound to a single index host.
///
/// The host is resolved once (see [`PineconeClient::connect`]) so that each query is a
/// single round trip.
#[derive(Debug, Clone)]
pub struct PineconeClient {
    http: Client,
    api_key: ApiKey,
    index_url: String,
}

impl PineconeClient {
    /// Bind to `index_name`, asking the control plane for its host unless `host` is given.
    pub async fn connect(
        http: Client,
        api_key: &str,
        index_name: &str,
        host: Option<&str>,
    ) -> Result<Self, PineconeError> {
        let api_key = ApiKey(api_key.trim().to_string());
        let host = match host {
            Some(h) => h.to_string(),
            None => describe_index(&http, &api_key, CONTROL_PLANE, index_name).await?.host,
        };
        let index_url = normalize_host(&host)?;
        debug!(index = %index_name, url = %index_url, "pinecone index resolved");
        Ok(Self {
            http,
            api_key,
            index_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_index_url(http: Client, index_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            index_url: index_url.trim_end_matches('/').to_string(),
        }
    }
}

impl VectorIndex for PineconeClient {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredVector>, PineconeError> {
        let url = format!("{}/query", self.index_url);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = authorized(self.http.post(&url), &self.api_key)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, &url).await?;
        let body: QueryResponse = response.json().await?;

        debug!(matches = body.matches.len(), top_k, "pinecone query complete");
        Ok(body.matches)
    }
}

async fn describe_index(
    http: &Client,
    api_key: &ApiKey,
    base_url: &str,
    index_name: &str,
) -> Result<IndexDescription, PineconeError> {
    let url = format!("{base_url}/indexes/{}", encode_segment(index_name));
    let response = authorized(http.get(&url), api_key)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;
    let response = check_status(response, index_name).await?;
    Ok(response.json().await?)
}

fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT_ENCODE_SET).to_string()
}

fn authorized(request: RequestBuilder, api_key: &ApiKey) -> RequestBuilder {
    request
        .header("Api-Key", &api_key.0)
        .header("X-Pinecone-API-Version", API_VERSION)
        .header("User-Agent", crate::USER_AGENT)
}

async fn check_status(
    response: reqwest::Response,
    target: &str,
) -> Result<reqwest::Response, PineconeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = extract_error_message(&text).unwrap_or_else(|| {
        let end = text.floor_char_boundary(200);
        format!("HTTP {status}: {}", &text[..end])
    });
    warn!(status = %status, target, "Pinecone API error");

    Err(match status.as_u16() {
        404 => PineconeError::IndexNotFound(target.to_string()),
        401 | 403 => PineconeError::Unauthorized(message),
        429 => PineconeError::RateLimited,
        code => PineconeError::Api { code, message },
    })
}

fn extract_error_message(text: &str) -> Option<String> {
    let body: ErrorBody = serde_json::from_str(text).ok()?;
    body.error
        .and_then(|e| e.message)
        .or(body.message)
        .filter(|m| !m.is_empty())
}

/// Control-plane hosts come back without a scheme; tests and overrides may carry one.
fn normalize_host(host: &str) -> Result<String, PineconeError> {
    let host = host.trim().trim_end_matches('/');
    let with_scheme = if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let parsed = url::Url::parse(&with_scheme)
        .map_err(|e| PineconeError::InvalidHost(format!("{host}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(PineconeError::InvalidHost(host.to_string()));
    }
    Ok(with_scheme)
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn query_returns_ranked_matches_with_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("Api-Key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "topK": 5,
                "includeMetadata": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [
                    {"id": "2.47", "score": 0.88, "metadata": {"chapter_number": 2, "verse": "47"}},
                    {"id": "2.48", "score": 0.81, "metadata": {"chapter_number": 2, "verse": "48"}}
                ],
                "namespace": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PineconeClient::with_index_url(Client::new(), &server.uri());
        let matches = client.query(&[0.1, 0.2], 5).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "2.47");
        assert!(matches[0].score > matches[1].score);
        assert_eq!(matches[1].metadata["verse"], "48");
    }

    #[tokio::test]
    async fn query_400_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 3,
                "message": "Vector dimension 2 does not match the dimension of the index 768"
            })))
            .mount(&server)
            .await;

        let client = PineconeClient::with_index_url(Client::new(), &server.uri());
        match client.query(&[0.1, 0.2], 5).await {
            Err(PineconeError::Api { code: 400, message }) => {
                assert!(message.contains("dimension"), "got: {message}");
            }
            other => panic!("expected Api(400), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_401_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Key"))
            .mount(&server)
            .await;

        let client = PineconeClient::with_index_url(Client::new(), &server.uri());
        let result = client.query(&[0.1], 5).await;
        assert!(matches!(result, Err(PineconeError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn describe_index_resolves_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/bhagwad-geeta"))
            .and(header("Api-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "bhagwad-geeta",
                "dimension": 768,
                "metric": "cosine",
                "host": "bhagwad-geeta-abc123.svc.pinecone.io"
            })))
            .mount(&server)
            .await;

        let key = ApiKey("test-key".into());
        let description = describe_index(&Client::new(), &key, &server.uri(), "bhagwad-geeta")
            .await
            .unwrap();
        assert_eq!(description.host, "bhagwad-geeta-abc123.svc.pinecone.io");
    }

    #[tokio::test]
    async fn describe_unknown_index_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let key = ApiKey("test-key".into());
        let result = describe_index(&Client::new(), &key, &server.uri(), "missing").await;
        match result {
            Err(PineconeError::IndexNotFound(name)) => assert_eq!(name, "missing"),
            other => panic!("expected IndexNotFound, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_with_explicit_host_skips_control_plane() {
        let client = PineconeClient::connect(Client::new(), "key", "any", Some("http://127.0.0.1:9/"))
            .await
            .unwrap();
        assert_eq!(client.index_url, "http://127.0.0.1:9");
    }
}
