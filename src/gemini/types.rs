use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<SamplingParams>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// Sampling overrides sent as `generationConfig`. Unset fields keep the model defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    pub model: String,
    pub content: Content,
    pub task_type: TaskType,
}

/// Embedding task hint. Only query-side embeddings are produced here; the index
/// was populated with `RETRIEVAL_DOCUMENT` embeddings elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalQuery,
}

#[derive(Debug, Deserialize)]
pub struct EmbedContentResponse {
    pub embedding: Option<ContentEmbedding>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ContentEmbedding {
    #[serde(default)]
    pub values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
}

/// Either response shape carries an optional `error` object on failure.
pub(super) trait MaybeApiError {
    fn api_error(&self) -> Option<&ApiError>;
}

impl MaybeApiError for GenerateContentResponse {
    fn api_error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }
}

impl MaybeApiError for EmbedContentResponse {
    fn api_error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }
}
