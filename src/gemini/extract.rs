use tracing::warn;

use super::types::GenerateContentResponse;

/// Concatenated text of the first candidate, or `None` when the model produced nothing
/// (safety filter, empty candidate list, blank parts).
pub fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.as_ref().and_then(|c| c.first());

    let text = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty());

    if text.is_none() {
        warn!("Gemini returned empty answer (safety filter or empty response)");
    }

    text
}
