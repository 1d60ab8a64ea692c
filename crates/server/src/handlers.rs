//! Route handlers: service health and batch analysis of stored decks.

use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use deck_core::{batch_summary, snippet, PresentationAnalysis};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Length of the analysis excerpt returned by the analyze endpoint.
const SNIPPET_CHARS: usize = 1000;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Service is running"
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "fileKeys", default)]
    pub file_keys: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub message: String,
    pub summary: String,
    pub full_analysis_snippet: String,
    pub processed: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Analyze a batch of stored presentations.
///
/// Keys not ending in `.pptx` are skipped; keys that cannot be fetched or
/// parsed are reported under `failed` without aborting the batch.
pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let file_keys = parse_file_keys(&body)
        .ok_or_else(|| ApiError::BadRequest("'fileKeys' (array) is required.".to_string()))?;

    let mut results: Vec<(String, PresentationAnalysis)> = Vec::new();
    let mut processed = Vec::new();
    let mut failed = Vec::new();

    for key in file_keys {
        if !key.ends_with(".pptx") {
            log::debug!("Skipping non-pptx key {}", key);
            continue;
        }

        match analyze_key(&state, &key).await {
            Ok(analysis) => {
                results.push((key.clone(), analysis));
                processed.push(key);
            }
            Err(e) => {
                log::error!("Error processing file {}: {}", key, e);
                failed.push(key);
            }
        }
    }

    let borrowed: Vec<(&str, &PresentationAnalysis)> =
        results.iter().map(|(k, a)| (k.as_str(), a)).collect();
    let summary = batch_summary(&borrowed);

    let full_analysis: serde_json::Map<String, Value> = results
        .iter()
        .map(|(key, analysis)| Ok((key.clone(), serde_json::to_value(analysis)?)))
        .collect::<Result<_, serde_json::Error>>()
        .map_err(|e| {
            log::error!("Failed to serialize analysis: {}", e);
            ApiError::Internal("Error processing files".to_string())
        })?;

    Ok(Json(AnalyzeResponse {
        message: "Analysis complete.".to_string(),
        summary,
        full_analysis_snippet: snippet(&Value::Object(full_analysis).to_string(), SNIPPET_CHARS),
        processed,
        failed,
    }))
}

/// `fileKeys` from a request body, if present and non-empty.
///
/// Repeated keys are dropped, keeping the first occurrence.
fn parse_file_keys(body: &[u8]) -> Option<Vec<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let request: AnalyzeRequest = serde_json::from_slice(body).ok()?;
    let keys = request.file_keys.filter(|keys| !keys.is_empty())?;

    let mut seen = HashSet::new();
    Some(keys.into_iter().filter(|key| seen.insert(key.clone())).collect())
}

async fn analyze_key(state: &AppState, key: &str) -> anyhow::Result<PresentationAnalysis> {
    let bytes = state.store.get(key).await?;

    let analyzer = state.analyzer.clone();
    let name = key.to_string();
    let analysis =
        tokio::task::spawn_blocking(move || analyzer.analyze_bytes(&bytes, &name)).await??;

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_keys() {
        assert_eq!(
            parse_file_keys(br#"{"fileKeys": ["a.pptx", "b.txt"]}"#),
            Some(vec!["a.pptx".to_string(), "b.txt".to_string()])
        );
        assert_eq!(parse_file_keys(b""), None);
        assert_eq!(parse_file_keys(b"{}"), None);
        assert_eq!(parse_file_keys(br#"{"fileKeys": []}"#), None);
        assert_eq!(parse_file_keys(br#"{"fileKeys": "a.pptx"}"#), None);
        assert_eq!(parse_file_keys(b"not json"), None);
    }

    #[test]
    fn test_parse_file_keys_drops_repeats() {
        assert_eq!(
            parse_file_keys(br#"{"fileKeys": ["b.pptx", "a.pptx", "b.pptx", "a.pptx"]}"#),
            Some(vec!["b.pptx".to_string(), "a.pptx".to_string()])
        );
    }
}
