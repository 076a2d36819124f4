//! Google generative-language (Gemini) chat provider
//!
//! API Flow:
//! 1. The conversation is flattened into one prompt (see `build_prompt`)
//! 2. POST /v1beta/models/{model}:generateContent → first candidate's text
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::ChatMessage,
    services::chat::{build_prompt, ChatProvider},
};

const TEMPERATURE: f32 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Seconds clients are told to wait after an upstream 429
const UPSTREAM_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(history: &[ChatMessage]) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(history),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    /// Maps an upstream failure status to our error type.
    /// The upstream body is logged by the caller, never returned to clients.
    fn map_status(status: StatusCode) -> AppError {
        match status {
            StatusCode::BAD_REQUEST => {
                AppError::InvalidInput("Invalid request. Please check your input.".to_string())
            }
            StatusCode::FORBIDDEN => AppError::Forbidden(
                "API key does not have access to the requested resource.".to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited {
                message: "Rate limit exceeded. Please try again in a few minutes.".to_string(),
                retry_after_secs: Some(UPSTREAM_RETRY_AFTER_SECS),
            },
            _ => AppError::ExternalApi(format!(
                "Failed to get response from AI (upstream status {})",
                status
            )),
        }
    }

    fn extract_text(response: GenerateResponse) -> AppResult<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect()
            })
            .ok_or_else(|| AppError::ExternalApi("Gemini returned no candidates".to_string()))?;

        if text.is_empty() {
            return Err(AppError::ExternalApi(
                "Gemini returned an empty reply".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl ChatProvider for GeminiProvider {
    async fn send_chat(&self, history: &[ChatMessage]) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(history))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Gemini API call failed");
            return Err(Self::map_status(status));
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw Gemini API response");

        let parsed: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize Gemini response");
            AppError::ExternalApi(format!("Failed to parse Gemini response: {}", e))
        })?;

        Self::extract_text(parsed)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            "https://generativelanguage.googleapis.com/".to_string(),
            "gemini-1.5-pro".to_string(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let history = vec![ChatMessage {
            role: ChatRole::User,
            content: "Suggest a dessert".to_string(),
        }];

        let body = serde_json::to_value(GeminiProvider::request_body(&history)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("User: Suggest a dessert"));
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_extract_text() {
        let json = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [ { "text": "Try " }, { "text": "rasgulla." } ] } }
            ]
        }"#;

        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(GeminiProvider::extract_text(response).unwrap(), "Try rasgulla.");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            GeminiProvider::extract_text(response),
            Err(AppError::ExternalApi(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::BAD_REQUEST),
            AppError::InvalidInput(_)
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::FORBIDDEN),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::TOO_MANY_REQUESTS),
            AppError::RateLimited {
                retry_after_secs: Some(60),
                ..
            }
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::ExternalApi(_)
        ));
    }

    #[test]
    fn test_upstream_server_error_is_bad_gateway() {
        let error = GeminiProvider::map_status(StatusCode::SERVICE_UNAVAILABLE);
        let response = axum::response::IntoResponse::into_response(error);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
