//! Google Gemini provider over the `generateContent` REST endpoint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

const PROVIDER: &str = "gemini";

/// Gemini provider. One HTTP call per completion, no streaming.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ReplyContent>,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

// ── Provider impl ───────────────────────────────────────────────────

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut system_text = String::new();
        let mut user_parts = Vec::new();
        for message in &request.messages {
            match message.role {
                Role::System => {
                    if !system_text.is_empty() {
                        system_text.push('\n');
                    }
                    system_text.push_str(&message.content);
                }
                Role::User => user_parts.push(Part {
                    text: message.content.clone(),
                }),
            }
        }

        let body = GenerateContentBody {
            system_instruction: (!system_text.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: system_text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: user_parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.json_response.then_some("application/json"),
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                provider: PROVIDER.into(),
                retry_after: None,
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.into(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("status {status}: {}", text.chars().take(300).collect::<String>()),
            });
        }

        let reply: GenerateContentReply =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: format!("malformed response body: {e}"),
            })?;

        let content: String = reply
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = reply.usage.unwrap_or_default();
        debug!(
            model = %self.model,
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "Gemini completion finished"
        );

        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_model_path() {
        let provider = GeminiProvider::new(
            SecretString::from("test-key"),
            "models/gemini-2.5-flash",
            "https://generativelanguage.googleapis.com/v1beta",
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn reply_parsing_tolerates_missing_fields() {
        let reply: GenerateContentReply = serde_json::from_str("{}").unwrap();
        assert!(reply.candidates.is_empty());
        assert!(reply.usage.is_none());

        let reply: GenerateContentReply = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}],"usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":5}}"#,
        )
        .unwrap();
        let text: String = reply.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }
}
