use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::api_types::{ApiChatRequest, ApiChatResponse, ApiMessage, ApiResponseFormat};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::{AnalysisResult, ChatContext, ChatTurn, Role};
use crate::normalize::parse_analysis_json;
use crate::prompts::{system_chat, user_analysis, SYSTEM_ANALYSIS};
use crate::provider::AnalysisProvider;

pub const EMPTY_CHAT_REPLY: &str = "I couldn't generate a response.";

/// `AnalysisProvider` backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmProvider {
    client: Client,
    url: Url,
    api_key: Option<String>,
    model: String,
}

impl LlmProvider {
    pub fn new(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let url = cfg
            .completions_url()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }

    async fn complete(&self, messages: Vec<ApiMessage>, json: bool) -> Result<String, ProviderError> {
        let start = Instant::now();
        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        debug!("LLM call starting - messages={}, prompt_length={} chars", messages.len(), prompt_chars);

        let body = ApiChatRequest {
            model: &self.model,
            messages,
            response_format: json.then_some(ApiResponseFormat { kind: "json_object" }),
        };

        let mut req = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiChatResponse = resp.json().await?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        info!(
            "LLM API call completed - duration={:.2}s, response_length={} chars",
            start.elapsed().as_secs_f32(),
            answer.len()
        );
        Ok(answer)
    }
}

pub fn history_messages(transcript: &[ChatTurn]) -> Vec<ApiMessage> {
    transcript
        .iter()
        .map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            ApiMessage::new(role, t.text.clone())
        })
        .collect()
}

#[async_trait]
impl AnalysisProvider for LlmProvider {
    async fn analyze(&self, raw_text: &str) -> Result<AnalysisResult, ProviderError> {
        let messages = vec![
            ApiMessage::new("system", SYSTEM_ANALYSIS),
            ApiMessage::new("user", user_analysis(raw_text)),
        ];
        let answer = self.complete(messages, true).await?;
        if answer.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        parse_analysis_json(&answer)
    }

    async fn chat(
        &self,
        transcript: &[ChatTurn],
        new_message: &str,
        context: Option<&ChatContext>,
    ) -> Result<String, ProviderError> {
        let mut messages = vec![ApiMessage::new("system", system_chat(context))];
        messages.extend(history_messages(transcript));
        messages.push(ApiMessage::new("user", new_message));

        let answer = self.complete(messages, false).await?;
        if answer.trim().is_empty() {
            return Ok(EMPTY_CHAT_REPLY.to_string());
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn history_maps_roles() {
        let turns = vec![
            ChatTurn { id: 1, role: Role::User, text: "why?".into(), created_at: Utc::now() },
            ChatTurn { id: 2, role: Role::Assistant, text: "because".into(), created_at: Utc::now() },
        ];
        let msgs = history_messages(&turns);
        assert_eq!(msgs, vec![ApiMessage::new("user", "why?"), ApiMessage::new("assistant", "because")]);
    }

    #[test]
    fn provider_rejects_invalid_base() {
        let cfg = ProviderConfig {
            api_base: "nope".into(),
            api_key: None,
            model: "m".into(),
            timeout_secs: 5,
        };
        assert!(matches!(LlmProvider::new(&cfg), Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn request_asks_for_json_only_when_needed() {
        let body = ApiChatRequest {
            model: "m",
            messages: vec![ApiMessage::new("user", "hi")],
            response_format: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("response_format").is_none());

        let body = ApiChatRequest {
            model: "m",
            messages: vec![],
            response_format: Some(ApiResponseFormat { kind: "json_object" }),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["response_format"]["type"], "json_object");
    }
}
