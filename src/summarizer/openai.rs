// file: src/summarizer/openai.rs
// description: OpenAI-compatible chat completions client producing article digests
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use crate::summarizer::{Summarizer, build_prompt};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    prompt: String,
}

impl OpenAiSummarizer {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config("completion API key is not set (OPENAI_API_KEY)".to_string())
            })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, title: &str, abstract_text: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(&self.prompt, title, abstract_text)),
            }],
        };

        debug!(
            "Requesting completion for {} chars of abstract",
            abstract_text.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_failure(status, error_text));
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

fn classify_failure(status: StatusCode, body: String) -> PipelineError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        PipelineError::RateLimited(body)
    } else {
        PipelineError::Api {
            service: "completions",
            status: status.as_u16(),
            body,
        }
    }
}

fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| PipelineError::Parse("completion response has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            OpenAiSummarizer::new(&config),
            Err(PipelineError::Config(_))
        ));

        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        let summarizer = OpenAiSummarizer::new(&config).unwrap();
        assert_eq!(summarizer.base_url, "http://localhost:8080/v1");
        assert_eq!(summarizer.model, "gpt-4o-mini");
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, "quota".to_string());
        assert!(err.is_rate_limit());

        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert!(!err.is_rate_limit());
        assert!(matches!(err, PipelineError::Api { status: 500, .. }));
    }

    #[test]
    fn test_parse_completion_trims_content() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  - 要点1\n- 要点2\n "}, "finish_reason": "stop"}]
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "- 要点1\n- 要点2");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(PipelineError::Parse(_))
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(PipelineError::Parse(_))
        ));
    }
}
