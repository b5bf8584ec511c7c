//! OpenAI-compatible chat-completions backend.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect
//! (OpenAI, Cerebras, a local Ollama).

use crate::error::GuideError;
use crate::provider::GuidanceProvider;
use crate::types::{Guidance, GuidanceRequest};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsProvider {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Read the API key from `api_key_env`; fails with
    /// [`GuideError::NotConfigured`] when it is unset or blank.
    pub fn from_env(
        base_url: &str,
        api_key_env: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GuideError::NotConfigured(format!("{api_key_env} is not set")))?;
        Self::new(base_url, api_key, model, timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn system_prompt() -> &'static str {
        "You are an AI readiness assessment guide helping small and medium \
         businesses understand assessment questions and answer them honestly. \
         Explain what the question measures, what each score level looks like in \
         practice for a business like theirs, and how to choose between two \
         adjacent levels. Do not pick a score for them. Answer in plain prose, \
         at most three short paragraphs."
    }

    fn user_prompt(request: &GuidanceRequest) -> String {
        let mut prompt = format!(
            "Section: {}\nQuestion {}: {}\n",
            request.section_name, request.question_id, request.prompt
        );
        if let Some(description) = &request.description {
            prompt.push_str(&format!("Topic: {description}\n"));
        }
        prompt.push_str("Scoring rubric:\n");
        for (score, text) in &request.rubric {
            prompt.push_str(&format!("  {score}: {text}\n"));
        }
        if let Some(b) = &request.business {
            prompt.push_str(&format!(
                "Business: {} ({} industry, {} staff, {})\n",
                b.name, b.industry, b.size, b.location
            ));
        }
        match request.user_message() {
            Some(message) => prompt.push_str(&format!("\nThe user asks: {message}")),
            None => prompt.push_str("\nExplain this question."),
        }
        prompt
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GuidanceProvider for ChatCompletionsProvider {
    fn name(&self) -> &'static str {
        "chat_completions"
    }

    async fn explain(&self, request: &GuidanceRequest) -> Result<Guidance> {
        info!(
            question_id = %request.question_id,
            model = %self.model,
            "requesting question guidance"
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(request),
                },
            ],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "guidance API returned error");
            return Err(GuideError::Api {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let explanation = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GuideError::EmptyResponse)?;

        debug!(len = explanation.len(), "received guidance");

        Ok(Guidance {
            question_id: request.question_id.clone(),
            explanation,
            scoring_guidance: request.rubric.clone(),
            tips: Vec::new(),
            provider: self.name().to_string(),
            llm_powered: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_request;

    fn provider(url: &str) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(url, "test-key", "test-model", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_joins_base_url() {
        let p = provider("http://localhost:1234/v1/");
        assert_eq!(p.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn user_prompt_carries_rubric_and_message() {
        let mut req = sample_request();
        req.user_message = Some("Does a spreadsheet count?".to_string());
        let prompt = ChatCompletionsProvider::user_prompt(&req);
        assert!(prompt.contains("Question 1.2"));
        assert!(prompt.contains("  5: rubric level 5"));
        assert!(prompt.contains("Retail industry"));
        assert!(prompt.ends_with("The user asks: Does a spreadsheet count?"));
    }

    #[test]
    fn from_env_without_key_is_not_configured() {
        let err = ChatCompletionsProvider::from_env(
            "http://localhost",
            "READINESS_GUIDE_TEST_UNSET_KEY",
            "m",
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, GuideError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  Data quality means...  "}}]}"#)
            .create_async()
            .await;

        let g = provider(&server.url()).explain(&sample_request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(g.explanation, "Data quality means...");
        assert!(g.llm_powered);
        assert_eq!(g.provider, "chat_completions");
        assert_eq!(g.scoring_guidance.len(), 5);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = provider(&server.url()).explain(&sample_request()).await.unwrap_err();
        match err {
            GuideError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = provider(&server.url()).explain(&sample_request()).await.unwrap_err();
        assert!(matches!(err, GuideError::Parse(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = provider(&server.url()).explain(&sample_request()).await.unwrap_err();
        assert!(matches!(err, GuideError::EmptyResponse));
    }
}
