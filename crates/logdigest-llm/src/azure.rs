use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use logdigest_types::ContextPayload;

use crate::prompt::{FILTER_FAILURES_TEMPLATE, SUMMARIZE_TEMPLATE, build_prompt, extract_json_block};
use crate::{ClassificationRequest, Classifier, LlmError, Summarizer};

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert software support agent. You are helping a customer troubleshoot an issue with their kubernetes pod logs.";

/// Settings for the Azure OpenAI backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: Option<String>,

    /// Model deployment name
    pub deployment: Option<String>,

    pub api_version: String,
    pub system_prompt: String,

    /// Token budget for classification replies
    pub filter_max_tokens: u32,

    /// Token budget for the summary
    pub summary_max_tokens: u32,

    pub temperature: f64,
    pub top_p: f64,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: None,
            api_version: "2024-05-01-preview".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            filter_max_tokens: 4096,
            summary_max_tokens: 1024,
            temperature: 0.7,
            top_p: 0.95,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Fill unset endpoint/deployment from the environment
    pub fn with_env_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.endpoint.is_none() {
            self.endpoint = lookup("AZURE_OPENAI_ENDPOINT");
        }
        if self.deployment.is_none() {
            self.deployment = lookup("AZURE_DEPLOYMENT_NAME");
        }
        self
    }

    /// Chat-completions URL for the configured deployment
    pub fn completions_url(&self) -> Result<String, LlmError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(LlmError::MissingSetting("endpoint"))?;
        let deployment = self
            .deployment
            .as_deref()
            .ok_or(LlmError::MissingSetting("deployment"))?;
        Ok(format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            self.api_version
        ))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Azure OpenAI chat-completions client
pub struct AzureOpenAiClient {
    client: reqwest::Client,
    config: LlmConfig,
    url: String,
    api_key: String,
}

impl AzureOpenAiClient {
    /// Create a client; fails before any request if settings are missing
    pub fn new(config: LlmConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingCredentials)?;
        let url = config.completions_url()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            url,
            api_key,
        })
    }

    /// Create a client with credentials and fallback settings from the environment
    pub fn from_env(config: LlmConfig) -> Result<Self, LlmError> {
        let config = config.with_env_fallback(|key| std::env::var(key).ok());
        Self::new(config, std::env::var("AZURE_OPENAI_API_KEY").ok())
    }

    /// Send one system + user exchange and return the assistant's reply
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_chat_response(&body)
    }
}

/// Pull the assistant's text out of a chat-completions body.
///
/// A body that is not a chat-completion object is a malformed reply, not a
/// transport failure.
fn parse_chat_response(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid chat completion: {}", e)))?;
    if let Some(usage) = &response.usage {
        tracing::debug!(
            total = usage.total_tokens,
            prompt = usage.prompt_tokens,
            completion = usage.completion_tokens,
            "model token usage"
        );
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(LlmError::EmptyResponse)
}

/// Parse the JSON object a classification reply carries
fn parse_classification_reply(reply: &str) -> Result<serde_json::Value, LlmError> {
    let block = extract_json_block(reply).ok_or_else(|| {
        LlmError::MalformedResponse(format!("no JSON block in reply: {}", reply))
    })?;
    serde_json::from_str(block).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl Classifier for AzureOpenAiClient {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<serde_json::Value, LlmError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        let prompt = build_prompt(FILTER_FAILURES_TEMPLATE, &payload);

        let reply = self.complete(&prompt, self.config.filter_max_tokens).await?;
        parse_classification_reply(&reply)
    }
}

#[async_trait]
impl Summarizer for AzureOpenAiClient {
    async fn summarize(&self, payload: &ContextPayload) -> Result<String, LlmError> {
        let payload = payload
            .to_json()
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        let prompt = build_prompt(SUMMARIZE_TEMPLATE, &payload);
        self.complete(&prompt, self.config.summary_max_tokens).await
    }
}
