//! Model collaborators for logdigest
//!
//! This crate provides the failure classifier and the summarizer, the wire
//! types they exchange, and an Azure OpenAI chat-completions backend.

mod azure;
mod prompt;
mod wire;

use async_trait::async_trait;

use logdigest_types::ContextPayload;

pub use azure::{AzureOpenAiClient, LlmConfig};
pub use prompt::{FILTER_FAILURES_TEMPLATE, SUMMARIZE_TEMPLATE, build_prompt, extract_json_block};
pub use wire::{ClassificationRequest, ClassificationResponse, MessageIdEntry};

/// Errors raised by a model collaborator
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("AZURE_OPENAI_API_KEY is not set; unable to make requests to Azure OpenAI")]
    MissingCredentials,

    #[error("model configuration is incomplete: {0} is not set")]
    MissingSetting(&'static str),

    #[error("request to model endpoint failed")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("model returned no choices")]
    EmptyResponse,
}

impl LlmError {
    /// Whether the error concerns one response rather than the endpoint itself.
    ///
    /// Recoverable errors only void the request that produced them; the rest
    /// mean the collaborator is unavailable and the run cannot continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::EmptyResponse)
    }
}

/// Judges which log messages indicate failures
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the raw JSON reply; callers validate its shape with
    /// [`ClassificationResponse::from_value`]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<serde_json::Value, LlmError>;
}

/// Produces a free-form summary of contextualized failures
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, payload: &ContextPayload) -> Result<String, LlmError>;
}
