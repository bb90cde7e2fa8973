use super::builder::OptimizerClientBuilder;
use super::service::AnalysisService;
use crate::config::AnalyzerConfig;
use crate::transport::HttpTransport;
use crate::types::{AnalysisRequest, AnalysisResult, ChatMessage, Conversation, SummaryResult};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ANALYZE_FALLBACK_MESSAGE: &str = "An unknown error occurred in the analysis service.";
pub const SUMMARIZE_FALLBACK_MESSAGE: &str = "Failed to fetch optimization results.";
pub const CHAT_FALLBACK_MESSAGE: &str = "An unexpected error occurred.";
pub const CHAT_CONNECTION_MESSAGE: &str =
    "Error: I couldn't connect to the backend. Please ensure it's running.";

const TOKENIZE_PATH: &str = "/tokenize";
const SUMMARIZE_PATH: &str = "/optimizer/summarize";
const GENERATE_PATH: &str = "/generate";

#[derive(Serialize)]
struct TokenizeBody<'a> {
    model: &'a str,
    text: &'a str,
    detailed: bool,
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generated_text: Option<String>,
}

/// HTTP client for the optimizer service (`/tokenize`,
/// `/optimizer/summarize`, `/generate`).
#[derive(Debug, Clone)]
pub struct OptimizerClient {
    pub(crate) transport: HttpTransport,
}

impl OptimizerClient {
    pub fn builder() -> OptimizerClientBuilder {
        OptimizerClientBuilder::new()
    }

    /// Client for the configured address; fails if the address is missing.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let mut builder = Self::builder().base_url(config.api_url()?);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url().as_str()
    }

    /// Tokenize `text` for `model_id` (one `POST /tokenize` with `detailed: true`).
    pub async fn analyze(&self, model_id: &str, text: &str) -> Result<AnalysisResult> {
        debug!(model = model_id, chars = text.chars().count(), "requesting analysis");
        let body = TokenizeBody {
            model: model_id,
            text,
            detailed: true,
        };
        self.transport
            .post_json(TOKENIZE_PATH, &body, ANALYZE_FALLBACK_MESSAGE)
            .await
    }

    /// Summarize `text` with `model_id` (one `POST /optimizer/summarize`).
    pub async fn summarize(&self, text: &str, model_id: &str) -> Result<SummaryResult> {
        debug!(model = model_id, "requesting summary");
        let body = SummarizeBody {
            text,
            model: model_id,
        };
        self.transport
            .post_json(SUMMARIZE_PATH, &body, SUMMARIZE_FALLBACK_MESSAGE)
            .await
    }

    /// Send `messages` to `POST /generate` and return the generated text.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = GenerateBody { messages };
        let response: GenerateResponse = self
            .transport
            .post_json(GENERATE_PATH, &body, CHAT_FALLBACK_MESSAGE)
            .await?;
        Ok(response
            .generated_text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| CHAT_FALLBACK_MESSAGE.to_string()))
    }

    /// One chat turn: records the user message, sends it (with or without the
    /// history, per the conversation's context toggle) and records the reply.
    ///
    /// On failure the conversation gets the connection apology as the model's
    /// turn and the error is returned.
    pub async fn chat(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
    ) -> Result<String> {
        if user_message.trim().is_empty() {
            return Err(Error::validation_with_context(
                "message must not be empty",
                ErrorContext::new().with_source("chat"),
            ));
        }
        let outgoing = conversation.outgoing(user_message);
        conversation.push(ChatMessage::user(user_message));
        info!(
            context = conversation.context_enabled(),
            sent = outgoing.len(),
            "sending chat turn"
        );
        match self.generate(&outgoing).await {
            Ok(reply) => {
                conversation.push(ChatMessage::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                conversation.push(ChatMessage::model(CHAT_CONNECTION_MESSAGE));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl AnalysisService for OptimizerClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        OptimizerClient::analyze(self, &request.model_id, &request.text).await
    }

    async fn summarize(&self, request: &AnalysisRequest) -> Result<SummaryResult> {
        OptimizerClient::summarize(self, &request.text, &request.model_id).await
    }
}
