//! Caption synthesis: call the vision-language endpoint, or fall back.
//!
//! Unlike the OCR stage this makes exactly one attempt. The caption is the
//! product of the whole pipeline, so a retry here would double the most
//! expensive call for a request the caller can simply re-submit; instead
//! every failure class maps onto one of two fixed fallback strings, keeping
//! the "every valid image yields some description" guarantee:
//!
//! * [`GENERATION_FAILED`] — the endpoint answered but produced nothing
//!   usable (empty choices, blank content, undecodable body).
//! * [`GENERATION_ERROR`] — the call itself failed (network, auth,
//!   non-success status).

use crate::config::PipelineConfig;
use crate::error::CaptionError;
use crate::pipeline::postprocess;
use crate::pipeline::prompt::PromptSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Fallback description when the endpoint responded without usable content.
pub const GENERATION_FAILED: &str = "generation failed";

/// Fallback description when the call itself failed.
pub const GENERATION_ERROR: &str = "generation error";

/// What the vision-language endpoint returned on a completed call.
///
/// `content: None` covers an empty choices list and a missing content
/// field alike — both mean "answered, nothing usable".
#[derive(Debug, Clone)]
pub struct CaptionResponse {
    pub content: Option<String>,
}

/// Boundary to an external vision-language inference service.
///
/// The HTTP implementation lives in [`HttpCaptionClient`]; tests inject
/// deterministic implementations through
/// [`crate::config::PipelineConfigBuilder::caption_client`].
#[async_trait]
pub trait CaptionClient: Send + Sync {
    async fn complete(&self, spec: &PromptSpec) -> Result<CaptionResponse, CaptionError>;
}

/// Run the captioning call and map every failure to a fallback string.
///
/// The returned description is always non-empty. Successful content is
/// cleaned by [`postprocess::clean_caption`]; if cleaning leaves nothing,
/// that counts as an empty response.
pub async fn synthesize(client: &dyn CaptionClient, spec: PromptSpec) -> String {
    let start = Instant::now();

    match client.complete(&spec).await {
        Ok(response) => {
            let cleaned = response
                .content
                .as_deref()
                .map(postprocess::clean_caption)
                .unwrap_or_default();

            if cleaned.is_empty() {
                warn!("caption endpoint returned no usable content");
                return GENERATION_FAILED.to_string();
            }

            debug!(
                chars = cleaned.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "caption synthesized"
            );
            cleaned
        }
        Err(e) => {
            warn!(error = %e, "caption call failed");
            GENERATION_ERROR.to_string()
        }
    }
}

// ── HTTP client ──────────────────────────────────────────────────────────

/// Chat-completions client for an OpenAI-compatible vision endpoint.
///
/// The request is a single chat turn pair: the system rule set plus a user
/// message whose content parts are the instruction text and the normalized
/// image as an inline data URI.
pub struct HttpCaptionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpCaptionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        config: &PipelineConfig,
    ) -> Result<Self, CaptionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| CaptionError::Service {
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CaptionClient for HttpCaptionClient {
    async fn complete(&self, spec: &PromptSpec) -> Result<CaptionResponse, CaptionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(spec.system.clone()),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: spec.user.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: spec.image_data_uri.clone(),
                            },
                        },
                    ]),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(model = %self.model, "sending caption request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Service {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptionError::Service {
                detail: format!("HTTP {status}: {body}"),
            });
        }

        // A 2xx with an undecodable body is "answered, nothing usable",
        // not a service error.
        let parsed: ChatResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "caption response body undecodable");
                return Ok(CaptionResponse { content: None });
            }
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(CaptionResponse { content })
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
