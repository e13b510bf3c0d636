//! Text extraction: call the external OCR service with bounded retry.
//!
//! OCR is a best-effort enrichment stage, not a hard dependency: the
//! pipeline produces a caption with or without recognized text. Accordingly
//! this module never returns an error to the coordinator — transport
//! failures are retried up to the configured ceiling with a fixed delay,
//! and exhaustion (or a malformed response, which retrying cannot fix)
//! degrades to an empty [`OcrResult`].
//!
//! ## Retry Strategy
//!
//! The OCR sidecar is a single small service that either answers quickly or
//! is restarting; a fixed inter-attempt delay (default 2 s, 3 attempts)
//! covers the restart window without the complexity of exponential backoff.
//! The loop is explicitly bounded — the attempt counter is part of
//! [`ExtractionOutcome`] so the ceiling is trivially testable.

use crate::config::PipelineConfig;
use crate::error::OcrError;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// One recognized string in reading order.
///
/// The sequence is exactly what the remote service produced: never
/// re-sorted, never deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// The recognized text.
    pub text: String,
    /// 0-based position in reading order.
    pub index: usize,
    /// Extraction confidence when the service reports one.
    pub confidence: Option<f32>,
}

/// Separator used when joining fragments into [`OcrResult::joined`].
///
/// A newline keeps multi-line signage and documents line-accurate, which the
/// text-preservation prompt rules depend on. Part of the `OcrResult`
/// contract.
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Ordered OCR output: the fragment list plus the joined string.
///
/// Both fields are derived together at construction and never independently
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub fragments: Vec<TextFragment>,
    /// Fragments concatenated with [`FRAGMENT_SEPARATOR`], in order.
    pub joined: String,
}

impl OcrResult {
    /// Build from recognized strings in reading order.
    pub fn from_texts(texts: Vec<String>) -> Self {
        let joined = texts.join(FRAGMENT_SEPARATOR);
        let fragments = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| TextFragment {
                text,
                index,
                confidence: None,
            })
            .collect();
        Self { fragments, joined }
    }

    /// The degraded result: no fragments, empty joined string.
    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            joined: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The raw fragment texts, in order.
    pub fn texts(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.text.clone()).collect()
    }
}

/// What one extraction run produced, including how many attempts it took.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub result: OcrResult,
    /// Total attempts made (1 on first-try success).
    pub attempts: u32,
}

/// Boundary to an external OCR service.
///
/// The HTTP implementation lives in [`HttpOcrClient`]; tests inject
/// deterministic implementations through
/// [`crate::config::PipelineConfigBuilder::ocr_client`].
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Recognize text in `image`, returning fragments in reading order.
    async fn recognize(&self, image: &[u8], media_type: &str) -> Result<Vec<String>, OcrError>;
}

/// Run OCR with bounded retry, degrading to empty on failure.
///
/// `Unavailable` errors are retried after a fixed delay; `Malformed` aborts
/// immediately (the shape will not improve on a second call). In both
/// terminal failure cases the outcome carries [`OcrResult::empty`] and the
/// attempt count actually spent.
pub async fn extract_text(
    client: &dyn OcrClient,
    image: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> ExtractionOutcome {
    let max_attempts = config.ocr_max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            debug!(
                attempt,
                max_attempts,
                delay_ms = config.ocr_retry_delay_ms,
                "retrying OCR call"
            );
            sleep(Duration::from_millis(config.ocr_retry_delay_ms)).await;
        }

        match client.recognize(image, media_type).await {
            Ok(texts) => {
                debug!(fragments = texts.len(), attempt, "OCR succeeded");
                return ExtractionOutcome {
                    result: OcrResult::from_texts(texts),
                    attempts: attempt,
                };
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "OCR attempt failed");
            }
            Err(e) => {
                warn!(attempt, error = %e, "OCR gave up, continuing without text");
                return ExtractionOutcome {
                    result: OcrResult::empty(),
                    attempts: attempt,
                };
            }
        }
    }

    // Unreachable: the loop always returns, but keep the degraded shape.
    ExtractionOutcome {
        result: OcrResult::empty(),
        attempts: max_attempts,
    }
}

// ── HTTP client ──────────────────────────────────────────────────────────

/// Wire shape of the OCR service response.
///
/// The service always reports the joined string as `ocr_text`; newer
/// revisions additionally return the ordered `texts` list. When only the
/// joined form is present, fragments are recovered by splitting on lines.
#[derive(Debug, Deserialize)]
struct OcrWireResponse {
    #[serde(default)]
    texts: Option<Vec<String>>,
    #[serde(default)]
    ocr_text: Option<String>,
}

/// OCR over HTTP: multipart POST of the image bytes to a sidecar endpoint.
pub struct HttpOcrClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOcrClient {
    /// Create a client for the given endpoint (e.g. `http://localhost:5001/ocr`).
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrError::Unavailable {
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl OcrClient for HttpOcrClient {
    async fn recognize(&self, image: &[u8], media_type: &str) -> Result<Vec<String>, OcrError> {
        use reqwest::multipart::{Form, Part};

        // The declared media type may be absent or junk; fall back to a
        // generic part rather than failing the upload.
        let part = match Part::bytes(image.to_vec())
            .file_name("image")
            .mime_str(media_type)
        {
            Ok(p) => p,
            Err(_) => Part::bytes(image.to_vec()).file_name("image"),
        };
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::Unavailable {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Unavailable {
                detail: format!("HTTP {status}: {body}"),
            });
        }

        let wire: OcrWireResponse = response.json().await.map_err(|e| OcrError::Malformed {
            detail: e.to_string(),
        })?;

        let texts = match (wire.texts, wire.ocr_text) {
            (Some(texts), _) => texts,
            (None, Some(joined)) => joined
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            (None, None) => {
                return Err(OcrError::Malformed {
                    detail: "response has neither 'texts' nor 'ocr_text'".into(),
                })
            }
        };

        Ok(texts)
    }
}
