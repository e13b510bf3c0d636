//! Pipeline coordinator: the library's invocation surface.
//!
//! One request runs as a single logical task whose stages execute strictly
//! in sequence — the description is intentionally informed by OCR output,
//! so there is nothing to parallelise inside a request. Per request the
//! state progression is:
//!
//! ```text
//! Start → Normalized → (Extracted | ExtractionSkipped) → Corrected
//!       → Prompted → Captioned → Done
//! ```
//!
//! Terminal states are always reached: OCR failure degrades to empty text
//! and caption failure degrades to a fallback string. The only hard
//! failure that aborts before `Done` is an input that cannot be decoded at
//! all. On every path — `Done` or abort — the temporary upload backing
//! store is released.

use crate::asset::ImageAsset;
use crate::config::{PipelineConfig, DEFAULT_MODEL};
use crate::error::AltTextError;
use crate::output::{AltTextResult, PipelineStats};
use crate::pipeline::caption::{self, CaptionClient, HttpCaptionClient};
use crate::pipeline::correct;
use crate::pipeline::normalize;
use crate::pipeline::ocr::{self, HttpOcrClient, OcrClient, OcrResult};
use crate::pipeline::prompt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default chat-completions endpoint when none is configured.
const DEFAULT_API_BASE: &str = "https://router.huggingface.co/v1/chat/completions";

/// Generate alt text for an uploaded image.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `bytes` — Raw uploaded image bytes
/// * `media_type` — Declared media type of the upload (e.g. `image/png`)
/// * `config` — Pipeline configuration
///
/// # Returns
/// `Ok(AltTextResult)` for every decodable image — including runs where the
/// OCR or caption service failed (check for the fallback strings
/// [`caption::GENERATION_FAILED`] / [`caption::GENERATION_ERROR`]).
///
/// # Errors
/// * [`AltTextError::InvalidImage`] — the bytes are empty or not a raster image
/// * [`AltTextError::ServiceNotConfigured`] — no caption endpoint/key available
pub async fn process_image(
    bytes: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> Result<AltTextResult, AltTextError> {
    let total_start = Instant::now();

    // Resolve the caption client before any work: a misconfigured process
    // should fail fast, not after paying for normalization and OCR.
    let captioner = resolve_caption_client(config)?;
    let ocr_client = resolve_ocr_client(config);

    let asset = ImageAsset::from_bytes(bytes, media_type)?;
    info!(bytes = bytes.len(), media_type, "processing image");

    // ── Normalize ────────────────────────────────────────────────────────
    let normalize_start = Instant::now();
    let normalized = match normalize::normalize(&asset, config) {
        Ok(n) => n,
        Err(e) => {
            // Abort path still releases the backing store.
            asset.release();
            return Err(e);
        }
    };
    let normalize_ms = normalize_start.elapsed().as_millis() as u64;

    // ── Extract text (best effort) ───────────────────────────────────────
    let ocr_start = Instant::now();
    let outcome = match &ocr_client {
        Some(client) => Some(
            ocr::extract_text(client.as_ref(), asset.bytes(), asset.media_type(), config).await,
        ),
        None => {
            debug!("no OCR endpoint configured, skipping extraction");
            None
        }
    };
    let ocr_ms = ocr_start.elapsed().as_millis() as u64;

    // ── Correct ──────────────────────────────────────────────────────────
    let (ocr_texts, corrected_joined, ocr_attempts) = match &outcome {
        Some(o) => {
            let corrected = correct_result(&o.result, config);
            (Some(o.result.texts()), corrected, Some(o.attempts))
        }
        None => (None, String::new(), None),
    };

    // ── Prompt + synthesize ──────────────────────────────────────────────
    let spec = prompt::build_prompt(&corrected_joined, &normalized, config);
    debug!(
        preserves_text = spec.preserves_text(),
        "built caption request"
    );

    let caption_start = Instant::now();
    let alt_tag = caption::synthesize(captioner.as_ref(), spec).await;
    let caption_ms = caption_start.elapsed().as_millis() as u64;

    // ── Done ─────────────────────────────────────────────────────────────
    asset.release();

    let stats = PipelineStats {
        normalize_ms,
        ocr_ms,
        ocr_attempts,
        caption_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        alt_chars = alt_tag.len(),
        total_ms = stats.total_ms,
        "pipeline done"
    );

    Ok(AltTextResult {
        alt_tag,
        ocr_texts,
        stats,
    })
}

/// Synchronous wrapper around [`process_image`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_image_sync(
    bytes: &[u8],
    media_type: &str,
    config: &PipelineConfig,
) -> Result<AltTextResult, AltTextError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AltTextError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(process_image(bytes, media_type, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Correct each fragment against the dictionary and re-join.
///
/// Correction is per fragment, not on the joined string — a line of signage
/// is the unit the dictionary entries were written for.
fn correct_result(result: &OcrResult, config: &PipelineConfig) -> String {
    result
        .fragments
        .iter()
        .map(|f| {
            correct::correct(&f.text, &config.dictionary, config.similarity_threshold).corrected
        })
        .collect::<Vec<_>>()
        .join(ocr::FRAGMENT_SEPARATOR)
}

/// Resolve the OCR client, most-specific to least-specific.
///
/// 1. Pre-built client in the config (tests, middleware).
/// 2. `ocr_endpoint` config field.
/// 3. `IMG2ALT_OCR_URL` environment variable.
///
/// No source configured means the OCR stage is skipped — OCR is an
/// enrichment, not a requirement, so this is not an error.
fn resolve_ocr_client(config: &PipelineConfig) -> Option<Arc<dyn OcrClient>> {
    if let Some(ref client) = config.ocr {
        return Some(Arc::clone(client));
    }

    let endpoint = config
        .ocr_endpoint
        .clone()
        .or_else(|| std::env::var("IMG2ALT_OCR_URL").ok().filter(|v| !v.is_empty()))?;

    match HttpOcrClient::new(endpoint, config.ocr_timeout_secs) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "could not build OCR client, skipping extraction");
            None
        }
    }
}

/// Resolve the caption client, most-specific to least-specific.
///
/// 1. Pre-built client in the config.
/// 2. Config fields (`api_base`, `api_key`, `model`).
/// 3. Environment (`IMG2ALT_API_BASE`, `IMG2ALT_API_KEY`, then the
///    `HUGGING_FACE_API_KEY` the deployed service used, `IMG2ALT_MODEL`).
///
/// Unlike OCR, captioning is the product — no source configured is fatal.
fn resolve_caption_client(
    config: &PipelineConfig,
) -> Result<Arc<dyn CaptionClient>, AltTextError> {
    if let Some(ref client) = config.captioner {
        return Ok(Arc::clone(client));
    }

    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("IMG2ALT_API_KEY").ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            std::env::var("HUGGING_FACE_API_KEY")
                .ok()
                .filter(|v| !v.is_empty())
        })
        .ok_or_else(|| AltTextError::ServiceNotConfigured {
            service: "caption".into(),
            hint: "Set IMG2ALT_API_KEY or HUGGING_FACE_API_KEY, or inject a client via \
                   PipelineConfigBuilder::caption_client."
                .into(),
        })?;

    let endpoint = config
        .api_base
        .clone()
        .or_else(|| std::env::var("IMG2ALT_API_BASE").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let model = config
        .model
        .clone()
        .or_else(|| std::env::var("IMG2ALT_MODEL").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let client = HttpCaptionClient::new(endpoint, api_key, model, config).map_err(|e| {
        AltTextError::ServiceNotConfigured {
            service: "caption".into(),
            hint: e.to_string(),
        }
    })?;

    Ok(Arc::new(client))
}
