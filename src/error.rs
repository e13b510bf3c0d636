//! Error types for the img2alt library.
//!
//! Two tiers of error reflect two tiers of failure:
//!
//! * [`AltTextError`] — **Fatal**: the pipeline cannot produce any result
//!   (undecodable image, no caption endpoint configured). Returned as
//!   `Err(AltTextError)` from [`crate::process::process_image`].
//!
//! * [`OcrError`] / [`CaptionError`] — **Non-fatal**: one enrichment or
//!   synthesis stage failed but the pipeline still completes. OCR failure
//!   degrades to an empty transcript; caption failure degrades to a fixed
//!   fallback string. Neither ever crosses the coordinator boundary.
//!
//! The separation keeps the caller-facing contract simple: every valid image
//! yields *some* description, and the only surfaced error is an input the
//! pipeline could not read at all.

use thiserror::Error;

/// All fatal errors returned by the img2alt library.
///
/// Stage-level failures use [`OcrError`] and [`CaptionError`] and are
/// absorbed inside the pipeline rather than propagated here.
#[derive(Debug, Error)]
pub enum AltTextError {
    /// The uploaded bytes could not be decoded as a raster image.
    ///
    /// This is the only failure surfaced for a submitted image; everything
    /// downstream degrades to a fallback instead of aborting.
    #[error("Input is not a decodable image: {detail}")]
    InvalidImage { detail: String },

    /// No vision-language endpoint is configured (missing API key or base URL).
    #[error("Caption service '{service}' is not configured.\n{hint}")]
    ServiceNotConfigured { service: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (temp file creation, runtime setup).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure from the OCR service boundary.
///
/// [`Unavailable`](OcrError::Unavailable) is considered transient and is
/// retried up to the configured attempt ceiling;
/// [`Malformed`](OcrError::Malformed) means the service answered with an
/// unexpected shape, which retrying will not fix.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// Transport error or non-success HTTP status from the OCR endpoint.
    #[error("OCR service unavailable: {detail}")]
    Unavailable { detail: String },

    /// The OCR endpoint responded but the body was not the expected shape.
    #[error("OCR response malformed: {detail}")]
    Malformed { detail: String },
}

impl OcrError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OcrError::Unavailable { .. })
    }
}

/// A non-fatal failure from the vision-language service boundary.
///
/// Mapped to the fixed fallback description by
/// [`crate::pipeline::caption::synthesize`]; never retried and never
/// propagated past the caption stage.
#[derive(Debug, Clone, Error)]
pub enum CaptionError {
    /// The call itself failed: network, auth, or non-success status.
    #[error("Caption service call failed: {detail}")]
    Service { detail: String },
}
