//! Result types returned by the pipeline.

use serde::{Deserialize, Serialize};

/// The terminal artifact of a pipeline run, owned by the caller.
///
/// Serializes to the wire shape the HTTP layer returns verbatim:
/// `{ "altTag": "...", "ocrTexts": ["..."] }`, with `ocrTexts` present only
/// when an OCR stage actually executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltTextResult {
    /// The generated description. Always non-empty: fallback strings
    /// substitute for a true caption when synthesis fails.
    #[serde(rename = "altTag")]
    pub alt_tag: String,

    /// Raw OCR fragments in reading order, pre-correction.
    ///
    /// `Some` (possibly empty) when the OCR stage ran; `None` when it was
    /// skipped because no OCR endpoint was configured.
    #[serde(rename = "ocrTexts", skip_serializing_if = "Option::is_none")]
    pub ocr_texts: Option<Vec<String>>,

    /// Per-stage timing and attempt accounting. Not part of the wire shape.
    #[serde(skip)]
    pub stats: PipelineStats,
}

/// Timing and attempt accounting for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub normalize_ms: u64,
    pub ocr_ms: u64,
    /// Total OCR attempts made; `None` when the stage was skipped.
    pub ocr_attempts: Option<u32>,
    pub caption_ms: u64,
    pub total_ms: u64,
}
