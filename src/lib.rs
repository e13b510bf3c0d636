//! # img2alt
//!
//! Generate accessibility descriptions ("alt text") for images by fusing
//! optical text extraction with a vision-language captioning model.
//!
//! ## Why this crate?
//!
//! Captioning models alone describe scenes well but garble the text inside
//! them — and for banners, signage, and document screenshots the text *is*
//! the content. This crate runs OCR first, corrects the recognized
//! fragments against a domain vocabulary, and then hands both the text and
//! the image to the caption model with explicit preservation rules, so the
//! description keeps brand names and line order intact.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes
//!  │
//!  ├─ 1. Normalize  decode, cap width at 512 px, re-encode JPEG q80
//!  ├─ 2. OCR        external service, 3 attempts / 2 s apart, best effort
//!  ├─ 3. Correct    fuzzy-match fragments against the dictionary (≥ 0.7)
//!  ├─ 4. Prompt     text-preservation or scene-only instruction variant
//!  ├─ 5. Caption    one vision-language call, fallback string on failure
//!  └─ 6. Output     AltTextResult { altTag, ocrTexts? }
//! ```
//!
//! Every stage past normalization degrades instead of failing: a valid
//! image always yields *some* description.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2alt::{process_image, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key auto-detected from IMG2ALT_API_KEY / HUGGING_FACE_API_KEY
//!     let config = PipelineConfig::builder()
//!         .ocr_endpoint("http://localhost:5001/ocr")
//!         .build()?;
//!     let bytes = std::fs::read("banner.png")?;
//!     let result = process_image(&bytes, "image/png", &config).await?;
//!     println!("{}", result.alt_tag);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2alt` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2alt = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod asset;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use asset::ImageAsset;
pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_MODEL};
pub use error::{AltTextError, CaptionError, OcrError};
pub use output::{AltTextResult, PipelineStats};
pub use pipeline::caption::{CaptionClient, CaptionResponse, GENERATION_ERROR, GENERATION_FAILED};
pub use pipeline::correct::{Correction, Dictionary};
pub use pipeline::normalize::NormalizedImage;
pub use pipeline::ocr::{ExtractionOutcome, OcrClient, OcrResult, TextFragment};
pub use pipeline::prompt::PromptSpec;
pub use process::{process_image, process_image_sync};
