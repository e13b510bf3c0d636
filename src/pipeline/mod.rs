//! Pipeline stages for alt-text synthesis.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different OCR backend) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ ocr ──▶ correct ──▶ prompt ──▶ caption ──▶ postprocess
//! (resize+jpeg) (HTTP)  (fuzzy)    (assemble)  (VLM call)  (cleanup)
//! ```
//!
//! 1. [`normalize`] — decode, cap width, re-encode to JPEG; the only stage
//!    that can fail the whole pipeline
//! 2. [`ocr`]       — call the OCR service with bounded retry; degrades to
//!    an empty transcript
//! 3. [`correct`]   — fuzzy-match fragments against the dictionary
//! 4. [`prompt`]    — select the instruction variant and fill the slots
//! 5. [`caption`]   — single vision-language call; degrades to a fixed
//!    fallback string
//! 6. [`postprocess`] — deterministic cleanup of model quirks (fences,
//!    quotes, labels)

pub mod caption;
pub mod correct;
pub mod normalize;
pub mod ocr;
pub mod postprocess;
pub mod prompt;
