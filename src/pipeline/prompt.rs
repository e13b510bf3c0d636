//! Prompt assembly: combine instruction text, OCR text, and the image.
//!
//! Pure construction — no I/O, no side effects. The instruction text lives
//! in [`crate::prompts`]; this stage only selects the variant and fills the
//! slots, so prompt wording and request assembly stay independently
//! testable.

use crate::config::PipelineConfig;
use crate::pipeline::normalize::NormalizedImage;
use crate::prompts;

/// A single structured captioning request.
///
/// Immutable once built; consumed exactly once by the caption stage.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// System instruction (rule set).
    pub system: String,
    /// User-turn text (OCR slot filled, or the scene-only line).
    pub user: String,
    /// The normalized image as an inline base64 data URI.
    pub image_data_uri: String,
}

impl PromptSpec {
    /// Whether this request carries text-preservation directives.
    pub fn preserves_text(&self) -> bool {
        self.system.contains("TEXT PRESERVATION")
    }
}

/// Select the instruction variant and assemble the request.
///
/// Empty (or whitespace-only) OCR text selects the scene-only variant; a
/// config-level system prompt override replaces the rule set for both
/// variants.
pub fn build_prompt(
    ocr_text: &str,
    image: &NormalizedImage,
    config: &PipelineConfig,
) -> PromptSpec {
    let has_text = !ocr_text.trim().is_empty();

    let system = match &config.system_prompt {
        Some(custom) => custom.clone(),
        None if has_text => prompts::TEXT_PRESERVATION_PROMPT.to_string(),
        None => prompts::SCENE_ONLY_PROMPT.to_string(),
    };

    let user = if has_text {
        prompts::user_instruction(ocr_text)
    } else {
        prompts::SCENE_USER_INSTRUCTION.to_string()
    };

    PromptSpec {
        system,
        user,
        image_data_uri: image.to_data_uri(),
    }
}
