//! Instruction templates for alt-text synthesis.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening a rule (length cap, table
//!    handling) means editing exactly one place.
//!
//! 2. **Testability** — unit tests can assert which variant a request uses
//!    and that the OCR slot was filled, without touching the network.
//!
//! Two variants exist because the instruction set depends on whether OCR
//! found text: the text-preservation rules only make sense when there is
//! text to preserve, and leaving them in for a text-free photo makes models
//! hallucinate captions "quoting" text that is not there. Callers can
//! override the system instruction via
//! [`crate::config::PipelineConfig::system_prompt`].

/// System instruction used when OCR produced text to preserve.
pub const TEXT_PRESERVATION_PROMPT: &str = r#"You are an accessibility assistant. Write one alt text description for the image you are given.

Follow these rules precisely:

1. TEXT PRESERVATION
   - The recognized text supplied with the image must appear verbatim in your description
   - Keep multi-line text line by line, in the given order
   - Do not translate, paraphrase, or "fix" the recognized text

2. SCENE
   - After the text, briefly describe what the image shows (subject, layout, notable colors)

3. TABLES AND DOCUMENTS
   - For tables, state what the table is about and its key figures
   - For documents and forms, name the document type and its headline content

4. LENGTH AND LANGUAGE
   - At most two sentences beyond the preserved text
   - Write in the same language as the text in the image

5. OUTPUT FORMAT
   - Output ONLY the description
   - No quotes, no markdown, no "Alt text:" prefix, no commentary"#;

/// System instruction used when OCR found no text (scene description only).
pub const SCENE_ONLY_PROMPT: &str = r#"You are an accessibility assistant. Write one alt text description for the image you are given.

Follow these rules precisely:

1. SCENE
   - Describe the main subject first, then the setting, layout, and notable colors
   - If small illegible text is visible, say so without guessing its content

2. LENGTH AND LANGUAGE
   - One or two sentences
   - Use the language most natural for the image content

3. OUTPUT FORMAT
   - Output ONLY the description
   - No quotes, no markdown, no "Alt text:" prefix, no commentary"#;

/// Build the user-turn text for the text-preservation variant.
///
/// The recognized (and corrected) text is the only slot; the image itself
/// travels as a separate attachment part.
pub fn user_instruction(ocr_text: &str) -> String {
    format!(
        "Text recognized in the image, in reading order:\n\"\"\"\n{}\n\"\"\"\nWrite the alt text now.",
        ocr_text
    )
}

/// User-turn text for the scene-only variant.
pub const SCENE_USER_INSTRUCTION: &str =
    "No text was recognized in the image. Write the alt text now.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_instruction_embeds_ocr_text() {
        let u = user_instruction("웰컴저축은행\n대출 안내");
        assert!(u.contains("웰컴저축은행\n대출 안내"));
    }

    #[test]
    fn variants_differ_on_text_rules() {
        assert!(TEXT_PRESERVATION_PROMPT.contains("TEXT PRESERVATION"));
        assert!(!SCENE_ONLY_PROMPT.contains("TEXT PRESERVATION"));
    }
}
