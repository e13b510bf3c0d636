//! Post-processing: deterministic cleanup of the model's description.
//!
//! Even well-prompted vision models occasionally dress the answer up in
//! ways an `alt` attribute must not carry: wrapping quotes, markdown
//! fences, an "Alt text:" label, stray zero-width characters. These rules
//! fix the quirks without touching content, and keeping them here rather
//! than in the prompt keeps the prompt focused on *what to describe*.
//!
//! ## Rule Order
//!
//! Fences are stripped before quotes (models nest them in that order),
//! labels before whitespace collapsing so the label regex sees line starts,
//! and the final trim runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip an outer markdown fence
/// 2. Strip a leading "Alt text:" / "Alt:" / "Description:" label
/// 3. Strip one pair of wrapping quotes
/// 4. Remove invisible Unicode (zero-width spaces, BOM, word joiners)
/// 5. Collapse whitespace runs (including newlines) to single spaces
/// 6. Trim
///
/// Each rule is a pure `&str → String` pass; the result may be empty, which
/// the caption stage treats as an empty response.
pub fn clean_caption(input: &str) -> String {
    let s = strip_fences(input);
    let s = strip_label(&s);
    let s = strip_wrapping_quotes(&s);
    let s = remove_invisible_chars(&s);
    let s = collapse_whitespace(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:\w+)?\n?(.*?)\n?```\s*$").unwrap());

fn strip_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Strip a leading label ────────────────────────────────────────

static RE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:alt(?:\s+text)?|description)\s*:\s*").unwrap());

fn strip_label(input: &str) -> String {
    RE_LABEL.replace(input, "").to_string()
}

// ── Rule 3: Strip one pair of wrapping quotes ────────────────────────────

fn strip_wrapping_quotes(input: &str) -> String {
    let t = input.trim();
    let pairs = [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')];
    for (open, close) in pairs {
        if t.len() >= 2 && t.starts_with(open) && t.ends_with(close) {
            let inner = &t[open.len_utf8()..t.len() - close.len_utf8()];
            // Only unwrap when the quotes are a wrapper, not content.
            if !inner.contains(open) && !inner.contains(close) {
                return inner.to_string();
            }
        }
    }
    t.to_string()
}

// ── Rule 4: Remove invisible Unicode ─────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    const INVISIBLE: [char; 5] = ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'];
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

// ── Rule 5: Collapse whitespace runs ─────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean_caption("A welcome banner."), "A welcome banner.");
    }

    #[test]
    fn strips_markdown_fence() {
        assert_eq!(clean_caption("```\nA banner.\n```"), "A banner.");
        assert_eq!(clean_caption("```text\nA banner.\n```"), "A banner.");
    }

    #[test]
    fn strips_alt_text_label() {
        assert_eq!(clean_caption("Alt text: A banner."), "A banner.");
        assert_eq!(clean_caption("Description: A banner."), "A banner.");
        assert_eq!(clean_caption("alt: A banner."), "A banner.");
    }

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(clean_caption("\"A banner.\""), "A banner.");
        assert_eq!(clean_caption("\u{201C}배너 이미지\u{201D}"), "배너 이미지");
    }

    #[test]
    fn keeps_interior_quotes() {
        assert_eq!(
            clean_caption("A sign reading \"open\" on a door."),
            "A sign reading \"open\" on a door."
        );
    }

    #[test]
    fn collapses_newlines_to_spaces() {
        assert_eq!(clean_caption("A banner.\nRed background."), "A banner. Red background.");
    }

    #[test]
    fn removes_invisible_chars() {
        assert_eq!(clean_caption("A\u{200B} banner\u{FEFF}."), "A banner.");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(clean_caption("  \n\t "), "");
    }
}
