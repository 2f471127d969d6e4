//! Text shaping for narration.

use crate::content::Section;
use unicode_normalization::UnicodeNormalization;

/// Utterance text for a section: title, separator, then body.
pub fn narration_text(section: &Section, separator: &str) -> String {
    let mut text = String::with_capacity(
        section.title.len() + separator.len() + section.content.len(),
    );
    text.push_str(section.title.trim());
    text.push_str(separator);
    text.push_str(section.content.trim());
    normalize_for_speech(&text)
}

/// NFKC-normalize and collapse runs of whitespace to single spaces.
pub fn normalize_for_speech(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    let mut out = String::with_capacity(normalized.len());
    for word in normalized.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
