//! Windows-1252 text handling for Latin thermal printers
//!
//! Receipt printers sold in Nigeria ship with the Western code pages, so text
//! is transcoded to Windows-1252 (ESC t 16) instead of sending UTF-8.
//! The Naira sign has no code point there and is spelled `NGN`.
//! Any other unmappable character is printed as `?`.

use tracing::instrument;

/// Printer code page number for Windows-1252 (ESC t n)
pub(crate) const CP1252_PAGE: u8 = 16;

/// Replace characters the printer cannot show with printable equivalents
fn transliterate(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains('₦') {
        std::borrow::Cow::Owned(s.replace('₦', "NGN"))
    } else {
        std::borrow::Cow::Borrowed(s)
    }
}

/// Encode text to Windows-1252 bytes
#[instrument(level = "trace", skip_all, fields(len = s.len()))]
pub(crate) fn convert_to_cp1252(s: &str) -> Vec<u8> {
    let text = transliterate(s);
    let mut out = Vec::with_capacity(text.len());
    let mut utf8 = [0u8; 4];

    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut utf8));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

/// Greedy word wrap to lines of at most `width` printed characters
///
/// Words longer than a line are hard-split.
pub(crate) fn wrap_words(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let text = transliterate(s);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
