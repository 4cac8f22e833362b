//! Pattern heuristics for error codes and barcodes.
//!
//! Recognized text from equipment labels is noisy; these extractors pull the
//! value the technician actually wants out of it. Pattern order matters —
//! the first match wins — so the lists below run from most to least
//! specific, mirroring how codes appear on petroleum dispensers and pumps.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// `ERROR: 47`, `ERR-102`, `CODE 8`, `E03` — prefix plus 1–4 digits.
static CODE_WITH_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ERROR|ERR|CODE|E)\s*[:-]?\s*(\d{1,4})\b").unwrap()
});

/// `AB1234` — uppercase letters running into 1–4 digits.
static LETTERS_THEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]+\d{1,4}\b").unwrap());

/// A bare 1–4 digit number, the last resort.
static BARE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,4}\b").unwrap());

/// Extract an error code from recognized text.
///
/// Tries, in order: a prefixed code (capturing only the digits), an
/// uppercase-letters-plus-digits code (whole match), then any bare 1–4 digit
/// number. Returns `None` when nothing matches; the raw text is still useful
/// to the caller in that case.
pub fn extract_error_code(text: &str) -> Option<String> {
    if let Some(caps) = CODE_WITH_PREFIX.captures(text) {
        return Some(caps[1].to_string());
    }
    if let Some(m) = LETTERS_THEN_DIGITS.find(text) {
        return Some(m.as_str().to_string());
    }
    BARE_DIGITS.find(text).map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Barcodes
// ---------------------------------------------------------------------------

/// Known symbology shapes, most specific first.
static BARCODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^\d{12,14}$").unwrap(),          // UPC/EAN
        Regex::new(r"^[A-Z0-9]{6,20}$").unwrap(),     // general alphanumeric
        Regex::new(r"^\d{6,20}$").unwrap(),           // numeric
        Regex::new(r"^[A-Z]{2,4}\d{4,12}$").unwrap(), // manufacturer prefix
        Regex::new(r"^\d{4}-\d{4}-\d{4}$").unwrap(),  // hyphen-grouped
    ]
});

/// Anything that cannot appear in a barcode value.
static NON_BARCODE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Z0-9-]").unwrap());

/// Minimum cleaned length for the accept-anyway fallback.
const BARCODE_FALLBACK_MIN_LEN: usize = 6;

/// Extract a barcode value from recognized text.
///
/// The text is cleaned down to `[A-Z0-9-]` first. Each symbology pattern is
/// tested against the cleaned text, then the raw text. When nothing matches
/// but the cleaned text is at least six characters, the cleaned text is
/// accepted wholesale — a best-effort default, not a validated symbology, so
/// a misread never blocks the technician.
pub fn extract_barcode(text: &str) -> Option<String> {
    let cleaned = NON_BARCODE_CHARS.replace_all(text, "").into_owned();

    for pattern in BARCODE_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            return Some(cleaned);
        }
        if pattern.is_match(text) {
            return Some(text.to_string());
        }
    }

    if cleaned.len() >= BARCODE_FALLBACK_MIN_LEN {
        return Some(cleaned);
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
