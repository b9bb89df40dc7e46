//! Shortcode codec
//!
//! Public post URLs carry a shortcode (`https://www.instagram.com/p/{shortcode}/`)
//! while the private API addresses media by numeric id. A shortcode is the
//! numeric id written in base 64 over a fixed alphabet, most significant
//! digit first.

use once_cell::sync::Lazy;

/// Digit alphabet, in value order
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Reverse lookup from byte to digit value
static DIGIT_VALUES: Lazy<[Option<u8>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for (value, &byte) in ALPHABET.iter().enumerate() {
        table[byte as usize] = Some(value as u8);
    }
    table
});

const PERMALINK_MARKERS: [&str; 3] = ["/p/", "/reel/", "/tv/"];

/// Decode a shortcode into its numeric media id
///
/// # Examples
///
/// ```
/// use post_archiver::shortcode;
///
/// assert_eq!(shortcode::decode("A").unwrap(), 0);
/// assert_eq!(shortcode::decode("a").unwrap(), 26);
/// assert_eq!(shortcode::decode("BA").unwrap(), 64);
/// assert!(shortcode::decode("ab!").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ShortcodeError::InvalidIdentifier`] if the input is empty or
/// contains a character outside the alphabet, and
/// [`ShortcodeError::Overflow`] if the value does not fit in 64 bits.
pub fn decode(shortcode: &str) -> Result<u64, ShortcodeError> {
    if shortcode.is_empty() {
        return Err(ShortcodeError::InvalidIdentifier(
            "shortcode cannot be empty".to_string(),
        ));
    }

    let mut id: u64 = 0;
    for (position, ch) in shortcode.chars().enumerate() {
        let digit = u8::try_from(ch)
            .ok()
            .and_then(|byte| DIGIT_VALUES[byte as usize])
            .ok_or_else(|| {
                ShortcodeError::InvalidIdentifier(format!(
                    "invalid character {ch:?} at position {position} in shortcode {shortcode:?}"
                ))
            })?;

        id = id
            .checked_mul(64)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| ShortcodeError::Overflow(shortcode.to_string()))?;
    }

    Ok(id)
}

/// Encode a numeric media id as a shortcode
///
/// Inverse of [`decode`] for canonical shortcodes (no leading `A` digits).
/// Zero encodes as `"A"`.
pub fn encode(mut id: u64) -> String {
    if id == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while id > 0 {
        digits.push(ALPHABET[(id % 64) as usize]);
        id /= 64;
    }
    digits.reverse();

    // Alphabet bytes are ASCII
    digits.into_iter().map(char::from).collect()
}

/// Whether an identifier is already a numeric media id
///
/// Platform media ids may carry an owner suffix (`12345_678`), which is
/// accepted as numeric as well.
pub fn is_numeric_id(identifier: &str) -> bool {
    identifier
        .split('_')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Resolve a caller-supplied identifier to the media id used by the API
///
/// Accepts a numeric id (passed through unchanged), a bare shortcode, or a
/// post permalink containing a shortcode.
pub fn resolve_media_id(identifier: &str) -> Result<String, ShortcodeError> {
    let identifier = identifier.trim();

    if is_numeric_id(identifier) {
        return Ok(identifier.to_string());
    }

    let code = extract_from_permalink(identifier).unwrap_or(identifier);
    decode(code).map(|id| id.to_string())
}

/// Extract the shortcode segment from a post permalink, if the input is one
///
/// # Examples
///
/// ```
/// use post_archiver::shortcode::extract_from_permalink;
///
/// assert_eq!(
///     extract_from_permalink("https://www.instagram.com/p/CzAbC_1-x/"),
///     Some("CzAbC_1-x")
/// );
/// assert_eq!(extract_from_permalink("CzAbC_1-x"), None);
/// ```
pub fn extract_from_permalink(input: &str) -> Option<&str> {
    PERMALINK_MARKERS.iter().find_map(|marker| {
        let (_, rest) = input.split_once(marker)?;
        let code = rest.split(['/', '?', '#']).next()?;
        (!code.is_empty()).then_some(code)
    })
}

/// Errors that can occur while decoding shortcodes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcodeError {
    /// Empty input or a character outside the alphabet
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Decoded value does not fit in a 64-bit id
    #[error("shortcode {0:?} exceeds the 64-bit id range")]
    Overflow(String),
}
