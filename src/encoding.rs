//! Text transport encoding for stored records
//!
//! Ciphertext is binary; the backing store holds text. Records are mapped
//! through standard padded base64.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{PrefsError, PrefsResult};

/// Reversible binary-to-text mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder;

impl TextEncoder {
    /// Encode bytes as base64 text
    pub fn to_text(&self, bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    /// Decode base64 text back into bytes
    pub fn from_text(&self, text: &str) -> PrefsResult<Vec<u8>> {
        STANDARD
            .decode(text)
            .map_err(|e| PrefsError::malformed(format!("Invalid record encoding: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let encoder = TextEncoder;
        let text = encoder.to_text(b"");
        assert_eq!(text, "");
        assert!(encoder.from_text(&text).unwrap().is_empty());
    }

    #[test]
    fn test_every_byte_value_survives() {
        let encoder = TextEncoder;
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(encoder.from_text(&encoder.to_text(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_large_input() {
        let encoder = TextEncoder;
        let bytes: Vec<u8> = (0..1_000_000u32).map(|i| (i * 31 % 251) as u8).collect();
        assert_eq!(encoder.from_text(&encoder.to_text(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_output_is_text_safe() {
        let encoder = TextEncoder;
        let text = encoder.to_text(&[0xff, 0x00, 0x80, 0x0a, 0x0d]);
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }

    #[test]
    fn test_invalid_alphabet_is_malformed() {
        let encoder = TextEncoder;
        let err = encoder.from_text("not*base64!").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_truncated_padding_is_malformed() {
        let encoder = TextEncoder;
        let text = encoder.to_text(b"ab");
        assert_eq!(text, "YWI=");
        assert!(encoder.from_text("YWI").unwrap_err().is_malformed());
    }
}
