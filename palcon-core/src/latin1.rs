//! ISO-8859-1 conversion for packet bodies.
//!
//! The server renders chat text byte-per-character, so command bodies
//! are sent as Latin-1 rather than UTF-8. Every Latin-1 byte maps to the
//! Unicode scalar with the same value, which makes both directions a
//! plain per-character cast.

use crate::error::RconError;

/// Encode `text` as ISO-8859-1.
///
/// Fails on the first character above U+00FF.
pub fn encode(text: &str) -> Result<Vec<u8>, RconError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| RconError::Unencodable(c)))
        .collect()
}

/// Decode ISO-8859-1 bytes. Never fails.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nbsp_is_a_single_byte() {
        assert_eq!(encode("a\u{00A0}b").unwrap(), vec![b'a', 0xA0, b'b']);
    }

    #[test]
    fn accented_text_survives() {
        let text = "Grüße, Zoë";
        assert_eq!(decode(&encode(text).unwrap()), text);
    }

    #[test]
    fn rejects_characters_outside_latin1() {
        assert!(matches!(encode("ok €"), Err(RconError::Unencodable('€'))));
    }
}
