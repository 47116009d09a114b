//! Message body decoder
//!
//! In text mode the modem prints a message body either as plain text or,
//! for alphabets outside the GSM default set, as hexadecimal UCS-2BE:
//! ```text
//! temp
//! 0442043504410442
//! ```
//! Decoding never fails. Anything that cannot be decoded degrades to the
//! sanitized original text and the problem is reported as a `DecodeAnomaly`
//! next to the result.

use thiserror::Error;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Non-fatal problems met while decoding a body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeAnomaly {
    #[error("odd number of hex digits ({digits}), kept original text")]
    OddHexLength { digits: usize },

    #[error("dropped {dropped} invalid UCS-2 code unit(s)")]
    InvalidCodeUnits { dropped: usize },
}

/// Best-effort decoded body plus an optional diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub anomaly: Option<DecodeAnomaly>,
}

impl Decoded {
    fn clean(text: String) -> Self {
        Self {
            text,
            anomaly: None,
        }
    }
}

/// Decode a raw body line as emitted by the unread listing
pub fn decode_body(raw: &str) -> Decoded {
    if looks_like_text(raw) {
        return Decoded::clean(sanitize(raw));
    }

    // Non hex characters (spaces, CR, stray noise) are ignored
    let nibbles: Vec<u8> = raw
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();

    if nibbles.len() % 2 != 0 {
        return Decoded {
            text: sanitize(raw),
            anomaly: Some(DecodeAnomaly::OddHexLength {
                digits: nibbles.len(),
            }),
        };
    }

    let bytes: Vec<u8> = nibbles
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect();

    let (decoded, dropped) = decode_ucs2_be(&bytes);
    Decoded {
        text: sanitize(&decoded),
        anomaly: (dropped > 0).then_some(DecodeAnomaly::InvalidCodeUnits { dropped }),
    }
}

/// Keep printable characters, collapse whitespace runs and trim
pub fn sanitize(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|c| is_printable(*c) || c.is_whitespace())
        .collect();

    printable
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| u32::from(*c) >= 32)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Any letter at all means the modem printed the body as text
fn looks_like_text(raw: &str) -> bool {
    raw.chars().any(char::is_alphabetic)
}

/// Control, format (zero-width space, BOM), private-use and unassigned
/// code points are not printable
fn is_printable(c: char) -> bool {
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Surrogate
            | GeneralCategory::Unassigned
    )
}

/// Big-endian 16-bit units; unpaired surrogates and a trailing odd byte are dropped
fn decode_ucs2_be(bytes: &[u8]) -> (String, usize) {
    let chunks = bytes.chunks_exact(2);
    let mut dropped = chunks.remainder().len();

    let units = chunks.map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    let mut out = String::with_capacity(bytes.len() / 2);
    for unit in char::decode_utf16(units) {
        match unit {
            Ok(c) => out.push(c),
            Err(_) => dropped += 1,
        }
    }

    (out, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sanitized() {
        let decoded = decode_body("  Temp\t\r\n  now ");
        assert_eq!(decoded.text, "Temp now");
        assert_eq!(decoded.anomaly, None);
    }

    #[test]
    fn test_control_bytes_removed() {
        assert_eq!(sanitize("re\u{7}boot\u{0}"), "reboot");
        assert_eq!(sanitize("a\u{1b}b  \u{7f}c"), "ab c");
    }

    #[test]
    fn test_invisible_format_characters_removed() {
        assert_eq!(decode_body("\u{200B}temp").text, "temp");
        assert_eq!(decode_body("\u{FEFF}temp\u{200D}").text, "temp");
        assert_eq!(decode_body("up\u{2060}time").text, "uptime");
        assert_eq!(sanitize("\u{E000}help"), "help");
        assert_eq!(sanitize("\u{FEFF}\u{74}\u{65}\u{6D}\u{70}"), "temp");
    }

    #[test]
    fn test_empty_input() {
        let decoded = decode_body("");
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.anomaly, None);
    }

    #[test]
    fn test_decode_is_idempotent_on_text() {
        for raw in [
            "help",
            "  Uptime  ",
            "Résultat de temp",
            "mem\u{0}\u{1}",
            "Привет мир",
            "00410042",
            "DEAD",
            "cafe",
        ] {
            let once = decode_body(raw).text;
            let twice = decode_body(&once).text;
            assert_eq!(once, twice, "input {:?}", raw);
        }
    }

    #[test]
    fn test_words_of_hex_letters_stay_text() {
        assert_eq!(decode_body("DEAD").text, "DEAD");
        assert_eq!(decode_body("add").text, "add");
        assert_eq!(decode_body("D83DDE00").anomaly, None);
    }

    #[test]
    fn test_ucs2_ascii_command() {
        // "cpu"
        let decoded = decode_body("006300700075");
        assert_eq!(decoded.text, "cpu");
        assert_eq!(decoded.anomaly, None);
    }

    #[test]
    fn test_ucs2_cyrillic() {
        let decoded = decode_body("0442043504410442");
        assert_eq!(decoded.text, "тест");
    }

    #[test]
    fn test_ucs2_with_whitespace_collapsed() {
        // "  a\tb  " encoded
        let decoded = decode_body("0020002000610009006200200020");
        assert_eq!(decoded.text, "a b");
    }

    #[test]
    fn test_odd_length_with_letters_is_text() {
        let decoded = decode_body("D8D4E9F");
        assert_eq!(decoded.text, "D8D4E9F");
        assert_eq!(decoded.anomaly, None);
    }

    #[test]
    fn test_odd_hex_length_falls_back() {
        let decoded = decode_body("0041004 ");
        assert_eq!(decoded.text, "0041004");
        assert_eq!(
            decoded.anomaly,
            Some(DecodeAnomaly::OddHexLength { digits: 7 })
        );
    }

    #[test]
    fn test_trailing_half_unit_dropped() {
        let decoded = decode_body("004100");
        assert_eq!(decoded.text, "A");
        assert_eq!(
            decoded.anomaly,
            Some(DecodeAnomaly::InvalidCodeUnits { dropped: 1 })
        );
    }

    #[test]
    fn test_unpaired_surrogate_dropped() {
        let (text, dropped) = decode_ucs2_be(&[0xD8, 0x00, 0x00, 0x41]);
        assert_eq!(text, "A");
        assert_eq!(dropped, 1);

        let (text, dropped) = decode_ucs2_be(&[0xD8, 0x3D, 0xDE, 0x00]);
        assert_eq!(text, "\u{1F600}");
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_hex_decoding_matches_encoded_text() {
        // every code unit of these texts is written with decimal digits only
        for text in ["hi", "QUIT", "Hi 2024", "тест", "  pi  "] {
            let hex: String = text
                .encode_utf16()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            assert!(hex.chars().all(|c| c.is_ascii_digit()), "hex {:?}", hex);
            assert_eq!(decode_body(&hex).text, sanitize(text), "text {:?}", text);
        }
    }
}
