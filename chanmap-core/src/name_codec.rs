//! Hex-escaped channel and satellite names.
//!
//! The firmware stores names as space separated hex bytes, each followed
//! by a `0x00` token:
//!
//! ```text
//! <ChName>0x41 0x00 0x52 0x00 0x44 0x00</ChName>   -> "ARD"
//! ```
//!
//! Values that do not start with `0x` are plain text and pass through.

use encoding_rs::{EncoderResult, Encoding, WINDOWS_1252};
use log::warn;

use crate::error::{ChanMapError, Result};

const HEX_PREFIX: &str = "0x";
const SEPARATOR: &str = "0x00";

/// Encoder/decoder for hex-escaped names using one text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameCodec {
    encoding: &'static Encoding,
}

impl Default for NameCodec {
    fn default() -> Self {
        Self::new(WINDOWS_1252)
    }
}

impl NameCodec {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Codec for an encoding that round-trips names.
    ///
    /// UTF-16 and the replacement encoding only decode; `encoding_rs`
    /// writes UTF-8 for them, so they are rejected.
    pub fn try_new(encoding: &'static Encoding) -> Result<Self> {
        if encoding.output_encoding() != encoding {
            return Err(ChanMapError::UnsupportedEncoding(encoding.name().to_string()));
        }
        Ok(Self::new(encoding))
    }

    /// Create a codec from a WHATWG encoding label such as `"utf-8"` or `"latin2"`.
    pub fn for_label(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ChanMapError::UnknownEncoding(label.to_string()))?;
        Self::try_new(encoding)
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode a raw field value.
    pub fn decode(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if !trimmed.starts_with(HEX_PREFIX) {
            return raw.to_string();
        }

        let mut buffer = Vec::with_capacity(trimmed.len() / 5 + 1);
        for token in trimmed.split(' ') {
            if token.is_empty() || token == SEPARATOR {
                continue;
            }
            match parse_byte(token) {
                Some(b) => buffer.push(b),
                None => warn!("Skipping invalid hex token {:?} in name {:?}", token, raw),
            }
        }

        let (text, _) = self.encoding.decode_without_bom_handling(&buffer);
        text.into_owned()
    }

    /// Decode an optional raw field; missing values stay missing.
    pub fn decode_opt(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|r| self.decode(r))
    }

    /// Encode text into the `0xHH 0x00` form.
    ///
    /// Characters the encoding cannot represent become `?`.
    pub fn encode(&self, text: &str) -> String {
        let bytes = self.encode_bytes(text);
        let mut out = String::with_capacity(bytes.len() * 10);
        for b in bytes.iter() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("0x{:02X} {}", b, SEPARATOR));
        }
        out
    }

    fn encode_bytes(&self, text: &str) -> Vec<u8> {
        let mut encoder = self.encoding.new_encoder();
        let mut bytes = Vec::with_capacity(text.len());
        let mut rest = text;
        loop {
            let needed = encoder
                .max_buffer_length_from_utf8_without_replacement(rest.len())
                .unwrap_or(rest.len() * 4 + 16);
            bytes.reserve(needed);
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut bytes, true);
            rest = &rest[read..];
            match result {
                EncoderResult::InputEmpty => return bytes,
                EncoderResult::OutputFull => {}
                EncoderResult::Unmappable(c) => {
                    warn!("{:?} cannot be written in {}, using '?'", c, self.encoding.name());
                    bytes.push(b'?');
                }
            }
        }
    }
}

/// Parse a single hex token, with or without the `0x` prefix.
///
/// Tokens longer than two hex digits are rejected rather than truncated to their low byte.
fn parse_byte(token: &str) -> Option<u8> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_name() {
        let codec = NameCodec::default();
        assert_eq!(codec.decode("0x41 0x00 0x42 0x00"), "AB");
    }

    #[test]
    fn test_encode_has_no_trailing_separator_space() {
        let codec = NameCodec::default();
        assert_eq!(codec.encode("AB"), "0x41 0x00 0x42 0x00");
        assert_eq!(codec.encode(""), "");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let codec = NameCodec::default();
        assert_eq!(codec.decode("Das Erste HD"), "Das Erste HD");
        assert_eq!(codec.decode(""), "");
        assert_eq!(codec.decode_opt(None), None);
    }

    #[test]
    fn test_decode_tolerates_extra_spaces() {
        let codec = NameCodec::default();
        assert_eq!(codec.decode("  0x5A  0x00 0x44 0x00 0x46 0x00 "), "ZDF");
    }

    #[test]
    fn test_decode_skips_invalid_tokens() {
        let codec = NameCodec::default();
        assert_eq!(codec.decode("0x41 0x00 0xZZ 0x00 0x42"), "AB");
        assert_eq!(codec.decode("0x41 0x00 0x142 0x00 0x43 0x00"), "AC");
    }

    #[test]
    fn test_windows_1252_umlaut() {
        let codec = NameCodec::default();
        assert_eq!(codec.encode("Ö"), "0xD6 0x00");
        assert_eq!(codec.decode("0xD6 0x00 0x31 0x00"), "Ö1");
    }

    #[test]
    fn test_round_trip() {
        let latin1 = NameCodec::default();
        for s in ["ORF 1 HD", "Österreich", "ÇÉÑ & <co>", "x"] {
            assert_eq!(latin1.decode(&latin1.encode(s)), s);
        }

        let utf8 = NameCodec::for_label("utf-8").unwrap();
        for s in ["Первый канал", "NHK総合", "TVP 1"] {
            assert_eq!(utf8.decode(&utf8.encode(s)), s);
        }
    }

    #[test]
    fn test_same_bytes_different_encoding() {
        let raw = "0xE8 0x00";
        assert_eq!(NameCodec::default().decode(raw), "è");
        let latin2 = NameCodec::for_label("iso-8859-2").unwrap();
        assert_eq!(latin2.decode(raw), "č");
    }

    #[test]
    fn test_unmappable_chars_become_question_marks() {
        let codec = NameCodec::default();
        assert_eq!(codec.encode("Č"), "0x3F 0x00");
        assert_eq!(codec.decode(&codec.encode("TVČ1")), "TV?1");
    }

    #[test]
    fn test_decode_only_encodings_are_rejected() {
        for label in ["utf-16le", "utf-16be", "iso-2022-kr"] {
            assert!(matches!(
                NameCodec::for_label(label),
                Err(ChanMapError::UnsupportedEncoding(_))
            ));
        }
        assert!(NameCodec::try_new(encoding_rs::UTF_16LE).is_err());
        assert!(NameCodec::try_new(encoding_rs::ISO_8859_2).is_ok());
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            NameCodec::for_label("no-such-charset"),
            Err(ChanMapError::UnknownEncoding(_))
        ));
    }
}
