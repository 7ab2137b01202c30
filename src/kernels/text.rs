//! This module contains the kernel for fixed-width text fields.
//!
//! String fields are right-padded with ASCII spaces to their storage width.
//! Decoding strips the padding (and any NUL fill) before converting from the
//! session encoding; encoding converts into the session encoding, cuts the
//! value at a character boundary if it is too long, and pads it back out.

use encoding_rs::{EncoderResult, Encoding, UTF_8};

use crate::error::SavCaseError;

/// The result of writing one value into a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFit {
    Complete,
    /// The value was cut; carries the full encoded length.
    Truncated { encoded_len: usize },
}

/// Strips trailing spaces and NULs.
pub fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |i| i + 1);
    &field[..end]
}

/// Decodes one padded field.
pub fn decode(field: &[u8], encoding: &'static Encoding, column: &str) -> Result<String, SavCaseError> {
    let trimmed = trim_padding(field);
    let decoded = if encoding == UTF_8 {
        std::str::from_utf8(trimmed)
            .map(str::to_owned)
            .map_err(|e| e.to_string())
    } else {
        encoding
            .decode_without_bom_handling_and_without_replacement(trimmed)
            .map(|cow| cow.into_owned())
            .ok_or_else(|| "malformed byte sequence".to_string())
    };
    decoded.map_err(|detail| SavCaseError::EncodingFailure {
        column: column.to_string(),
        encoding: encoding.name(),
        detail,
    })
}

/// Encodes `value` into `field`, padding the remainder with spaces.
///
/// At most `limit` bytes of text are written (`limit <= field.len()`); the
/// cut never splits a character.
pub fn encode_into(
    value: &str,
    encoding: &'static Encoding,
    field: &mut [u8],
    limit: usize,
    column: &str,
) -> Result<TextFit, SavCaseError> {
    let limit = limit.min(field.len());
    let mut encoder = encoding.new_encoder();
    let (result, _read, written) =
        encoder.encode_from_utf8_without_replacement(value, &mut field[..limit], true);
    field[written..].fill(b' ');

    match result {
        EncoderResult::InputEmpty => Ok(TextFit::Complete),
        EncoderResult::OutputFull => Ok(TextFit::Truncated {
            encoded_len: encoded_len(value, encoding),
        }),
        EncoderResult::Unmappable(c) => Err(SavCaseError::EncodingFailure {
            column: column.to_string(),
            encoding: encoding.name(),
            detail: format!("character {:?} cannot be represented", c),
        }),
    }
}

/// Copies raw bytes into `field` verbatim, padding with spaces.
pub fn copy_into(value: &[u8], field: &mut [u8], limit: usize) -> TextFit {
    let limit = limit.min(field.len());
    let n = value.len().min(limit);
    field[..n].copy_from_slice(&value[..n]);
    field[n..].fill(b' ');
    if value.len() > limit {
        TextFit::Truncated {
            encoded_len: value.len(),
        }
    } else {
        TextFit::Complete
    }
}

/// Bytes `value` occupies once encoded.
pub fn encoded_len(value: &str, encoding: &'static Encoding) -> usize {
    if encoding == UTF_8 {
        value.len()
    } else {
        encoding.encode(value).0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn test_decode_trims_spaces_and_nuls() {
        assert_eq!(decode(b"abc     ", UTF_8, "s").unwrap(), "abc");
        assert_eq!(decode(b"ab c\0\0  ", UTF_8, "s").unwrap(), "ab c");
        assert_eq!(decode(b"        ", UTF_8, "s").unwrap(), "");
        // Leading blanks are data.
        assert_eq!(decode(b"  x     ", UTF_8, "s").unwrap(), "  x");
    }

    #[test]
    fn test_decode_single_byte_encoding() {
        assert_eq!(decode(b"caf\xe9    ", WINDOWS_1252, "s").unwrap(), "café");
    }

    #[test]
    fn test_invalid_utf8_is_an_encoding_failure() {
        let err = decode(b"\xff\xfe      ", UTF_8, "name").unwrap_err();
        match err {
            SavCaseError::EncodingFailure { column, encoding, .. } => {
                assert_eq!(column, "name");
                assert_eq!(encoding, "UTF-8");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_encode_pads_with_spaces() {
        let mut field = [0u8; 8];
        let fit = encode_into("abc", UTF_8, &mut field, 3, "s").unwrap();
        assert_eq!(fit, TextFit::Complete);
        assert_eq!(&field, b"abc     ");
    }

    #[test]
    fn test_encode_truncates_on_char_boundary() {
        // "héllo" is h(1) é(2) l l o; a 2-byte limit cannot hold "hé".
        let mut field = [0u8; 8];
        let fit = encode_into("héllo", UTF_8, &mut field, 2, "s").unwrap();
        assert_eq!(fit, TextFit::Truncated { encoded_len: 6 });
        assert_eq!(&field, b"h       ");
    }

    #[test]
    fn test_encode_unmappable_character_fails() {
        let mut field = [0u8; 8];
        let err = encode_into("日本", WINDOWS_1252, &mut field, 8, "s").unwrap_err();
        assert!(matches!(err, SavCaseError::EncodingFailure { .. }));
    }

    #[test]
    fn test_copy_bytes_verbatim() {
        let mut field = [0u8; 8];
        assert_eq!(copy_into(b"\x01\x02", &mut field, 8), TextFit::Complete);
        assert_eq!(&field, b"\x01\x02      ");
        assert_eq!(
            copy_into(b"0123456789", &mut field, 8),
            TextFit::Truncated { encoded_len: 10 }
        );
        assert_eq!(&field, b"01234567");
    }
}
