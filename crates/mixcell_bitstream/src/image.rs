//! Serialized forms of a configuration image.
//!
//! Two encodings are supported:
//!
//! - **Text**: a header line `index\t\tvalue\t\tcomment` followed by one line
//!   per bit, `{index}\t\t{0|1}\t\t//`. Anything after the value is a
//!   comment and is ignored when parsing.
//! - **Bytes**: bits packed LSB first, bit 0 in the low bit of byte 0. The
//!   unused high bits of the last byte must be zero.

use crate::bits::BitArray;
use crate::error::ImageError;
use std::fmt::Write as _;

/// Header line of the text encoding.
pub const TEXT_HEADER: &str = "index\t\tvalue\t\tcomment";

/// Renders `image` in the text encoding.
pub fn write_text(image: &BitArray) -> String {
    let mut out = String::with_capacity(TEXT_HEADER.len() + 1 + image.len() as usize * 12);
    out.push_str(TEXT_HEADER);
    out.push('\n');
    for (i, bit) in image.iter().enumerate() {
        let _ = writeln!(out, "{i}\t\t{}\t\t//", u8::from(bit));
    }
    out
}

/// Parses the text encoding, which must hold exactly `expected_len` bits.
///
/// The header is optional, blank lines are skipped, and indices must run
/// from 0 upward without gaps.
pub fn parse_text(text: &str, expected_len: u32) -> Result<BitArray, ImageError> {
    let mut bits = Vec::with_capacity(text.len().min(expected_len as usize));
    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with("index") {
            continue;
        }
        let mut fields = line.split_whitespace();
        let syntax = |message: String| ImageError::Syntax {
            line: line_no,
            message,
        };
        let index: usize = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| syntax("expected a bit index".to_string()))?;
        if index != bits.len() {
            return Err(syntax(format!("expected index {}, found {index}", bits.len())));
        }
        let value = match fields.next() {
            Some("0") => false,
            Some("1") => true,
            Some(other) => return Err(syntax(format!("bit value `{other}` is not 0 or 1"))),
            None => return Err(syntax("missing bit value".to_string())),
        };
        bits.push(value);
    }
    if bits.len() != expected_len as usize {
        return Err(ImageError::Length {
            expected: expected_len,
            actual: bits.len() as u32,
        });
    }
    Ok(BitArray::from_bools(&bits))
}

/// Packs `image` into bytes, LSB first.
pub fn to_bytes(image: &BitArray) -> Vec<u8> {
    let mut out = vec![0u8; image.len().div_ceil(8) as usize];
    for (i, bit) in image.iter().enumerate() {
        if bit {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

/// Unpacks `len` bits from bytes packed LSB first.
pub fn from_bytes(bytes: &[u8], len: u32) -> Result<BitArray, ImageError> {
    let needed = len.div_ceil(8) as usize;
    if bytes.len() != needed {
        return Err(ImageError::Length {
            expected: len,
            actual: (bytes.len() * 8) as u32,
        });
    }
    let spare = needed as u32 * 8 - len;
    if spare > 0 && bytes[needed - 1] >> (8 - spare) != 0 {
        return Err(ImageError::Padding);
    }
    let mut image = BitArray::new(len);
    for i in 0..len {
        if (bytes[(i / 8) as usize] >> (i % 8)) & 1 == 1 {
            image.set(i, true);
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BitArray {
        BitArray::from_bools(&[true, false, false, true, true, false, true, false, false, true])
    }

    #[test]
    fn text_layout() {
        let text = write_text(&BitArray::from_bools(&[false, true]));
        assert_eq!(text, "index\t\tvalue\t\tcomment\n0\t\t0\t\t//\n1\t\t1\t\t//\n");
    }

    #[test]
    fn text_roundtrip() {
        let image = sample();
        assert_eq!(parse_text(&write_text(&image), 10).unwrap(), image);
    }

    #[test]
    fn text_ignores_comments_and_blank_lines() {
        let text = "0 1 // pin 3\n\n1\t0\n2 1 anything\n";
        let image = parse_text(text, 3).unwrap();
        assert_eq!(image.to_string(), "101");
    }

    #[test]
    fn text_rejects_gaps_and_bad_values() {
        let err = parse_text("0 1\n2 1\n", 3).unwrap_err();
        assert!(matches!(err, ImageError::Syntax { line: 2, .. }));
        let err = parse_text("0 2\n", 1).unwrap_err();
        assert!(matches!(err, ImageError::Syntax { line: 1, .. }));
        let err = parse_text("0\n", 1).unwrap_err();
        assert!(matches!(err, ImageError::Syntax { .. }));
    }

    #[test]
    fn text_length_checked() {
        let err = parse_text(&write_text(&sample()), 12).unwrap_err();
        assert_eq!(
            err,
            ImageError::Length {
                expected: 12,
                actual: 10
            }
        );
    }

    #[test]
    fn huge_expected_length_fails_cleanly() {
        let err = parse_text("0 1\n", u32::MAX).unwrap_err();
        assert_eq!(
            err,
            ImageError::Length {
                expected: u32::MAX,
                actual: 1
            }
        );
    }

    #[test]
    fn bytes_are_lsb_first() {
        let bytes = to_bytes(&sample());
        assert_eq!(bytes, vec![0b0101_1001, 0b10]);
        assert_eq!(from_bytes(&bytes, 10).unwrap(), sample());
    }

    #[test]
    fn bytes_padding_must_be_zero() {
        assert_eq!(from_bytes(&[0, 0b100], 10), Err(ImageError::Padding));
        assert!(from_bytes(&[0xFF], 8).is_ok());
    }

    #[test]
    fn bytes_length_checked() {
        assert!(matches!(
            from_bytes(&[0, 0, 0], 10),
            Err(ImageError::Length { .. })
        ));
    }
}
