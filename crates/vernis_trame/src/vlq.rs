//! Base64-VLQ codec for the `mappings` field.
//!
//! Generated columns are relative to the previous segment on the same line
//! and reset at every `;`. Source index, original line, original column and
//! name index are relative to the previous segment that carried them,
//! across the whole map.

use crate::error::{MapError, MapResult};
use crate::types::{Mappings, OriginalLocation, Segment};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION: u8 = 0b10_0000;
const DIGIT_MASK: u8 = 0b01_1111;

#[inline]
fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode one VLQ value starting at `*pos`, advancing past it.
fn decode_value(bytes: &[u8], pos: &mut usize) -> MapResult<i64> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*pos).ok_or(MapError::TruncatedValue)?;
        *pos += 1;
        let digit = base64_value(byte).ok_or(MapError::InvalidCharacter(byte as char))?;
        result += i64::from(digit & DIGIT_MASK) << shift;
        if digit & CONTINUATION == 0 {
            break;
        }
        shift += 5;
        if shift > 55 {
            return Err(MapError::Overflow);
        }
    }

    let negative = result & 1 == 1;
    let value = result >> 1;
    Ok(if negative { -value } else { value })
}

/// Append the VLQ encoding of `value` to `out`.
fn encode_value(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = (vlq & i64::from(DIGIT_MASK)) as u8;
        vlq >>= 5;
        if vlq > 0 {
            digit |= CONTINUATION;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn absolute(previous: i64, delta: i64, field: &'static str) -> MapResult<i64> {
    let value = previous + delta;
    if value < 0 || value > i64::from(u32::MAX) {
        return Err(MapError::NegativeField(field));
    }
    Ok(value)
}

/// Decode an encoded `mappings` string.
pub fn decode(mappings: &str) -> MapResult<Mappings> {
    let mut lines = Vec::new();
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;

    for encoded_line in mappings.split(';') {
        let mut line = Vec::new();
        let mut generated_column = 0i64;

        for encoded_segment in encoded_line.split(',') {
            if encoded_segment.is_empty() {
                continue;
            }

            let bytes = encoded_segment.as_bytes();
            let mut pos = 0;
            let mut fields = [0i64; 5];
            let mut count = 0;
            while pos < bytes.len() {
                if count == fields.len() {
                    return Err(MapError::SegmentArity(count + 1));
                }
                fields[count] = decode_value(bytes, &mut pos)?;
                count += 1;
            }

            generated_column = absolute(generated_column, fields[0], "generated column")?;
            let segment = match count {
                1 => Segment::unmapped(generated_column as u32),
                4 | 5 => {
                    source = absolute(source, fields[1], "source index")?;
                    original_line = absolute(original_line, fields[2], "original line")?;
                    original_column = absolute(original_column, fields[3], "original column")?;
                    let name_index = if count == 5 {
                        name = absolute(name, fields[4], "name index")?;
                        Some(name as u32)
                    } else {
                        None
                    };
                    Segment {
                        generated_column: generated_column as u32,
                        original: Some(OriginalLocation {
                            source: source as u32,
                            line: original_line as u32,
                            column: original_column as u32,
                            name: name_index,
                        }),
                    }
                }
                other => return Err(MapError::SegmentArity(other)),
            };
            line.push(segment);
        }

        lines.push(line);
    }

    Ok(lines)
}

/// Encode decoded mappings into a `mappings` string.
pub fn encode(mappings: &[Vec<Segment>]) -> String {
    let mut out = String::new();
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;

    for (index, line) in mappings.iter().enumerate() {
        if index > 0 {
            out.push(';');
        }

        let mut generated_column = 0i64;
        for (segment_index, segment) in line.iter().enumerate() {
            if segment_index > 0 {
                out.push(',');
            }

            let column = i64::from(segment.generated_column);
            encode_value(&mut out, column - generated_column);
            generated_column = column;

            let Some(original) = segment.original else {
                continue;
            };

            encode_value(&mut out, i64::from(original.source) - source);
            source = i64::from(original.source);
            encode_value(&mut out, i64::from(original.line) - original_line);
            original_line = i64::from(original.line);
            encode_value(&mut out, i64::from(original.column) - original_column);
            original_column = i64::from(original.column);

            if let Some(index) = original.name {
                encode_value(&mut out, i64::from(index) - name);
                name = i64::from(index);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one(value: i64) -> String {
        let mut out = String::new();
        encode_value(&mut out, value);
        out
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_one(0), "A");
        assert_eq!(encode_one(1), "C");
        assert_eq!(encode_one(-1), "D");
        assert_eq!(encode_one(5), "K");
        assert_eq!(encode_one(16), "gB");
        assert_eq!(encode_one(-17), "jB");
        assert_eq!(encode_one(1000), "w+B");
    }

    #[test]
    fn test_decode_known_values() {
        for (text, expected) in [("A", 0), ("C", 1), ("D", -1), ("gB", 16), ("w+B", 1000)] {
            let mut pos = 0;
            assert_eq!(decode_value(text.as_bytes(), &mut pos).unwrap(), expected);
            assert_eq!(pos, text.len());
        }
    }

    #[test]
    fn test_decode_relative_fields() {
        // Second line reuses the source/line/column state from the first.
        let decoded = decode("AAAA,KAAE;IACA").unwrap();
        assert_eq!(
            decoded,
            vec![
                vec![Segment::mapped(0, 0, 0, 0), Segment::mapped(5, 0, 0, 2)],
                vec![Segment::mapped(4, 0, 1, 2)],
            ]
        );
    }

    #[test]
    fn test_decode_unmapped_and_named() {
        let decoded = decode("A,CAAAA").unwrap();
        assert_eq!(
            decoded,
            vec![vec![
                Segment::unmapped(0),
                Segment::mapped(1, 0, 0, 0).with_name(0)
            ]]
        );
    }

    #[test]
    fn test_decode_empty_lines() {
        let decoded = decode(";;AAAA;").unwrap();
        assert_eq!(decoded.len(), 4);
        assert!(decoded[0].is_empty());
        assert!(decoded[1].is_empty());
        assert!(decoded[3].is_empty());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("A!AA"), Err(MapError::InvalidCharacter('!'))));
        assert!(matches!(decode("AAg"), Err(MapError::TruncatedValue)));
        assert!(matches!(decode("AA"), Err(MapError::SegmentArity(2))));
        assert!(matches!(decode("AAAAAA"), Err(MapError::SegmentArity(6))));
        assert!(matches!(decode("D"), Err(MapError::NegativeField(_))));
    }

    #[test]
    fn test_encode_matches_decode_input() {
        let text = "AAAA,KAAE;IACA,CAAC;;gBAAgB";
        assert_eq!(encode(&decode(text).unwrap()), text);
    }
}
