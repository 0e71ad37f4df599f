//! Evaluation of signature entries against a content buffer.

use crate::signature::entry::{Endian, Entry, Offset, StringFlags, StringOp, Test, ValueType};
use crate::signature::format::{format_message, MatchValue};

/// Longest string printed for an inexact string test.
const MAX_PRINTED_STRING: usize = 64;

/// A successful test of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Matched<'a> {
    /// Buffer offset just past the matched bytes; base for `&n` offsets.
    pub end: usize,
    /// The value substituted into the entry's message.
    pub value: MatchValue<'a>,
}

/// Description accumulated while walking a matching entry and its
/// continuations.
#[derive(Debug, Default)]
pub(crate) struct Description {
    pub text: String,
    pub mime: Option<String>,
}

impl Description {
    fn push(&mut self, entry: &Entry, value: MatchValue<'_>) {
        if let Some(mime) = &entry.mime {
            self.mime = Some(mime.clone());
        }
        if entry.message.is_empty() {
            return;
        }

        let (template, separate) = match entry.message.strip_prefix("\\b") {
            Some(rest) => (rest, false),
            None => (entry.message.as_str(), true),
        };

        let rendered = format_message(template, value);
        if separate && !self.text.is_empty() && !rendered.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&rendered);
    }
}

/// Tests a top-level entry and, when it matches, every continuation below
/// it. Returns `None` if the entry itself does not match.
pub(crate) fn describe(entry: &Entry, buffer: &[u8]) -> Option<Description> {
    let matched = test_entry(entry, buffer, 0)?;
    let mut description = Description::default();
    description.push(entry, matched.value);
    walk_children(&entry.children, buffer, matched.end, &mut description);
    Some(description)
}

fn walk_children(children: &[Entry], buffer: &[u8], parent_end: usize, out: &mut Description) {
    for child in children {
        if let Some(matched) = test_entry(child, buffer, parent_end) {
            out.push(child, matched.value);
            walk_children(&child.children, buffer, matched.end, out);
        }
    }
}

/// Tests a single entry. `parent_end` is the end of the parent's match,
/// used to resolve relative offsets.
pub(crate) fn test_entry<'a>(entry: &Entry, buffer: &'a [u8], parent_end: usize) -> Option<Matched<'a>> {
    let offset = resolve_offset(entry.offset, parent_end)?;

    match (&entry.value_type, &entry.test) {
        (
            ValueType::Numeric {
                width,
                endian,
                signed,
                mask,
            },
            Test::Numeric { op, value },
        ) => {
            let bytes = buffer.get(offset..offset.checked_add(*width)?)?;
            let mut actual = read_uint(bytes, *endian);
            if let Some(mask) = mask {
                actual &= mask;
            }
            op.apply(actual, *value, *width, *signed).then_some(Matched {
                end: offset + width,
                value: MatchValue::Number {
                    value: actual,
                    width: *width,
                },
            })
        }
        (ValueType::String { flags }, Test::String { op, pattern }) => {
            match_string(buffer, offset, *op, pattern, *flags)
        }
        (ValueType::Search { range, flags }, Test::String { op, pattern }) => {
            if *op == StringOp::Any {
                return match_string(buffer, offset, *op, pattern, *flags);
            }
            search(buffer, offset, *range, pattern, *flags)
        }
        _ => None,
    }
}

fn resolve_offset(offset: Offset, parent_end: usize) -> Option<usize> {
    match offset {
        Offset::Absolute(offset) => usize::try_from(offset).ok(),
        Offset::Relative(delta) => {
            let base = i64::try_from(parent_end).ok()?.checked_add(delta)?;
            usize::try_from(base).ok()
        }
    }
}

fn read_uint(bytes: &[u8], endian: Endian) -> u64 {
    match endian {
        Endian::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        Endian::Little => bytes.iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64),
    }
}

fn match_string<'a>(
    buffer: &'a [u8],
    offset: usize,
    op: StringOp,
    pattern: &[u8],
    flags: StringFlags,
) -> Option<Matched<'a>> {
    if offset > buffer.len() {
        return None;
    }

    let printed = |buffer: &'a [u8]| {
        let text = c_string_at(buffer, offset);
        Matched {
            end: offset + text.len(),
            value: MatchValue::Bytes(text),
        }
    };

    match op {
        StringOp::Any => Some(printed(buffer)),
        StringOp::Equal => compare_at(buffer, offset, pattern, flags).map(|len| Matched {
            end: offset + len,
            value: MatchValue::Bytes(&buffer[offset..offset + len]),
        }),
        StringOp::NotEqual => compare_at(buffer, offset, pattern, flags)
            .is_none()
            .then(|| printed(buffer)),
        StringOp::Less | StringOp::Greater => {
            let data = buffer.get(offset..offset + pattern.len())?;
            let ordering = if flags.case_insensitive {
                data.to_ascii_lowercase().cmp(&pattern.to_ascii_lowercase())
            } else {
                data.cmp(pattern)
            };
            let wanted = match op {
                StringOp::Less => std::cmp::Ordering::Less,
                _ => std::cmp::Ordering::Greater,
            };
            (ordering == wanted).then(|| printed(buffer))
        }
    }
}

fn search<'a>(
    buffer: &'a [u8],
    offset: usize,
    range: usize,
    pattern: &[u8],
    flags: StringFlags,
) -> Option<Matched<'a>> {
    let last = offset.saturating_add(range).min(buffer.len());
    (offset..last).find_map(|start| {
        compare_at(buffer, start, pattern, flags).map(|len| Matched {
            end: start + len,
            value: MatchValue::Bytes(&buffer[start..start + len]),
        })
    })
}

/// Compares `pattern` against the buffer at `offset`. Returns the number
/// of buffer bytes consumed on a match.
fn compare_at(buffer: &[u8], offset: usize, pattern: &[u8], flags: StringFlags) -> Option<usize> {
    let flexible_blanks = flags.compact_whitespace || flags.optional_whitespace;
    let mut pos = offset;

    for &expected in pattern {
        if flexible_blanks && expected == b' ' {
            let start = pos;
            while buffer.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
                pos += 1;
            }
            if pos == start && !flags.optional_whitespace {
                return None;
            }
            continue;
        }

        let actual = *buffer.get(pos)?;
        let equal = if flags.case_insensitive {
            actual.eq_ignore_ascii_case(&expected)
        } else {
            actual == expected
        };
        if !equal {
            return None;
        }
        pos += 1;
    }

    Some(pos - offset)
}

/// Returns the printable string starting at `offset`: up to the first
/// NUL or line break, capped at [`MAX_PRINTED_STRING`] bytes.
fn c_string_at(buffer: &[u8], offset: usize) -> &[u8] {
    let tail = &buffer[offset.min(buffer.len())..];
    let len = tail
        .iter()
        .take(MAX_PRINTED_STRING)
        .take_while(|&&b| b != 0 && b != b'\n' && b != b'\r')
        .count();
    &tail[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::parse::parse_entries;

    fn describe_with(db: &str, buffer: &[u8]) -> Option<Description> {
        let entries = parse_entries(db).unwrap();
        describe(&entries[0], buffer)
    }

    #[test]
    fn test_numeric_endianness() {
        let buffer = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_uint(&buffer, Endian::Big), 0x01020304);
        assert_eq!(read_uint(&buffer, Endian::Little), 0x04030201);
    }

    #[test]
    fn test_numeric_entry_with_mask() {
        let db = "0 belong&0xffff0000 0xcafe0000 masked\n";
        assert!(describe_with(db, &[0xca, 0xfe, 0x12, 0x34]).is_some());
        assert!(describe_with(db, &[0xca, 0xff, 0x12, 0x34]).is_none());
    }

    #[test]
    fn test_numeric_entry_past_end_does_not_match() {
        let db = "4 lelong x trailing\n";
        assert!(describe_with(db, &[0, 0, 0, 0, 1, 2]).is_none());
    }

    #[test]
    fn test_unprefixed_types_compare_signed() {
        assert!(describe_with("0 byte <0 negative\n", &[0x80]).is_some());
        assert!(describe_with("0 ubyte <0 negative\n", &[0x80]).is_none());
        assert!(describe_with("0 byte >-1 non-negative\n", &[0x05]).is_some());
        assert!(describe_with("0 byte >-1 non-negative\n", &[0xf0]).is_none());

        let db = "0 string HDR header\n>4 lelong <0 \\b, negative length\n";
        let found = describe_with(db, b"HDR\0\xff\xff\xff\xff").unwrap();
        assert_eq!(found.text, "header, negative length");

        let db = "0 string HDR header\n>4 ulelong <0 \\b, negative length\n";
        let found = describe_with(db, b"HDR\0\xff\xff\xff\xff").unwrap();
        assert_eq!(found.text, "header");
    }

    #[test]
    fn test_continuations_build_description() {
        let db = "\
0 string \\x89PNG\\r\\n\\x1a\\n PNG image data
!:mime image/png
>16 belong x \\b, %d x
>20 belong x %d
>24 byte 8 \\b, 8-bit
>24 byte 16 \\b, 16-bit
";
        let mut png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        png.extend_from_slice(&640u32.to_be_bytes());
        png.extend_from_slice(&480u32.to_be_bytes());
        png.push(8);

        let description = describe_with(db, &png).unwrap();
        assert_eq!(description.text, "PNG image data, 640 x 480, 8-bit");
        assert_eq!(description.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_relative_offsets() {
        let db = "\
0 string ID3 Audio file with ID3 version 2
>3 byte x \\b.%d
>>&0 byte x \\b.%d
";
        let description = describe_with(db, b"ID3\x04\x00rest").unwrap();
        assert_eq!(description.text, "Audio file with ID3 version 2.4.0");
    }

    #[test]
    fn test_string_greater_prints_c_string() {
        let db = "\
0 string %PDF- PDF document
>5 string >\\0 \\b, version %s
";
        let description = describe_with(db, b"%PDF-1.7\n%\xe2\xe3").unwrap();
        assert_eq!(description.text, "PDF document, version 1.7");
    }

    #[test]
    fn test_case_insensitive_search() {
        let db = "0 search/64/c \\<html HTML document\n";
        assert!(describe_with(db, b"\n\n  <HTML><body>").is_some());
        assert!(describe_with(db, b"plain text only").is_none());
    }

    #[test]
    fn test_search_range_is_bounded() {
        let db = "0 search/4 MAGIC found\n";
        assert!(describe_with(db, b"...MAGIC").is_some());
        assert!(describe_with(db, b"....MAGIC").is_none());
    }

    #[test]
    fn test_compact_whitespace() {
        let db = "0 string/W #!\\ /bin/sh script\n";
        assert!(describe_with(db, b"#!   /bin/sh\n").is_some());
        assert!(describe_with(db, b"#!/bin/sh\n").is_none());

        let db = "0 string/w #!\\ /bin/sh script\n";
        assert!(describe_with(db, b"#!/bin/sh\n").is_some());
    }

    #[test]
    fn test_not_equal_string() {
        let db = "0 string !MZ not dos\n";
        assert!(describe_with(db, b"ELF").is_some());
        assert!(describe_with(db, b"MZ\x90\x00").is_none());
    }

    #[test]
    fn test_children_not_tested_when_parent_fails() {
        let db = "\
0 byte 0x7f maybe
>1 string ELF ELF
";
        let description = describe_with(db, b"\x7fELF").unwrap();
        assert_eq!(description.text, "maybe ELF");
        assert!(describe_with(db, b"\x7eELF").is_none());
    }
}
