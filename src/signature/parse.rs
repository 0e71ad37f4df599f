//! Parser for the text signature database format.
//!
//! Each non-comment line is `<level><offset> <type> <test> <message>`,
//! where `<level>` is a run of `>` characters. Lines starting with `!:`
//! attach a directive to the entry parsed just before them.

use crate::core::error::{SignatureError, SignatureResult};
use crate::signature::entry::{
    Endian, Entry, NumericOp, Offset, StrengthAdjust, StringFlags, StringOp, Test, ValueType,
};

/// Parses a whole database into a forest of top-level entries, in source
/// order.
pub(crate) fn parse_entries(text: &str) -> SignatureResult<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::new();
    let mut last_level: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_start();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(directive) = line.strip_prefix("!:") {
            let entry = last_level
                .and_then(|level| last_at_level(&mut entries, level))
                .ok_or_else(|| SignatureError::parse(line_no, "directive before any entry"))?;
            apply_directive(entry, directive, line_no)?;
            continue;
        }

        let entry = parse_entry(line, line_no)?;
        let level = entry.level;

        if level == 0 {
            entries.push(entry);
        } else {
            let parent = last_at_level(&mut entries, level - 1).ok_or_else(|| {
                SignatureError::parse(line_no, format!("level {} entry has no parent", level))
            })?;
            parent.children.push(entry);
        }

        last_level = Some(level);
    }

    Ok(entries)
}

/// Returns the most recently added entry at `level`.
fn last_at_level(entries: &mut [Entry], level: usize) -> Option<&mut Entry> {
    let mut current = entries.last_mut()?;
    for _ in 0..level {
        current = current.children.last_mut()?;
    }
    Some(current)
}

fn apply_directive(entry: &mut Entry, directive: &str, line_no: usize) -> SignatureResult<()> {
    let (name, argument) = match directive.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (directive.trim(), ""),
    };

    match name {
        "mime" => {
            if argument.is_empty() {
                return Err(SignatureError::parse(line_no, "missing MIME type"));
            }
            entry.mime = Some(argument.to_string());
        }
        "strength" => {
            entry.strength_adjust = Some(parse_strength(argument, line_no)?);
        }
        // ext, apple and friends carry nothing we report.
        _ => {}
    }

    Ok(())
}

fn parse_strength(argument: &str, line_no: usize) -> SignatureResult<StrengthAdjust> {
    let mut chars = argument.chars();
    let op = chars
        .next()
        .ok_or_else(|| SignatureError::parse(line_no, "missing strength adjustment"))?;
    let amount = parse_number(chars.as_str().trim())
        .ok_or_else(|| SignatureError::parse(line_no, format!("invalid strength '{}'", argument)))?
        as i64;

    match op {
        '+' => Ok(StrengthAdjust::Add(amount)),
        '-' => Ok(StrengthAdjust::Sub(amount)),
        '*' => Ok(StrengthAdjust::Mul(amount)),
        '/' => Ok(StrengthAdjust::Div(amount)),
        _ => Err(SignatureError::parse(
            line_no,
            format!("invalid strength operator '{}'", op),
        )),
    }
}

fn parse_entry(line: &str, line_no: usize) -> SignatureResult<Entry> {
    let level = line.bytes().take_while(|&b| b == b'>').count();
    let rest = &line[level..];

    let (offset_token, rest) =
        next_token(rest).ok_or_else(|| SignatureError::parse(line_no, "missing offset"))?;
    let (type_token, rest) =
        next_token(rest).ok_or_else(|| SignatureError::parse(line_no, "missing type"))?;
    let (test_token, rest) =
        next_token(rest).ok_or_else(|| SignatureError::parse(line_no, "missing test"))?;

    let offset = parse_offset(offset_token, level, line_no)?;
    let value_type = parse_type(type_token, line_no)?;
    let test = parse_test(test_token, &value_type, line_no)?;

    Ok(Entry {
        level,
        line: line_no,
        offset,
        value_type,
        test,
        message: rest.trim().to_string(),
        mime: None,
        strength_adjust: None,
        children: Vec::new(),
    })
}

/// Splits off the next whitespace-delimited token. A backslash escapes
/// the following character, so `\ ` does not end a token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b.is_ascii_whitespace() => break,
            _ => i += 1,
        }
    }
    let end = i.min(bytes.len());
    Some((&s[..end], &s[end..]))
}

fn parse_offset(token: &str, level: usize, line_no: usize) -> SignatureResult<Offset> {
    if token.starts_with('(') {
        return Err(SignatureError::parse(
            line_no,
            "indirect offsets are not supported",
        ));
    }

    if let Some(relative) = token.strip_prefix('&') {
        if level == 0 {
            return Err(SignatureError::parse(
                line_no,
                "relative offset on a top-level entry",
            ));
        }
        let delta = parse_number(relative)
            .ok_or_else(|| SignatureError::parse(line_no, format!("invalid offset '{}'", token)))?;
        return Ok(Offset::Relative(delta as i64));
    }

    parse_number(token)
        .map(Offset::Absolute)
        .ok_or_else(|| SignatureError::parse(line_no, format!("invalid offset '{}'", token)))
}

fn parse_type(token: &str, line_no: usize) -> SignatureResult<ValueType> {
    let (base, mask) = match token.split_once('&') {
        Some((base, mask)) => {
            let mask = parse_number(mask)
                .ok_or_else(|| SignatureError::parse(line_no, format!("invalid mask '{}'", mask)))?;
            (base, Some(mask))
        }
        None => (token, None),
    };

    let mut parts = base.split('/');
    let name = parts.next().unwrap_or_default();

    let numeric = match name.strip_prefix('u').and_then(numeric_type) {
        Some((width, endian)) => Some((width, endian, false)),
        None => numeric_type(name).map(|(width, endian)| (width, endian, true)),
    };

    if let Some((width, endian, signed)) = numeric {
        if parts.next().is_some() {
            return Err(SignatureError::parse(
                line_no,
                format!("numeric type '{}' takes no modifiers", name),
            ));
        }
        return Ok(ValueType::Numeric {
            width,
            endian,
            signed,
            mask,
        });
    }

    if mask.is_some() {
        return Err(SignatureError::parse(
            line_no,
            format!("type '{}' does not take a mask", name),
        ));
    }

    let mut flags = StringFlags::default();
    let mut range = None;
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if part.bytes().all(|b| b.is_ascii_digit()) || part.starts_with("0x") {
            let value = parse_number(part).ok_or_else(|| {
                SignatureError::parse(line_no, format!("invalid range '{}'", part))
            })?;
            range = Some(value as usize);
            continue;
        }
        for flag in part.chars() {
            match flag {
                'c' | 'C' => flags.case_insensitive = true,
                'W' => flags.compact_whitespace = true,
                'w' => flags.optional_whitespace = true,
                // Flags that only affect printing or binary/text hints.
                't' | 'b' | 'T' | 's' => {}
                _ => {
                    return Err(SignatureError::parse(
                        line_no,
                        format!("unknown string flag '{}'", flag),
                    ))
                }
            }
        }
    }

    match name {
        "string" => Ok(ValueType::String { flags }),
        "search" => {
            let range = range.ok_or_else(|| {
                SignatureError::parse(line_no, "search requires a range, e.g. search/256")
            })?;
            Ok(ValueType::Search { range, flags })
        }
        _ => Err(SignatureError::parse(
            line_no,
            format!("unknown type '{}'", name),
        )),
    }
}

fn numeric_type(name: &str) -> Option<(usize, Endian)> {
    let ty = match name {
        "byte" => (1, Endian::Little),
        "short" | "leshort" => (2, Endian::Little),
        "long" | "lelong" => (4, Endian::Little),
        "quad" | "lequad" => (8, Endian::Little),
        "beshort" => (2, Endian::Big),
        "belong" => (4, Endian::Big),
        "bequad" => (8, Endian::Big),
        _ => return None,
    };
    Some(ty)
}

fn parse_test(token: &str, value_type: &ValueType, line_no: usize) -> SignatureResult<Test> {
    match value_type {
        ValueType::Numeric { width, .. } => {
            if token == "x" {
                return Ok(Test::Numeric {
                    op: NumericOp::Any,
                    value: 0,
                });
            }

            let (op, rest) = match token.as_bytes()[0] {
                b'=' => (NumericOp::Equal, &token[1..]),
                b'!' => (NumericOp::NotEqual, &token[1..]),
                b'<' => (NumericOp::Less, &token[1..]),
                b'>' => (NumericOp::Greater, &token[1..]),
                b'&' => (NumericOp::AllSet, &token[1..]),
                b'^' => (NumericOp::NotAllSet, &token[1..]),
                _ => (NumericOp::Equal, token),
            };

            let value = parse_number(rest).ok_or_else(|| {
                SignatureError::parse(line_no, format!("invalid numeric test '{}'", token))
            })?;

            Ok(Test::Numeric {
                op,
                value: truncate(value, *width),
            })
        }
        ValueType::String { .. } | ValueType::Search { .. } => {
            if token == "x" {
                return Ok(Test::String {
                    op: StringOp::Any,
                    pattern: Vec::new(),
                });
            }

            let (op, rest) = match token.as_bytes()[0] {
                b'=' => (StringOp::Equal, &token[1..]),
                b'!' => (StringOp::NotEqual, &token[1..]),
                b'<' => (StringOp::Less, &token[1..]),
                b'>' => (StringOp::Greater, &token[1..]),
                _ => (StringOp::Equal, token),
            };

            let pattern = unescape(rest).map_err(|reason| SignatureError::parse(line_no, reason))?;
            if pattern.is_empty() {
                return Err(SignatureError::parse(line_no, "empty string pattern"));
            }

            Ok(Test::String { op, pattern })
        }
    }
}

/// Truncates a value to `width` bytes.
fn truncate(value: u64, width: usize) -> u64 {
    if width >= 8 {
        value
    } else {
        value & ((1u64 << (width * 8)) - 1)
    }
}

/// Parses a decimal, `0x` hexadecimal or `0`-prefixed octal number with
/// an optional sign. Negative numbers wrap to their two's complement.
pub(crate) fn parse_number(token: &str) -> Option<u64> {
    let (negative, body) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };

    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        u64::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<u64>().ok()?
    };

    Some(if negative { value.wrapping_neg() } else { value })
}

/// Resolves backslash escapes in a string pattern.
pub(crate) fn unescape(s: &str) -> Result<Vec<u8>, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }

        let escaped = *bytes
            .get(i)
            .ok_or_else(|| "trailing backslash in pattern".to_string())?;
        i += 1;

        match escaped {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'x' => {
                let digits = take_while_max(&bytes[i..], 2, |c| c.is_ascii_hexdigit());
                if digits.is_empty() {
                    return Err("\\x without hex digits".to_string());
                }
                i += digits.len();
                out.push(radix_byte(digits, 16));
            }
            b'0'..=b'7' => {
                let rest = take_while_max(&bytes[i..], 2, |c| (b'0'..=b'7').contains(&c));
                let mut digits = vec![escaped];
                digits.extend_from_slice(rest);
                i += rest.len();
                out.push(radix_byte(&digits, 8));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn take_while_max(bytes: &[u8], max: usize, pred: impl Fn(u8) -> bool) -> &[u8] {
    let len = bytes.iter().take(max).take_while(|&&c| pred(c)).count();
    &bytes[..len]
}

fn radix_byte(digits: &[u8], radix: u32) -> u8 {
    digits
        .iter()
        .filter_map(|&d| (d as char).to_digit(radix))
        .fold(0u32, |acc, d| acc * radix + d) as u8
}
