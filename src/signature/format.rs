//! printf-style rendering of entry messages.

use crate::core::sanitize::clean_utf8;
use crate::signature::entry::sign_extend;

use std::iter::Peekable;
use std::str::Chars;

/// Widest field a conversion pads to; labels are cut shorter than this.
const MAX_FIELD_WIDTH: usize = 1024;

/// The value an entry matched, substituted into its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchValue<'a> {
    /// An integer read with the given width in bytes.
    Number { value: u64, width: usize },
    /// Bytes taken from the buffer.
    Bytes(&'a [u8]),
}

#[derive(Debug, Default)]
struct Directive {
    left: bool,
    zero: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Renders `template`, replacing each conversion with `value`.
///
/// Unknown conversions are copied through unchanged.
pub(crate) fn format_message(template: &str, value: MatchValue<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left = true,
                '0' => directive.zero = true,
                '#' => directive.alternate = true,
                '+' | ' ' => {}
                _ => break,
            }
            chars.next();
        }
        directive.width = read_count(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(read_count(&mut chars));
        }
        while matches!(chars.peek(), Some('h' | 'l' | 'q' | 'j' | 'z' | 't' | 'L')) {
            chars.next();
        }

        match chars.next() {
            Some(conversion) => out.push_str(&render(conversion, &directive, value)),
            None => out.push('%'),
        }
    }

    out
}

/// Reads a run of decimal digits, clamped to [`MAX_FIELD_WIDTH`].
fn read_count(chars: &mut Peekable<Chars<'_>>) -> usize {
    let mut count: usize = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        count = count
            .saturating_mul(10)
            .saturating_add(digit as usize)
            .min(MAX_FIELD_WIDTH);
        chars.next();
    }
    count
}

fn render(conversion: char, directive: &Directive, value: MatchValue<'_>) -> String {
    let numeric = matches!(conversion, 'd' | 'i' | 'u' | 'x' | 'X' | 'o');

    let body = match (conversion, value) {
        ('d' | 'i', MatchValue::Number { value, width }) => sign_extend(value, width).to_string(),
        ('u', MatchValue::Number { value, .. }) => value.to_string(),
        ('x', MatchValue::Number { value, .. }) if directive.alternate => format!("0x{:x}", value),
        ('x', MatchValue::Number { value, .. }) => format!("{:x}", value),
        ('X', MatchValue::Number { value, .. }) if directive.alternate => format!("0X{:X}", value),
        ('X', MatchValue::Number { value, .. }) => format!("{:X}", value),
        ('o', MatchValue::Number { value, .. }) if directive.alternate => format!("0{:o}", value),
        ('o', MatchValue::Number { value, .. }) => format!("{:o}", value),
        ('c', MatchValue::Number { value, .. }) => char::from(value as u8).to_string(),
        ('s', MatchValue::Number { value, .. }) => value.to_string(),
        ('s' | 'c' | 'd' | 'i' | 'u' | 'x' | 'X' | 'o', MatchValue::Bytes(bytes)) => {
            let bytes = match directive.precision {
                Some(precision) => &bytes[..precision.min(bytes.len())],
                None => bytes,
            };
            clean_utf8(bytes)
        }
        (other, _) => return format!("%{}", other),
    };

    pad(body, directive, numeric && matches!(value, MatchValue::Number { .. }))
}

fn pad(body: String, directive: &Directive, numeric: bool) -> String {
    let len = body.chars().count();
    if len >= directive.width {
        return body;
    }
    let fill = directive.width - len;

    if directive.left {
        format!("{}{}", body, " ".repeat(fill))
    } else if directive.zero && numeric {
        match body.strip_prefix('-') {
            Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
            None => format!("{}{}", "0".repeat(fill), body),
        }
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}
