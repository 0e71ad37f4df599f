//! Text/data classification used when no signature matches.

use crate::core::types::Identification;

/// Classifies a buffer that matched no signature.
///
/// Empty buffers are `empty`, printable 7-bit content is `ASCII text`,
/// valid UTF-8 with non-ASCII characters is `UTF-8 Unicode text`, and
/// anything else is `data`. Text labels note unusual line terminators.
pub fn classify(buffer: &[u8]) -> Identification {
    if buffer.is_empty() {
        return Identification::new("empty").with_mime("application/x-empty");
    }

    let kind = if buffer.iter().all(|&b| b.is_ascii() && is_text_byte(b)) {
        "ASCII text"
    } else if is_utf8_text(buffer) {
        "UTF-8 Unicode text"
    } else {
        return Identification::new("data").with_mime("application/octet-stream");
    };

    Identification::new(format!("{}{}", kind, line_terminators(buffer))).with_mime("text/plain")
}

/// Printable ASCII plus the control characters common in text files.
fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x20..=0x7e | b'\t' | b'\n' | b'\r' | 0x0c | 0x1b | 0x08)
}

/// Returns `true` for valid UTF-8 without stray control characters.
///
/// The buffer is a prefix of the file, so a multi-byte sequence cut off
/// at the very end is tolerated.
fn is_utf8_text(buffer: &[u8]) -> bool {
    let valid = match std::str::from_utf8(buffer) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => {
            match std::str::from_utf8(&buffer[..err.valid_up_to()]) {
                Ok(text) => text,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    valid
        .chars()
        .all(|c| !c.is_control() || (c.is_ascii() && is_text_byte(c as u8)))
}

fn line_terminators(buffer: &[u8]) -> String {
    let (mut crlf, mut cr, mut lf) = (0usize, 0usize, 0usize);
    let mut i = 0;
    while i < buffer.len() {
        match buffer[i] {
            b'\r' if buffer.get(i + 1) == Some(&b'\n') => {
                crlf += 1;
                i += 1;
            }
            b'\r' => cr += 1,
            b'\n' => lf += 1,
            _ => {}
        }
        i += 1;
    }

    if crlf == 0 && cr == 0 {
        return if lf == 0 {
            ", with no line terminators".to_string()
        } else {
            String::new()
        };
    }

    let mut kinds = Vec::new();
    if crlf > 0 {
        kinds.push("CRLF");
    }
    if cr > 0 {
        kinds.push("CR");
    }
    if lf > 0 {
        kinds.push("LF");
    }
    format!(", with {} line terminators", kinds.join(", "))
}
