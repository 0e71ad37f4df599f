//! Text sanitizing for values posted to the blackboard.
//!
//! Matcher labels can be built from raw file bytes (string signatures
//! print the matched data), so they are not guaranteed to be valid text.

/// Character substituted for every byte that is not valid UTF-8.
pub const REPLACEMENT_CHAR: char = '^';

/// Returns `bytes` as a `String`, replacing each byte that is not part of
/// a valid UTF-8 sequence with [`REPLACEMENT_CHAR`].
///
/// A multi-byte sequence cut short at the end of the input is replaced
/// byte by byte.
pub fn clean_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                out.push(REPLACEMENT_CHAR);
                rest = &invalid[1..];
            }
        }
    }
}

/// Prepares a matcher label for the blackboard.
///
/// The label is cut at the first NUL byte, truncated to at most `max_len`
/// bytes and then cleaned with [`clean_utf8`]. The result never contains
/// a NUL.
pub fn clean_label(raw: impl AsRef<[u8]>, max_len: usize) -> String {
    let raw = raw.as_ref();
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let end = end.min(max_len);
    clean_utf8(&raw[..end])
}
