//! Parsed signature entries.

/// Base multiplier used when ranking top-level entries.
const STRENGTH_MULT: i64 = 10;

/// Byte order of a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// Modifiers for `string` and `search` tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringFlags {
    /// `c`: ASCII letters compare case-insensitively.
    pub case_insensitive: bool,
    /// `W`: a blank in the pattern matches one or more whitespace bytes.
    pub compact_whitespace: bool,
    /// `w`: a blank in the pattern matches zero or more whitespace bytes.
    pub optional_whitespace: bool,
}

/// How the bytes at the entry offset are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// A fixed-width integer.
    Numeric {
        /// Width in bytes (1, 2, 4 or 8).
        width: usize,
        /// Byte order.
        endian: Endian,
        /// Whether `<` and `>` compare as two's complement. Unprefixed
        /// types are signed, `u`-prefixed ones are not.
        signed: bool,
        /// Mask applied to the value before comparing.
        mask: Option<u64>,
    },
    /// A byte string compared at the offset.
    String {
        /// Comparison modifiers.
        flags: StringFlags,
    },
    /// A byte string searched for within `range` bytes of the offset.
    Search {
        /// Number of starting positions to try.
        range: usize,
        /// Comparison modifiers.
        flags: StringFlags,
    },
}

/// Comparison operator of a numeric test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    /// `=`
    Equal,
    /// `!`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `&`: every bit of the test value is set.
    AllSet,
    /// `^`: at least one bit of the test value is clear.
    NotAllSet,
    /// `x`
    Any,
}

impl NumericOp {
    /// Applies the operator to a `width`-byte value read from the buffer.
    ///
    /// Both operands are already truncated to `width` bytes; ordering
    /// operators sign-extend them first when `signed` is set.
    pub fn apply(&self, actual: u64, expected: u64, width: usize, signed: bool) -> bool {
        let ordering = if signed {
            sign_extend(actual, width).cmp(&sign_extend(expected, width))
        } else {
            actual.cmp(&expected)
        };

        match self {
            Self::Equal => actual == expected,
            Self::NotEqual => actual != expected,
            Self::Less => ordering.is_lt(),
            Self::Greater => ordering.is_gt(),
            Self::AllSet => (actual & expected) == expected,
            Self::NotAllSet => (actual & expected) != expected,
            Self::Any => true,
        }
    }
}

/// Comparison operator of a string test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    /// `=`
    Equal,
    /// `!`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `x`
    Any,
}

/// The test applied at an entry's offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// Compare an integer.
    Numeric {
        /// Operator.
        op: NumericOp,
        /// Right-hand side, already truncated to the value width.
        value: u64,
    },
    /// Compare a byte string.
    String {
        /// Operator.
        op: StringOp,
        /// Pattern with escapes resolved.
        pattern: Vec<u8>,
    },
}

/// Where an entry reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    /// From the start of the buffer.
    Absolute(u64),
    /// From the end of the parent's match.
    Relative(i64),
}

/// Adjustment declared with `!:strength`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthAdjust {
    /// `+n`
    Add(i64),
    /// `-n`
    Sub(i64),
    /// `*n`
    Mul(i64),
    /// `/n`
    Div(i64),
}

impl StrengthAdjust {
    fn apply(&self, strength: i64) -> i64 {
        match *self {
            Self::Add(n) => strength.saturating_add(n),
            Self::Sub(n) => strength.saturating_sub(n),
            Self::Mul(n) => strength.saturating_mul(n),
            Self::Div(n) => strength.checked_div(n).unwrap_or(strength),
        }
    }
}

/// Interprets the low `width` bytes of `value` as a signed integer.
pub(crate) fn sign_extend(value: u64, width: usize) -> i64 {
    if width == 0 || width >= 8 {
        return value as i64;
    }
    let shift = 64 - width * 8;
    ((value << shift) as i64) >> shift
}

/// One line of a signature database plus its continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Continuation depth (number of leading `>`).
    pub level: usize,
    /// 1-based source line.
    pub line: usize,
    /// Where to read.
    pub offset: Offset,
    /// How to read.
    pub value_type: ValueType,
    /// What to compare.
    pub test: Test,
    /// Message template appended to the description on a match.
    pub message: String,
    /// MIME type declared with `!:mime`.
    pub mime: Option<String>,
    /// Adjustment declared with `!:strength`.
    pub strength_adjust: Option<StrengthAdjust>,
    /// Continuation entries, in source order.
    pub children: Vec<Entry>,
}

impl Entry {
    /// Returns the rank of this entry among top-level entries.
    ///
    /// More specific tests rank higher: wide values and long patterns add
    /// to the score, inexact operators subtract from it.
    pub fn strength(&self) -> i64 {
        let mut value = 2 * STRENGTH_MULT;

        match (&self.value_type, &self.test) {
            (ValueType::Numeric { width, .. }, _) => {
                value += *width as i64 * STRENGTH_MULT;
            }
            (ValueType::String { .. }, Test::String { pattern, .. }) => {
                value += pattern.len() as i64 * STRENGTH_MULT;
            }
            (ValueType::Search { .. }, Test::String { pattern, .. }) => {
                let len = pattern.len() as i64;
                if len > 0 {
                    value += len * (STRENGTH_MULT / len).max(1);
                }
            }
            _ => {}
        }

        match self.test {
            Test::Numeric { op, .. } => match op {
                NumericOp::Any | NumericOp::NotEqual => value = 0,
                NumericOp::Equal => value += STRENGTH_MULT,
                NumericOp::Less | NumericOp::Greater => value -= 2 * STRENGTH_MULT,
                NumericOp::AllSet | NumericOp::NotAllSet => value -= STRENGTH_MULT,
            },
            Test::String { op, .. } => match op {
                StringOp::Any | StringOp::NotEqual => value = 0,
                StringOp::Equal => value += STRENGTH_MULT,
                StringOp::Less | StringOp::Greater => value -= 2 * STRENGTH_MULT,
            },
        }

        if let Some(adjust) = self.strength_adjust {
            value = adjust.apply(value);
        }

        value.max(1)
    }

    /// Returns the number of entries in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Entry::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value_type: ValueType, test: Test) -> Entry {
        Entry {
            level: 0,
            line: 1,
            offset: Offset::Absolute(0),
            value_type,
            test,
            message: String::new(),
            mime: None,
            strength_adjust: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_numeric_ops() {
        assert!(NumericOp::Equal.apply(5, 5, 4, false));
        assert!(NumericOp::NotEqual.apply(5, 6, 4, false));
        assert!(NumericOp::Less.apply(4, 5, 4, false));
        assert!(NumericOp::Greater.apply(6, 5, 4, false));
        assert!(NumericOp::AllSet.apply(0b1110, 0b0110, 1, false));
        assert!(!NumericOp::AllSet.apply(0b1010, 0b0110, 1, false));
        assert!(NumericOp::NotAllSet.apply(0b1010, 0b0110, 1, false));
        assert!(NumericOp::Any.apply(0, 99, 1, false));
    }

    #[test]
    fn test_signed_ordering() {
        // 0x80 is -128 as a signed byte and 128 as an unsigned one.
        assert!(NumericOp::Less.apply(0x80, 0, 1, true));
        assert!(!NumericOp::Less.apply(0x80, 0, 1, false));
        assert!(NumericOp::Less.apply(0xffff_ffff, 0, 4, true));
        assert!(NumericOp::Greater.apply(0xffff_ffff, 0, 4, false));

        // `byte >-1` after truncation: 0 > -1 signed, 0 > 255 unsigned.
        assert!(NumericOp::Greater.apply(0, 0xff, 1, true));
        assert!(!NumericOp::Greater.apply(0, 0xff, 1, false));

        assert!(NumericOp::Equal.apply(0xff, 0xff, 1, true));
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xff, 1), -1);
        assert_eq!(sign_extend(0x7f, 1), 127);
        assert_eq!(sign_extend(0xfffe, 2), -2);
        assert_eq!(sign_extend(u64::MAX, 8), -1);
    }

    #[test]
    fn test_strength_adjust_saturates() {
        assert_eq!(StrengthAdjust::Mul(i64::MAX).apply(70), i64::MAX);
        assert_eq!(StrengthAdjust::Add(i64::MAX).apply(70), i64::MAX);
        assert_eq!(StrengthAdjust::Sub(i64::MAX).apply(-70), i64::MIN);
        assert_eq!(StrengthAdjust::Div(-1).apply(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_strength_prefers_longer_patterns() {
        let short = entry(
            ValueType::String {
                flags: StringFlags::default(),
            },
            Test::String {
                op: StringOp::Equal,
                pattern: b"PK".to_vec(),
            },
        );
        let long = entry(
            ValueType::String {
                flags: StringFlags::default(),
            },
            Test::String {
                op: StringOp::Equal,
                pattern: b"%PDF-".to_vec(),
            },
        );
        assert_eq!(short.strength(), 20 + 20 + 10);
        assert_eq!(long.strength(), 20 + 50 + 10);
    }

    #[test]
    fn test_strength_numeric_and_adjust() {
        let mut e = entry(
            ValueType::Numeric {
                width: 4,
                endian: Endian::Big,
                signed: true,
                mask: None,
            },
            Test::Numeric {
                op: NumericOp::Equal,
                value: 0x7f454c46,
            },
        );
        assert_eq!(e.strength(), 70);

        e.strength_adjust = Some(StrengthAdjust::Add(15));
        assert_eq!(e.strength(), 85);

        e.strength_adjust = Some(StrengthAdjust::Div(0));
        assert_eq!(e.strength(), 70);
    }

    #[test]
    fn test_strength_any_is_minimal() {
        let e = entry(
            ValueType::Numeric {
                width: 1,
                endian: Endian::Little,
                signed: true,
                mask: None,
            },
            Test::Numeric {
                op: NumericOp::Any,
                value: 0,
            },
        );
        assert_eq!(e.strength(), 1);
    }
}
