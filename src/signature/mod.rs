//! Signature database and matching engine.
//!
//! Databases use the magic(5) text format: one test per line, with
//! continuation lines prefixed by `>`. A file is described by the
//! strongest top-level entry that matches its leading bytes, extended by
//! every matching continuation below it.
//!
//! ```text
//! 0       string  \x89PNG\r\n\x1a\n   PNG image data
//! !:mime  image/png
//! >16     belong  x                   \b, %d x
//! >20     belong  x                   %d
//! ```

mod database;
mod entry;
mod eval;
mod format;
mod parse;
pub mod text;

pub use database::SignatureDatabase;
pub use entry::{
    Endian, Entry, NumericOp, Offset, StrengthAdjust, StringFlags, StringOp, Test, ValueType,
};
