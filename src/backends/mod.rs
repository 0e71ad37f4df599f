//! Signature matcher implementations.
//!
//! This module contains implementations of the `SignatureMatcher` trait.
//!
//! ## Available Matchers
//!
//! - [`libmagic`] - Matches with libmagic against a compiled or source database
//! - [`magic`] - Matches against the crate's own signature engine
//! - [`mock`] - A mock matcher for testing
//!
//! ## Implementing a Custom Matcher
//!
//! To plug in another identification engine, implement the
//! `SignatureMatcher` trait:
//!
//! ```rust,ignore
//! use sigbridge::core::{Identification, MatchError, SignatureMatcher};
//!
//! #[derive(Debug)]
//! pub struct MyMatcher {
//!     // Your engine's state
//! }
//!
//! impl SignatureMatcher for MyMatcher {
//!     fn name(&self) -> &str {
//!         "my-matcher"
//!     }
//!
//!     fn identify(&self, buffer: &[u8]) -> Result<Identification, MatchError> {
//!         // Implement identification logic
//!         todo!()
//!     }
//! }
//! ```

pub mod libmagic;
pub mod magic;
pub mod mock;

// Re-exports
pub use libmagic::LibmagicMatcher;
pub use magic::MagicMatcher;
pub use mock::MockMatcher;
