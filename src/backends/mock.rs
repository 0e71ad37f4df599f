//! Mock matcher for testing.
//!
//! This module provides a configurable mock matcher that can be used
//! in tests to simulate identification outcomes without loading a
//! signature database.

use crate::core::{Identification, MatchError, SignatureMatcher};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// A mock matcher for testing purposes.
///
/// The mock matcher returns a fixed label for every buffer, or a
/// specific label for buffers that start with a registered prefix.
///
/// # Examples
///
/// ```rust
/// use sigbridge::backends::MockMatcher;
/// use sigbridge::core::{Identification, SignatureMatcher};
///
/// // A matcher that labels everything the same way
/// let matcher = MockMatcher::new("PNG image data");
///
/// // A matcher with a response per content prefix
/// let matcher = MockMatcher::new("data")
///     .with_response(b"%PDF", Identification::new("PDF document"));
///
/// // A matcher whose every call fails
/// let matcher = MockMatcher::failing("engine crashed");
/// ```
#[derive(Debug)]
pub struct MockMatcher {
    /// Name of this matcher instance.
    name: String,
    /// Responses keyed by content prefix.
    responses: RwLock<Vec<(Vec<u8>, Identification)>>,
    /// Label for buffers with no registered prefix.
    default: Identification,
    /// Failure reason, if every call should fail.
    failure: RwLock<Option<String>>,
    /// Counter for identify calls.
    call_count: AtomicU64,
    /// Buffers passed to `identify`, most recent last.
    seen: Mutex<Vec<Vec<u8>>>,
}

impl MockMatcher {
    /// Creates a mock matcher that returns `label` for every buffer.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses: RwLock::new(Vec::new()),
            default: Identification::new(label),
            failure: RwLock::new(None),
            call_count: AtomicU64::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock matcher whose every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let matcher = Self::new("");
        matcher.set_failure(Some(reason.into()));
        matcher
    }

    /// Sets the name of this matcher.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the label for buffers with no registered prefix.
    pub fn with_default(mut self, identification: Identification) -> Self {
        self.default = identification;
        self
    }

    /// Adds a response for buffers starting with `prefix`.
    pub fn with_response(self, prefix: impl AsRef<[u8]>, identification: Identification) -> Self {
        self.add_response(prefix, identification);
        self
    }

    /// Adds a response for buffers starting with `prefix` (mutable version).
    pub fn add_response(&self, prefix: impl AsRef<[u8]>, identification: Identification) {
        self.responses
            .write()
            .unwrap()
            .push((prefix.as_ref().to_vec(), identification));
    }

    /// Makes every later call fail with the given reason, or succeed again
    /// with `None`.
    pub fn set_failure(&self, reason: Option<String>) {
        *self.failure.write().unwrap() = reason;
    }

    /// Returns the number of identify calls.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Returns the buffer passed to the most recent call.
    pub fn last_buffer(&self) -> Option<Vec<u8>> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Default for MockMatcher {
    fn default() -> Self {
        Self::new("data")
    }
}

impl SignatureMatcher for MockMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn identify(&self, buffer: &[u8]) -> Result<Identification, MatchError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.seen.lock().unwrap().push(buffer.to_vec());

        if let Some(reason) = self.failure.read().unwrap().as_ref() {
            return Err(MatchError::failed(&self.name, reason.clone()));
        }

        let identification = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(prefix, _)| buffer.starts_with(prefix))
            .map(|(_, identification)| identification.clone())
            .unwrap_or_else(|| self.default.clone());

        Ok(identification)
    }

    fn database_version(&self) -> Option<String> {
        Some("mock".to_string())
    }
}
