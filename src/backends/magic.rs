//! Signature matcher over the crate's own magic(5) engine.
//!
//! Needs no system library, so it backs [`MagicMatcher::builtin`] and
//! embedders that ship text databases only.

use crate::core::{Identification, MatchError, SignatureMatcher};
use crate::core::error::SignatureResult;
use crate::signature::SignatureDatabase;

use std::path::Path;

/// Identifies content using a [`SignatureDatabase`].
///
/// The database is immutable once loaded, so one matcher can serve any
/// number of concurrent `identify` calls.
///
/// # Examples
///
/// ```rust
/// use sigbridge::backends::MagicMatcher;
/// use sigbridge::core::SignatureMatcher;
///
/// let matcher = MagicMatcher::builtin().unwrap();
/// let id = matcher.identify(b"%PDF-1.7\n").unwrap();
/// assert_eq!(id.description, "PDF document, version 1.7");
/// ```
#[derive(Debug, Clone)]
pub struct MagicMatcher {
    name: String,
    database: SignatureDatabase,
}

impl MagicMatcher {
    /// Creates a matcher over an already-parsed database.
    pub fn new(database: SignatureDatabase) -> Self {
        Self {
            name: "magic".to_string(),
            database,
        }
    }

    /// Loads the database at `path` and creates a matcher over it.
    pub async fn open(path: impl AsRef<Path>) -> SignatureResult<Self> {
        Ok(Self::new(SignatureDatabase::load(path).await?))
    }

    /// Creates a matcher over the bundled database.
    pub fn builtin() -> SignatureResult<Self> {
        Ok(Self::new(SignatureDatabase::builtin()?))
    }

    /// Sets the name of this matcher.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the underlying database.
    pub fn database(&self) -> &SignatureDatabase {
        &self.database
    }
}

impl SignatureMatcher for MagicMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn identify(&self, buffer: &[u8]) -> Result<Identification, MatchError> {
        if self.database.is_empty() {
            return Err(MatchError::NotLoaded);
        }
        Ok(self.database.identify(buffer))
    }

    fn database_version(&self) -> Option<String> {
        let count = self.database.len();
        Some(match self.database.source() {
            Some(path) => format!("{} ({} signatures)", path.display(), count),
            None => format!("builtin ({} signatures)", count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_matcher() {
        let matcher = MagicMatcher::builtin().unwrap();
        assert_eq!(matcher.name(), "magic");

        let id = matcher.identify(b"GIF89a\x10\x00\x20\x00").unwrap();
        assert_eq!(id.description, "GIF image data, version 89a, 16 x 32");
        assert_eq!(id.mime.as_deref(), Some("image/gif"));

        let version = matcher.database_version().unwrap();
        assert!(version.starts_with("builtin ("));
    }

    #[test]
    fn test_empty_database_is_not_loaded() {
        let matcher = MagicMatcher::new(SignatureDatabase::parse("# nothing\n").unwrap());
        assert!(matches!(
            matcher.identify(b"anything"),
            Err(MatchError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_open_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("magic");
        tokio::fs::write(&path, "0 string \\xca\\xfe custom format\n")
            .await
            .unwrap();

        let matcher = MagicMatcher::open(&path).await.unwrap().with_name("custom");
        assert_eq!(matcher.name(), "custom");
        assert_eq!(
            matcher.identify(b"\xca\xfe\x00").unwrap().description,
            "custom format"
        );
        assert!(matcher
            .database_version()
            .unwrap()
            .contains("(1 signatures)"));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(MagicMatcher::open(temp.path().join("missing")).await.is_err());
    }
}
