//! A loaded, ranked set of signature entries.

use crate::core::error::{SignatureError, SignatureResult};
use crate::core::types::Identification;
use crate::signature::entry::Entry;
use crate::signature::eval::describe;
use crate::signature::parse::parse_entries;
use crate::signature::text;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Signatures compiled into the library.
const BUILTIN: &str = include_str!("../../data/FileTypeSigModule/magic");

/// A parsed signature database.
///
/// Top-level entries are kept in descending strength order; entries of
/// equal strength keep their source order.
#[derive(Debug, Clone)]
pub struct SignatureDatabase {
    entries: Vec<Entry>,
    source: Option<PathBuf>,
}

impl SignatureDatabase {
    /// Parses a database from its text form.
    pub fn parse(text: &str) -> SignatureResult<Self> {
        let mut entries = parse_entries(text)?;
        entries.sort_by_key(|entry| Reverse(entry.strength()));
        Ok(Self {
            entries,
            source: None,
        })
    }

    /// Loads and parses a database file.
    pub async fn load(path: impl AsRef<Path>) -> SignatureResult<Self> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SignatureError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let text = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            SignatureError::parse(line, "invalid UTF-8")
        })?;

        let mut database = Self::parse(&text)?;
        database.source = Some(path.to_path_buf());

        debug!(
            path = %path.display(),
            entries = database.entries.len(),
            "Loaded signature database"
        );

        Ok(database)
    }

    /// Returns the database bundled with the library.
    pub fn builtin() -> SignatureResult<Self> {
        Self::parse(BUILTIN)
    }

    /// Identifies the content in `buffer`.
    ///
    /// The first entry, in strength order, that matches and produces a
    /// non-empty description wins. When nothing matches, the buffer is
    /// classified as text or data.
    pub fn identify(&self, buffer: &[u8]) -> Identification {
        for entry in &self.entries {
            if let Some(description) = describe(entry, buffer) {
                if description.text.is_empty() {
                    continue;
                }
                return Identification {
                    description: description.text,
                    mime: description.mime,
                };
            }
        }
        text::classify(buffer)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the database has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level entries in match order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// File the database was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
