//! Error types for the sigbridge library.
//!
//! Every fallible operation returns one of the typed errors below. The
//! pipeline module never lets an error escape to the host; it logs the
//! error and reports [`ModuleStatus::Fail`](crate::core::ModuleStatus::Fail).

use crate::core::types::FileId;
use thiserror::Error;

/// Errors raised while loading or parsing a signature database.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The database file does not exist.
    #[error("signature database not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// A line of the database could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The signature library rejected the database.
    #[error("error loading signature database {path}: {reason}")]
    Load {
        /// Path that was loaded.
        path: String,
        /// Error reported by the library.
        reason: String,
    },

    /// An I/O error occurred while reading the database.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignatureError {
    /// Creates a `Load` error.
    pub fn load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Parse` error.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a signature matcher.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The matcher has no database loaded.
    #[error("no signature database loaded")]
    NotLoaded,

    /// The matcher could not produce a label.
    #[error("matcher '{engine}' failed: {reason}")]
    Failed {
        /// Name of the matcher.
        engine: String,
        /// Description of the failure.
        reason: String,
    },
}

impl MatchError {
    /// Creates a `Failed` error.
    pub fn failed(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            engine: engine.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while reading file content from the host.
#[derive(Debug, Error)]
pub enum FileError {
    /// The host could not read the file.
    #[error("failed to read file {file_id}: {reason}")]
    ReadFailed {
        /// File that could not be read.
        file_id: FileId,
        /// Reason for the failure.
        reason: String,
    },

    /// File not found at the specified path.
    #[error("file not found: {path}")]
    NotFound {
        /// Path that was not found.
        path: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by blackboard implementations.
#[derive(Debug, Error)]
pub enum BlackboardError {
    /// The attribute could not be stored.
    #[error("failed to store attribute: {reason}")]
    StoreFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// A record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlackboardError {
    /// Creates a `StoreFailed` error.
    pub fn store_failed(reason: impl Into<String>) -> Self {
        Self::StoreFailed {
            reason: reason.into(),
        }
    }
}

/// Top-level error for module and pipeline operations.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// `run` was called before a successful `initialize`.
    #[error("module is not initialized")]
    NotInitialized,

    /// The file reported a non-zero size but no content could be read.
    #[error("error reading file contents: no bytes read from file {file_id}")]
    EmptyRead {
        /// File that produced no content.
        file_id: FileId,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// Signature database error.
    #[error("signature database error: {0}")]
    Signature(#[from] SignatureError),

    /// Matcher error.
    #[error("error getting file type: {0}")]
    Match(#[from] MatchError),

    /// File read error.
    #[error("{0}")]
    File(#[from] FileError),

    /// Blackboard error.
    #[error("blackboard error: {0}")]
    Blackboard(#[from] BlackboardError),
}

impl ModuleError {
    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if the error means the module can never succeed
    /// until it is re-initialized.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::Configuration { .. } | Self::Signature(_)
        )
    }
}

/// A specialized `Result` type for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// A specialized `Result` type for signature database operations.
pub type SignatureResult<T> = Result<T, SignatureError>;

/// A specialized `Result` type for blackboard operations.
pub type BlackboardResult<T> = Result<T, BlackboardError>;
