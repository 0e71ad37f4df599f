//! Core types used throughout the sigbridge library.
//!
//! This module defines module statuses and identification, file
//! identifiers, blackboard attributes and artifacts, and the result of
//! a signature match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The status a module reports back to the pipeline host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// The module completed its work.
    Ok,
    /// The module should be the last one run on this file.
    Stop,
    /// The module failed.
    Fail,
}

impl ModuleStatus {
    /// Returns `true` for [`ModuleStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns `true` for [`ModuleStatus::Fail`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Stop => write!(f, "stop"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Identification triple every pipeline module exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Stable module name, also used as the attribute source.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Module version.
    pub version: String,
}

impl ModuleInfo {
    /// Creates a new `ModuleInfo`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: version.into(),
        }
    }
}

/// Host-assigned identifier of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl FileId {
    /// Returns the raw identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FileId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Kind of fact stored in a blackboard attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// File type label derived from a content signature.
    FileTypeSig,
    /// MIME type.
    MimeType,
    /// Free-form comment.
    Comment,
}

impl AttributeType {
    /// Returns the stable name of this attribute type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileTypeSig => "TSK_FILE_TYPE_SIG",
            Self::MimeType => "TSK_MIME_TYPE",
            Self::Comment => "TSK_COMMENT",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value carried by a blackboard attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for AttributeValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// A single fact posted to the blackboard by a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardAttribute {
    /// What kind of fact this is.
    pub attribute_type: AttributeType,

    /// Name of the module that posted it.
    pub module_name: String,

    /// Optional free-form context (empty when unused).
    pub context: String,

    /// The value.
    pub value: AttributeValue,

    /// When the attribute was created.
    pub created_at: DateTime<Utc>,
}

impl BlackboardAttribute {
    /// Creates a new attribute with an empty context.
    pub fn new(
        attribute_type: AttributeType,
        module_name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            attribute_type,
            module_name: module_name.into(),
            context: String::new(),
            value: value.into(),
            created_at: Utc::now(),
        }
    }

    /// Sets the context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Kind of artifact grouping attributes on the blackboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// The per-file general information artifact.
    GenInfo,
}

/// A group of attributes about one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardArtifact {
    /// Unique artifact identifier.
    pub id: String,

    /// File this artifact describes.
    pub file_id: FileId,

    /// Artifact kind.
    pub artifact_type: ArtifactType,

    /// Attributes in the order they were posted.
    pub attributes: Vec<BlackboardAttribute>,
}

impl BlackboardArtifact {
    /// Creates an empty artifact for a file.
    pub fn new(file_id: FileId, artifact_type: ArtifactType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_id,
            artifact_type,
            attributes: Vec::new(),
        }
    }

    /// Returns the attributes of the given type.
    pub fn attributes_of(&self, attribute_type: AttributeType) -> impl Iterator<Item = &BlackboardAttribute> {
        self.attributes
            .iter()
            .filter(move |a| a.attribute_type == attribute_type)
    }
}

/// The result of matching a buffer against a signature database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    /// Human-readable description, e.g. `PNG image data, 16 x 16`.
    pub description: String,

    /// MIME type, if the matching signature declares one.
    pub mime: Option<String>,
}

impl Identification {
    /// Creates a new identification.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            mime: None,
        }
    }

    /// Sets the MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
