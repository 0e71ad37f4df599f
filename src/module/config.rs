//! Host properties and module configuration.

use crate::core::{ModuleError, ModuleResult};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name, under the module directory, holding this module's data.
pub const MODULE_DATA_DIR: &str = "FileTypeSigModule";

/// Default signature database file name, a compiled libmagic database.
pub const DEFAULT_DATABASE_FILE: &str = "magic.mgc";

/// Default number of leading bytes handed to the matcher.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default maximum length of a posted label, in bytes.
pub const DEFAULT_MAX_LABEL_LEN: usize = 1023;

/// A property the pipeline host exposes to its modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemProperty {
    /// Directory where module data files are installed.
    ModuleDir,
    /// Directory for case output.
    OutputDir,
    /// Directory for system-level output.
    SystemOutDir,
}

impl SystemProperty {
    /// Returns the environment variable `from_env` reads for this property.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::ModuleDir => "SIGBRIDGE_MODULE_DIR",
            Self::OutputDir => "SIGBRIDGE_OUT_DIR",
            Self::SystemOutDir => "SIGBRIDGE_SYSTEM_OUT_DIR",
        }
    }

    const ALL: [SystemProperty; 3] = [Self::ModuleDir, Self::OutputDir, Self::SystemOutDir];
}

impl fmt::Display for SystemProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleDir => write!(f, "module_dir"),
            Self::OutputDir => write!(f, "output_dir"),
            Self::SystemOutDir => write!(f, "system_out_dir"),
        }
    }
}

/// Key/value store of host properties.
///
/// # Examples
///
/// ```rust
/// use sigbridge::module::{SystemProperties, SystemProperty};
///
/// let props = SystemProperties::new().with_module_dir("/opt/pipeline/modules");
/// assert_eq!(props.get(SystemProperty::ModuleDir), Some("/opt/pipeline/modules"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    values: HashMap<SystemProperty, String>,
}

impl SystemProperties {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every property from its environment variable, skipping unset
    /// or empty ones.
    pub fn from_env() -> Self {
        let mut props = Self::new();
        for property in SystemProperty::ALL {
            if let Ok(value) = std::env::var(property.env_var()) {
                if !value.is_empty() {
                    props.set(property, value);
                }
            }
        }
        props
    }

    /// Sets a property.
    pub fn with(mut self, property: SystemProperty, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Sets the module directory.
    pub fn with_module_dir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().display().to_string();
        self.with(SystemProperty::ModuleDir, dir)
    }

    /// Sets the output directory.
    pub fn with_output_dir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().display().to_string();
        self.with(SystemProperty::OutputDir, dir)
    }

    /// Sets a property (mutable version).
    pub fn set(&mut self, property: SystemProperty, value: impl Into<String>) {
        self.values.insert(property, value.into());
    }

    /// Returns a property value, if set.
    pub fn get(&self, property: SystemProperty) -> Option<&str> {
        self.values.get(&property).map(String::as_str)
    }
}

/// Which part of an identification is posted as the label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// The human-readable description, e.g. `PNG image data, 16 x 16`.
    #[default]
    Description,
    /// The MIME type, falling back to the description when none is known.
    Mime,
}

/// Configuration for the file-type module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Directory where module data is installed.
    pub module_dir: Option<PathBuf>,

    /// Database file name inside `<module_dir>/FileTypeSigModule`.
    pub database_file: String,

    /// Number of leading bytes read from each file.
    pub buffer_size: usize,

    /// Maximum label length in bytes.
    pub max_label_len: usize,

    /// Which part of the identification is posted.
    pub label_format: LabelFormat,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            module_dir: None,
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_label_len: DEFAULT_MAX_LABEL_LEN,
            label_format: LabelFormat::Description,
        }
    }
}

impl ModuleConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from host properties.
    pub fn from_properties(props: &SystemProperties) -> Self {
        Self {
            module_dir: props.get(SystemProperty::ModuleDir).map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Sets the module directory.
    pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = Some(dir.into());
        self
    }

    /// Sets the database file name.
    pub fn with_database_file(mut self, name: impl Into<String>) -> Self {
        self.database_file = name.into();
        self
    }

    /// Sets the number of leading bytes read from each file.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Sets the maximum label length.
    pub fn with_max_label_len(mut self, len: usize) -> Self {
        self.max_label_len = len;
        self
    }

    /// Sets the label format.
    pub fn with_label_format(mut self, format: LabelFormat) -> Self {
        self.label_format = format;
        self
    }

    /// Checks the values a builder cannot enforce, such as fields set
    /// directly or deserialized.
    pub fn validate(&self) -> ModuleResult<()> {
        if self.buffer_size == 0 {
            return Err(ModuleError::configuration("buffer_size must be at least 1"));
        }
        if self.database_file.is_empty() {
            return Err(ModuleError::configuration("database_file must not be empty"));
        }
        Ok(())
    }

    /// Returns `<module_dir>/FileTypeSigModule/<database_file>`, or `None`
    /// when no module directory is configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.module_dir
            .as_ref()
            .map(|dir| dir.join(MODULE_DATA_DIR).join(&self.database_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_config_defaults() {
        let config = ModuleConfig::default();
        assert_eq!(config.database_file, "magic.mgc");
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.max_label_len, 1023);
        assert_eq!(config.label_format, LabelFormat::Description);
        assert!(config.database_path().is_none());
    }

    #[test]
    fn test_database_path() {
        let config = ModuleConfig::new()
            .with_module_dir("/opt/modules")
            .with_database_file("custom.magic");
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/opt/modules/FileTypeSigModule/custom.magic")
        );
    }

    #[test]
    fn test_from_properties() {
        let props = SystemProperties::new()
            .with_module_dir("/srv/modules")
            .with_output_dir("/srv/out");
        let config = ModuleConfig::from_properties(&props);

        assert_eq!(config.module_dir, Some(PathBuf::from("/srv/modules")));
        assert_eq!(props.get(SystemProperty::OutputDir), Some("/srv/out"));
        assert_eq!(props.get(SystemProperty::SystemOutDir), None);
    }

    #[test]
    fn test_buffer_size_is_at_least_one() {
        assert_eq!(ModuleConfig::new().with_buffer_size(0).buffer_size, 1);
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        assert!(ModuleConfig::default().validate().is_ok());

        let mut config = ModuleConfig::default();
        config.buffer_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ModuleError::Configuration { .. })
        ));

        let config: ModuleConfig = serde_json::from_str(
            r#"{"module_dir":null,"database_file":"magic.mgc","buffer_size":0,"max_label_len":1023,"label_format":"description"}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_label_format_serde() {
        let json = serde_json::to_string(&LabelFormat::Mime).unwrap();
        assert_eq!(json, "\"mime\"");
    }
}
