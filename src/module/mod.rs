//! The file-type signature pipeline module and its configuration.
//!
//! [`FileTypeSigModule`] reads the first bytes of each file, asks a
//! signature matcher what kind of content it is, and posts the answer to
//! the blackboard as a `TSK_FILE_TYPE_SIG` attribute.

mod config;
mod filetype;

pub use config::{
    LabelFormat, ModuleConfig, SystemProperties, SystemProperty, DEFAULT_BUFFER_SIZE,
    DEFAULT_DATABASE_FILE, DEFAULT_MAX_LABEL_LEN, MODULE_DATA_DIR,
};
pub use filetype::{FileTypeSigModule, MODULE_DESCRIPTION, MODULE_NAME, MODULE_VERSION};
