//! The file-type signature module.

use crate::audit::{self, IdentificationAuditEvent};
use crate::backends::LibmagicMatcher;
use crate::core::{
    clean_label, ArcMatcher, AttributeType, BlackboardAttribute, ModuleError, ModuleInfo,
    ModuleResult, ModuleStatus, PipelineFile, PipelineModule,
};
use crate::module::config::{LabelFormat, ModuleConfig, SystemProperties};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Name under which the module registers and posts attributes.
pub const MODULE_NAME: &str = "FileTypeSigModule";

/// One-line description reported to the host.
pub const MODULE_DESCRIPTION: &str = "Determines file type based on signature";

/// Module version reported to the host.
pub const MODULE_VERSION: &str = "1.0.0";

/// Argument prefix that overrides the database location.
const DATABASE_ARGUMENT: &str = "database=";

/// Identifies each file's type from its leading bytes and posts the result
/// as a `TSK_FILE_TYPE_SIG` attribute.
///
/// # Examples
///
/// ```rust,no_run
/// use sigbridge::core::PipelineModule;
/// use sigbridge::module::{FileTypeSigModule, ModuleConfig};
///
/// # async fn example() {
/// let config = ModuleConfig::new().with_module_dir("/opt/pipeline/modules");
/// let mut module = FileTypeSigModule::new(config);
/// assert!(module.initialize("").await.is_ok());
/// # }
/// ```
#[derive(Debug)]
pub struct FileTypeSigModule {
    info: ModuleInfo,
    config: ModuleConfig,
    /// Matcher supplied by the embedder instead of a database file.
    preset: Option<ArcMatcher>,
    /// Set by a successful `initialize`, cleared by `finalize`.
    matcher: Option<ArcMatcher>,
}

impl FileTypeSigModule {
    /// Creates an uninitialized module.
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            info: ModuleInfo::new(MODULE_NAME, MODULE_DESCRIPTION, MODULE_VERSION),
            config,
            preset: None,
            matcher: None,
        }
    }

    /// Creates an uninitialized module configured from host properties.
    pub fn from_properties(props: &SystemProperties) -> Self {
        Self::new(ModuleConfig::from_properties(props))
    }

    /// Creates a module that is already initialized with `matcher`.
    ///
    /// Later calls to `initialize` keep using this matcher unless the
    /// arguments name a database file.
    pub fn with_matcher(matcher: ArcMatcher) -> Self {
        Self {
            preset: Some(Arc::clone(&matcher)),
            matcher: Some(matcher),
            ..Self::new(ModuleConfig::default())
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Returns `true` between a successful `initialize` and `finalize`.
    pub fn is_initialized(&self) -> bool {
        self.matcher.is_some()
    }

    async fn load_matcher(&self, arguments: &str) -> ModuleResult<ArcMatcher> {
        let override_path = database_argument(arguments);

        if override_path.is_none() {
            if let Some(preset) = &self.preset {
                return Ok(Arc::clone(preset));
            }
        }

        let path = match override_path {
            Some(path) => path,
            None => self
                .config
                .database_path()
                .ok_or_else(|| ModuleError::configuration("module directory is not set"))?,
        };

        let matcher = LibmagicMatcher::open(&path).await?;
        info!(path = %path.display(), "Loaded signature database");

        Ok(Arc::new(matcher))
    }

    async fn identify_file(&self, file: &dyn PipelineFile) -> ModuleResult<()> {
        let matcher = self.matcher.as_ref().ok_or(ModuleError::NotInitialized)?;

        if file.size() == 0 {
            debug!(file_id = %file.id(), "Skipping empty file");
            return Ok(());
        }

        let mut buffer = vec![0u8; self.config.buffer_size];
        let read = file.read(0, &mut buffer).await?;
        if read == 0 {
            return Err(ModuleError::EmptyRead { file_id: file.id() });
        }
        buffer.truncate(read);

        let identification = matcher.identify(&buffer)?;
        let raw = match (self.config.label_format, &identification.mime) {
            (LabelFormat::Mime, Some(mime)) => mime.as_str(),
            _ => identification.description.as_str(),
        };
        let label = clean_label(raw, self.config.max_label_len);

        debug!(
            file_id = %file.id(),
            file_name = ?file.name(),
            label = %label,
            bytes = read,
            "Identified file type"
        );

        let attribute =
            BlackboardAttribute::new(AttributeType::FileTypeSig, self.name(), label.as_str());
        file.add_general_info_attribute(attribute).await?;

        audit::emit_file_type_identified(&IdentificationAuditEvent::new(
            self.name(),
            file.id(),
            label,
            &identification,
            read,
        ));

        Ok(())
    }
}

impl Default for FileTypeSigModule {
    fn default() -> Self {
        Self::new(ModuleConfig::default())
    }
}

/// Extracts the database path from a `database=<path>` argument string.
fn database_argument(arguments: &str) -> Option<PathBuf> {
    arguments
        .split(';')
        .map(str::trim)
        .find_map(|arg| arg.strip_prefix(DATABASE_ARGUMENT))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

#[async_trait]
impl PipelineModule for FileTypeSigModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    async fn initialize(&mut self, arguments: &str) -> ModuleStatus {
        debug!(arguments = %arguments, "Initializing {}", MODULE_NAME);
        if !arguments.trim().is_empty() && database_argument(arguments).is_none() {
            warn!(arguments = %arguments, "{}: ignoring unrecognized arguments", MODULE_NAME);
        }

        self.matcher = None;
        let loaded = match self.config.validate() {
            Ok(()) => self.load_matcher(arguments).await,
            Err(e) => Err(e),
        };
        match loaded {
            Ok(matcher) => {
                let version = matcher.database_version();
                audit::emit_module_initialized(self.name(), self.version(), version.as_deref());
                self.matcher = Some(matcher);
                ModuleStatus::Ok
            }
            Err(e) => {
                error!("{}: {}", MODULE_NAME, e);
                ModuleStatus::Fail
            }
        }
    }

    async fn run(&self, file: &dyn PipelineFile) -> ModuleStatus {
        match self.identify_file(file).await {
            Ok(()) => ModuleStatus::Ok,
            Err(e) => {
                error!(file_id = %file.id(), "{}: {}", MODULE_NAME, e);
                audit::emit_module_run_failed(self.name(), file.id(), &e);
                ModuleStatus::Fail
            }
        }
    }

    async fn finalize(&mut self) -> ModuleStatus {
        if self.matcher.take().is_some() {
            info!("{} finalized", MODULE_NAME);
        }
        ModuleStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockMatcher;
    use crate::blackboard::{Blackboard, MemoryBlackboard};
    use crate::core::{
        BlackboardArtifact, BlackboardError, FileError, FileId, Identification, MemoryFile,
    };
    use tempfile::TempDir;

    /// A file whose reads or blackboard writes can be made to fail.
    #[derive(Debug)]
    struct FaultyFile {
        size: u64,
        read_error: bool,
        blackboard_error: bool,
    }

    #[async_trait]
    impl PipelineFile for FaultyFile {
        fn id(&self) -> FileId {
            FileId(99)
        }

        fn size(&self) -> u64 {
            self.size
        }

        async fn read(&self, _offset: u64, buf: &mut [u8]) -> Result<usize, FileError> {
            if self.read_error {
                return Err(FileError::ReadFailed {
                    file_id: FileId(99),
                    reason: "bad sector".to_string(),
                });
            }
            let n = buf.len().min(self.size as usize);
            buf[..n].fill(b'A');
            Ok(n)
        }

        async fn add_general_info_attribute(
            &self,
            _attribute: BlackboardAttribute,
        ) -> Result<(), BlackboardError> {
            if self.blackboard_error {
                return Err(BlackboardError::store_failed("case database locked"));
            }
            Ok(())
        }
    }

    /// A file that reports content but never yields any bytes.
    #[derive(Debug)]
    struct TruncatedFile;

    #[async_trait]
    impl PipelineFile for TruncatedFile {
        fn id(&self) -> FileId {
            FileId(5)
        }

        fn size(&self) -> u64 {
            10
        }

        async fn read(&self, _offset: u64, _buf: &mut [u8]) -> Result<usize, FileError> {
            Ok(0)
        }

        async fn add_general_info_attribute(
            &self,
            _attribute: BlackboardAttribute,
        ) -> Result<(), BlackboardError> {
            Ok(())
        }
    }

    fn mock_module(label: &str) -> (FileTypeSigModule, Arc<MockMatcher>) {
        let matcher = Arc::new(MockMatcher::new(label));
        let module = FileTypeSigModule::with_matcher(matcher.clone());
        (module, matcher)
    }

    async fn labels(blackboard: &MemoryBlackboard, file_id: FileId) -> Vec<String> {
        blackboard
            .attributes(file_id, AttributeType::FileTypeSig)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|a| a.value.as_text().map(str::to_string))
            .collect()
    }

    /// Writes a magic(5) source database as `<module_dir>/FileTypeSigModule/magic`.
    fn write_database(temp: &TempDir, contents: &str) -> ModuleConfig {
        let dir = temp.path().join(crate::module::MODULE_DATA_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("magic"), contents).unwrap();
        ModuleConfig::new()
            .with_module_dir(temp.path())
            .with_database_file("magic")
    }

    /// Copies the system's compiled database to
    /// `<module_dir>/FileTypeSigModule/magic.mgc`, if one is installed.
    fn install_system_database(temp: &TempDir) -> Option<PathBuf> {
        let source = [
            "/usr/share/misc/magic.mgc",
            "/usr/share/file/magic.mgc",
            "/usr/lib/file/magic.mgc",
        ]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())?;

        let dir = temp.path().join(crate::module::MODULE_DATA_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("magic.mgc");
        std::fs::copy(&source, &target).unwrap();
        Some(target)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        png.extend_from_slice(&width.to_be_bytes());
        png.extend_from_slice(&height.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0]);
        png
    }

    #[test]
    fn test_module_identification() {
        let module = FileTypeSigModule::default();
        assert_eq!(module.name(), "FileTypeSigModule");
        assert_eq!(module.description(), "Determines file type based on signature");
        assert_eq!(module.version(), "1.0.0");
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn test_empty_file_is_ok_without_matching() {
        let (module, matcher) = mock_module("PNG image data");
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), Vec::new(), blackboard.clone());

        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(matcher.call_count(), 0);
        assert!(blackboard.artifacts(FileId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_posts_single_attribute() {
        let (module, matcher) = mock_module("PNG image data");
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(2), b"\x89PNG....".to_vec(), blackboard.clone());

        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(matcher.call_count(), 1);

        let artifacts: Vec<BlackboardArtifact> = blackboard.artifacts(FileId(2)).await.unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].attributes.len(), 1);

        let attribute = &artifacts[0].attributes[0];
        assert_eq!(attribute.attribute_type, AttributeType::FileTypeSig);
        assert_eq!(attribute.module_name, "FileTypeSigModule");
        assert_eq!(attribute.context, "");
        assert_eq!(attribute.value.as_text(), Some("PNG image data"));
    }

    #[tokio::test]
    async fn test_only_leading_bytes_are_matched() {
        let (module, matcher) = mock_module("data");
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(3), vec![7u8; 4096], blackboard);

        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(matcher.last_buffer().unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn test_short_file_passes_only_its_content() {
        let (module, matcher) = mock_module("data");
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(3), b"abc".to_vec(), blackboard);

        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(matcher.last_buffer().unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_label_is_sanitized() {
        let matcher = MockMatcher::new("ELF 64-bit LSB executable")
            .with_response(b"NUL", Identification::new("abc\0def"));
        let module = FileTypeSigModule::with_matcher(Arc::new(matcher))
            .with_config(ModuleConfig::new().with_max_label_len(8));
        let blackboard = Arc::new(MemoryBlackboard::new());

        let file = MemoryFile::new(FileId(4), b"\x7fELF".to_vec(), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        let file = MemoryFile::new(FileId(5), b"NUL".to_vec(), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);

        assert_eq!(labels(&blackboard, FileId(4)).await, vec!["ELF 64-b"]);
        assert_eq!(labels(&blackboard, FileId(5)).await, vec!["abc"]);
    }

    #[tokio::test]
    async fn test_truncation_inside_multibyte_char() {
        let matcher = Arc::new(MockMatcher::new("caf\u{e9}"));
        let module = FileTypeSigModule::with_matcher(matcher)
            .with_config(ModuleConfig::new().with_max_label_len(4));
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(6), b"x".to_vec(), blackboard.clone());

        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(labels(&blackboard, FileId(6)).await, vec!["caf^"]);
    }

    #[tokio::test]
    async fn test_mime_label_format() {
        let matcher = Arc::new(
            MockMatcher::new("data")
                .with_response(b"%PDF", Identification::new("PDF document").with_mime("application/pdf")),
        );
        let module = FileTypeSigModule::with_matcher(matcher)
            .with_config(ModuleConfig::new().with_label_format(LabelFormat::Mime));
        let blackboard = Arc::new(MemoryBlackboard::new());

        let pdf = MemoryFile::new(FileId(1), b"%PDF-1.7".to_vec(), blackboard.clone());
        let other = MemoryFile::new(FileId(2), b"zzz".to_vec(), blackboard.clone());
        module.run(&pdf).await;
        module.run(&other).await;

        assert_eq!(labels(&blackboard, FileId(1)).await, vec!["application/pdf"]);
        assert_eq!(labels(&blackboard, FileId(2)).await, vec!["data"]);
    }

    #[tokio::test]
    async fn test_matcher_error_fails() {
        let module = FileTypeSigModule::with_matcher(Arc::new(MockMatcher::failing("corrupt")));
        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(8), b"content".to_vec(), blackboard.clone());

        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
        assert!(blackboard.artifacts(FileId(8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_error_fails() {
        let (module, matcher) = mock_module("data");
        let file = FaultyFile {
            size: 100,
            read_error: true,
            blackboard_error: false,
        };

        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
        assert_eq!(matcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_byte_read_fails() {
        let (module, matcher) = mock_module("data");
        assert_eq!(module.run(&TruncatedFile).await, ModuleStatus::Fail);
        assert_eq!(matcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blackboard_error_fails() {
        let (module, matcher) = mock_module("data");
        let file = FaultyFile {
            size: 100,
            read_error: false,
            blackboard_error: true,
        };

        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
        assert_eq!(matcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_module_dir_fails_initialize() {
        let mut module = FileTypeSigModule::default();
        assert_eq!(module.initialize("").await, ModuleStatus::Fail);
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn test_missing_database_is_permanent_failure() {
        let temp = TempDir::new().unwrap();
        let mut module = FileTypeSigModule::new(ModuleConfig::new().with_module_dir(temp.path()));

        assert_eq!(module.initialize("").await, ModuleStatus::Fail);

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), b"data".to_vec(), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
        assert!(blackboard.artifacts(FileId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_database_fails_initialize() {
        let temp = TempDir::new().unwrap();
        let config = write_database(&temp, "0 notatype 1 broken\n");
        let mut module = FileTypeSigModule::new(config);

        assert_eq!(module.initialize("").await, ModuleStatus::Fail);
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn test_corrupt_compiled_database_fails_initialize() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(crate::module::MODULE_DATA_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("magic.mgc"), vec![0xde; 64]).unwrap();

        let mut module = FileTypeSigModule::new(ModuleConfig::new().with_module_dir(temp.path()));
        assert_eq!(module.initialize("").await, ModuleStatus::Fail);
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn test_zero_buffer_size_fails_initialize() {
        let temp = TempDir::new().unwrap();
        let mut config = write_database(&temp, "0\tstring\t\\xca\\xfe\tcustom\n");
        config.buffer_size = 0;

        let mut module = FileTypeSigModule::new(config);
        assert_eq!(module.initialize("").await, ModuleStatus::Fail);
        assert!(!module.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_with_compiled_database() {
        let temp = TempDir::new().unwrap();
        if install_system_database(&temp).is_none() {
            return;
        }

        let mut module = FileTypeSigModule::new(ModuleConfig::new().with_module_dir(temp.path()));
        assert_eq!(module.initialize("").await, ModuleStatus::Ok);

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), png(16, 32), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);

        let posted = labels(&blackboard, FileId(1)).await;
        assert_eq!(posted.len(), 1);
        assert!(posted[0].starts_with("PNG image data, 16 x 32"), "{}", posted[0]);
    }

    #[tokio::test]
    async fn test_database_argument_with_compiled_database() {
        let temp = TempDir::new().unwrap();
        let Some(path) = install_system_database(&temp) else {
            return;
        };

        let mut module = FileTypeSigModule::default()
            .with_config(ModuleConfig::new().with_label_format(LabelFormat::Mime));
        let arguments = format!("database={}", path.display());
        assert_eq!(module.initialize(&arguments).await, ModuleStatus::Ok);

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(2), png(1, 1), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(labels(&blackboard, FileId(2)).await, vec!["image/png"]);
    }

    #[tokio::test]
    async fn test_initialize_and_identify_from_database() {
        let temp = TempDir::new().unwrap();
        let config = write_database(
            &temp,
            "0 string \\x89PNG\\r\\n\\x1a\\n PNG image data\n>16 belong x \\b, %d x\n>20 belong x %d\n",
        );
        let mut module = FileTypeSigModule::new(config);
        assert_eq!(module.initialize("").await, ModuleStatus::Ok);
        assert!(module.is_initialized());

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(10), png(100, 50), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(
            labels(&blackboard, FileId(10)).await,
            vec!["PNG image data, 100 x 50"]
        );

        let text = MemoryFile::new(FileId(11), b"hello\n".to_vec(), blackboard.clone());
        assert_eq!(module.run(&text).await, ModuleStatus::Ok);
        assert_eq!(labels(&blackboard, FileId(11)).await, vec!["ASCII text"]);
    }

    #[tokio::test]
    async fn test_database_argument_overrides_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.magic");
        std::fs::write(&path, "0\tstring\t\\xca\\xfe\\xba\\xbe\tcustom format\n").unwrap();

        let mut module = FileTypeSigModule::default();
        let arguments = format!("database={}", path.display());
        assert_eq!(module.initialize(&arguments).await, ModuleStatus::Ok);

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), b"\xca\xfe\xba\xbe\x00\x01".to_vec(), blackboard.clone());
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(labels(&blackboard, FileId(1)).await, vec!["custom format"]);
    }

    #[tokio::test]
    async fn test_preset_matcher_survives_initialize() {
        let (mut module, matcher) = mock_module("preset");
        assert_eq!(module.initialize("").await, ModuleStatus::Ok);

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), b"x".to_vec(), blackboard);
        assert_eq!(module.run(&file).await, ModuleStatus::Ok);
        assert_eq!(matcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_finalize_releases_matcher() {
        let (mut module, _) = mock_module("data");
        assert_eq!(module.finalize().await, ModuleStatus::Ok);
        assert!(!module.is_initialized());

        let blackboard = Arc::new(MemoryBlackboard::new());
        let file = MemoryFile::new(FileId(1), b"x".to_vec(), blackboard);
        assert_eq!(module.run(&file).await, ModuleStatus::Fail);
    }

    #[test]
    fn test_database_argument_parsing() {
        assert_eq!(database_argument(""), None);
        assert_eq!(database_argument("verbose"), None);
        assert_eq!(database_argument("database="), None);
        assert_eq!(
            database_argument("database=/tmp/magic"),
            Some(PathBuf::from("/tmp/magic"))
        );
        assert_eq!(
            database_argument("verbose; database = ignored"),
            None
        );
        assert_eq!(
            database_argument("verbose; database=/a/b"),
            Some(PathBuf::from("/a/b"))
        );
    }
}
