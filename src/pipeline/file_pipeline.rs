//! The pipeline driver implementation.

use crate::core::{BoxedModule, ModuleError, ModuleResult, ModuleStatus, PipelineFile, PipelineModule};
use crate::pipeline::report::{ModuleRunEntry, PipelineReport};

use chrono::Utc;
use std::time::Instant;

/// Configuration for the pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Whether a failing module ends the run for that file.
    pub stop_on_failure: bool,
}

impl PipelineConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables stopping at the first failing module.
    pub fn with_stop_on_failure(mut self, enabled: bool) -> Self {
        self.stop_on_failure = enabled;
        self
    }
}

/// Builder for creating a `FilePipeline`.
#[derive(Debug, Default)]
pub struct FilePipelineBuilder {
    modules: Vec<BoxedModule>,
    arguments: Vec<String>,
    config: PipelineConfig,
}

impl FilePipelineBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module that is initialized with an empty argument string.
    pub fn add_module<M: PipelineModule + 'static>(self, module: M) -> Self {
        self.add_module_with_args(module, "")
    }

    /// Adds a module along with the argument string passed to its
    /// `initialize`.
    pub fn add_module_with_args<M: PipelineModule + 'static>(
        mut self,
        module: M,
        arguments: impl Into<String>,
    ) -> Self {
        self.modules.push(Box::new(module));
        self.arguments.push(arguments.into());
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> ModuleResult<FilePipeline> {
        if self.modules.is_empty() {
            return Err(ModuleError::configuration("At least one module is required"));
        }

        Ok(FilePipeline {
            modules: self.modules,
            arguments: self.arguments,
            config: self.config,
        })
    }
}

/// Runs an ordered list of modules over files.
pub struct FilePipeline {
    /// Registered modules, in run order.
    modules: Vec<BoxedModule>,
    /// Argument string for each module's `initialize`.
    arguments: Vec<String>,
    /// Configuration.
    config: PipelineConfig,
}

impl FilePipeline {
    /// Creates a new builder.
    pub fn builder() -> FilePipelineBuilder {
        FilePipelineBuilder::new()
    }

    /// Initializes every module in order.
    ///
    /// Stops at the first module that fails and returns a configuration
    /// error naming it.
    pub async fn initialize(&mut self) -> ModuleResult<()> {
        for (module, arguments) in self.modules.iter_mut().zip(&self.arguments) {
            let status = module.initialize(arguments).await;

            tracing::info!(
                module = module.name(),
                version = module.version(),
                status = %status,
                "Module initialized"
            );

            if status.is_failure() {
                return Err(ModuleError::configuration(format!(
                    "module {} failed to initialize",
                    module.name()
                )));
            }
        }
        Ok(())
    }

    /// Runs every module on `file` and reports what each returned.
    ///
    /// A module returning `Stop` ends the run for this file. A failing
    /// module is recorded and, unless `stop_on_failure` is set, the
    /// remaining modules still run.
    pub async fn run(&self, file: &dyn PipelineFile) -> PipelineReport {
        let started_at = Utc::now();
        let mut entries = Vec::with_capacity(self.modules.len());

        tracing::debug!(
            file_id = %file.id(),
            file_name = ?file.name(),
            size = file.size(),
            "Running pipeline"
        );

        for module in &self.modules {
            let start = Instant::now();
            let status = module.run(file).await;
            entries.push(ModuleRunEntry::new(module.name(), status, start.elapsed()));

            match status {
                ModuleStatus::Ok => {}
                ModuleStatus::Stop => {
                    tracing::debug!(
                        file_id = %file.id(),
                        module = module.name(),
                        "Module stopped the pipeline"
                    );
                    break;
                }
                ModuleStatus::Fail => {
                    tracing::warn!(
                        file_id = %file.id(),
                        module = module.name(),
                        "Module failed, {}",
                        if self.config.stop_on_failure {
                            "stopping"
                        } else {
                            "continuing with others"
                        }
                    );
                    if self.config.stop_on_failure {
                        break;
                    }
                }
            }
        }

        let report = PipelineReport::new(file.id(), entries, started_at);
        crate::audit::emit_pipeline_report(&report);
        report
    }

    /// Finalizes every module and returns the worst status.
    pub async fn finalize(&mut self) -> ModuleStatus {
        let mut worst = ModuleStatus::Ok;
        for module in &mut self.modules {
            let status = module.finalize().await;
            if status.is_failure() {
                tracing::warn!(module = module.name(), "Module failed to finalize");
            }
            worst = worst.max(status);
        }
        worst
    }

    /// Returns the number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Returns the registered modules.
    pub fn modules(&self) -> &[BoxedModule] {
        &self.modules
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl std::fmt::Debug for FilePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePipeline")
            .field("module_count", &self.modules.len())
            .field("config", &self.config)
            .finish()
    }
}
