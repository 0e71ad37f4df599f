//! Identify files example running the file-type module over paths.
//!
//! This example shows how to:
//! - Configure the module from host properties
//! - Build and initialize a FilePipeline
//! - Run it over files on disk and read back the posted labels
//!
//! Run with: cargo run --example identify_files -- <path>...
//!
//! When `SIGBRIDGE_MODULE_DIR` is set, libmagic loads
//! `$SIGBRIDGE_MODULE_DIR/FileTypeSigModule/magic.mgc`; otherwise the
//! bundled signatures are used. When `SIGBRIDGE_OUT_DIR` is set, attributes
//! are written there as JSON instead of kept in memory.

use sigbridge::blackboard::{FilesystemBlackboard, MemoryBlackboard};
use sigbridge::module::SystemProperty;
use sigbridge::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sigbridge::audit=warn".into()),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: identify_files <path>...");
        std::process::exit(2);
    }

    // Host properties, with a fallback to the bundled signatures
    let props = SystemProperties::from_env();
    let module = match props.get(SystemProperty::ModuleDir) {
        Some(_) => FileTypeSigModule::from_properties(&props),
        None => FileTypeSigModule::with_matcher(Arc::new(MagicMatcher::builtin()?)),
    };

    let blackboard: Arc<dyn Blackboard> = match props.get(SystemProperty::OutputDir) {
        Some(dir) => Arc::new(FilesystemBlackboard::new(dir)?),
        None => Arc::new(MemoryBlackboard::new()),
    };

    let mut pipeline = FilePipeline::builder()
        .add_module(module)
        .build()?;
    pipeline.initialize().await?;

    println!("=== Sigbridge File Identification ===\n");

    for (index, path) in paths.iter().enumerate() {
        let file_id = FileId(index as u64 + 1);

        let file = match DiskFile::open(file_id, path, blackboard.clone()).await {
            Ok(file) => file,
            Err(e) => {
                println!("{}: cannot open ({})", path, e);
                continue;
            }
        };

        let report = pipeline.run(&file).await;
        if !report.is_ok() {
            println!("{}: failed ({:?})", path, report.failed_modules());
            continue;
        }

        let labels = blackboard
            .attributes(file_id, AttributeType::FileTypeSig)
            .await?;
        match labels.last().and_then(|a| a.value.as_text()) {
            Some(label) => println!("{}: {}", path, label),
            None => println!("{}: empty", path),
        }
    }

    pipeline.finalize().await;
    Ok(())
}
