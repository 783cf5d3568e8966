//! Command-line handlers. Each one wires the library to the terminal and
//! returns `anyhow::Result` to the binary.

pub mod analyze;
pub mod hunt;
pub mod init;
pub mod learn;
pub mod repair;

pub use analyze::{handle_analyze, handle_smells, AnalyzeArgs};
pub use hunt::handle_hunt;
pub use init::init_config;
pub use learn::handle_learn;
pub use repair::{handle_repair, RepairArgs};

use crate::config::{load_config_from, load_config_from_path, EnforcerConfig};
use crate::report::output::{create_writer, OutputFormat};
use crate::report::Report;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Explicit config file, else the nearest `.enforcer.toml` above `start`.
pub fn resolve_config(explicit: Option<&Path>, start: &Path) -> EnforcerConfig {
    match explicit {
        Some(path) => load_config_from_path(path),
        None => {
            let dir = if start.is_file() {
                start.parent().unwrap_or(start)
            } else {
                start
            };
            load_config_from(dir)
        }
    }
}

/// Where config discovery starts: the first analysed path, or the current directory.
pub fn search_start(paths: &[PathBuf]) -> PathBuf {
    paths
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(crate) fn write_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            colored::control::set_override(false);
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            create_writer(format, BufWriter::new(file)).write_report(report)
        }
        None => create_writer(format, io::stdout().lock()).write_report(report),
    }
}
