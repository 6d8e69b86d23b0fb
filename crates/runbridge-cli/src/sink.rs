//! Platform output and environment sinks.
//!
//! The hosting runner collects step outputs and exported environment
//! variables from append-only files named by `GITHUB_OUTPUT` and
//! `GITHUB_ENV`. Records use the `name=value` form, or the heredoc form
//! (`name<<DELIM`) when the value spans lines. When a sink file is not
//! configured the record is logged instead, which keeps local runs usable.
//!
//! Duplicate names are appended as-is; the runner takes the last
//! occurrence, which is what gives later extract mappings precedence.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Appends output/env records to the runner's sink files.
pub struct OutputSink {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl OutputSink {
    pub fn new(output_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            env_file,
        }
    }

    /// Emit a step output.
    pub fn write_output(&self, name: &str, value: &str) -> Result<()> {
        append(self.output_file.as_deref(), "output", name, value)
    }

    /// Export an environment variable for later steps.
    pub fn export_env(&self, name: &str, value: &str) -> Result<()> {
        append(self.env_file.as_deref(), "env", name, value)
    }
}

fn append(file: Option<&Path>, kind: &str, name: &str, value: &str) -> Result<()> {
    let Some(path) = file else {
        info!(kind = kind, name = %name, value = %value, "sink not configured; logging only");
        return Ok(());
    };
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} sink: {:?}", kind, path))?;
    writeln!(handle, "{}", format_record(name, value))
        .with_context(|| format!("Failed to write to {} sink: {:?}", kind, path))?;
    Ok(())
}

/// Format one record, switching to the heredoc form when the value spans
/// lines. The delimiter is grown until it cannot collide with the value.
fn format_record(name: &str, value: &str) -> String {
    if value.contains('\n') {
        let mut delimiter = "RUNBRIDGE_EOF".to_string();
        while value.contains(&delimiter) {
            delimiter.push('_');
        }
        format!("{name}<<{delimiter}\n{value}\n{delimiter}")
    } else {
        format!("{name}={value}")
    }
}
