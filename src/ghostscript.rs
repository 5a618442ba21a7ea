//! Ghostscript invocation.
//!
//! The compression itself is done entirely by `gs` with the `pdfwrite` device; this
//! module only builds the command line, runs it to completion and turns its exit
//! status into a [`CompressError`].

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{CompressError, Result};
use crate::level::CompressionLevel;

/// Anything that can turn `input` into a compressed `output`.
pub trait Compress {
    fn compress(&self, input: &Path, output: &Path, level: CompressionLevel) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostscriptConfig {
    /// Executable to run, resolved through `PATH` when not absolute.
    pub binary: PathBuf,
    /// Value for `-dCompatibilityLevel`.
    pub compatibility_level: String,
}

impl Default for GhostscriptConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gs"),
            compatibility_level: "1.4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ghostscript {
    config: GhostscriptConfig,
}

impl Ghostscript {
    pub fn new(config: GhostscriptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GhostscriptConfig {
        &self.config
    }

    /// Full argument list, without the program name.
    pub fn args(&self, input: &Path, output: &Path, level: CompressionLevel) -> Vec<OsString> {
        let mut output_arg = OsString::from("-sOutputFile=");
        match output.to_str() {
            // gs expands %d in OutputFile to a page number
            Some(s) => output_arg.push(s.replace('%', "%%")),
            None => output_arg.push(output.as_os_str()),
        }

        let input = if input.as_os_str().to_string_lossy().starts_with('-') {
            Path::new(".").join(input)
        } else {
            input.to_path_buf()
        };

        vec![
            OsString::from("-sDEVICE=pdfwrite"),
            OsString::from(format!(
                "-dCompatibilityLevel={}",
                self.config.compatibility_level
            )),
            OsString::from(level.preset().pdf_settings_arg()),
            OsString::from("-dNOPAUSE"),
            OsString::from("-dQUIET"),
            OsString::from("-dBATCH"),
            output_arg,
            input.into_os_string(),
        ]
    }

    fn failure(&self, diagnostic: impl Into<String>) -> CompressError {
        CompressError::ToolExecution {
            tool: self.config.binary.display().to_string(),
            diagnostic: diagnostic.into(),
        }
    }
}

impl Compress for Ghostscript {
    fn compress(&self, input: &Path, output: &Path, level: CompressionLevel) -> Result<()> {
        if !input.is_file() {
            return Err(CompressError::missing_input(input));
        }
        if same_file(input, output) {
            return Err(CompressError::InvalidArgument(format!(
                "output would overwrite input: {}",
                output.display()
            )));
        }

        let args = self.args(input, output, level);
        debug!("Running {} {:?}", self.config.binary.display(), args);
        info!(
            "Compressing {:?} with {} level (/{})",
            input,
            level,
            level.preset()
        );
        let start = Instant::now();

        let result = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output();

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                remove_partial(output);
                return Err(self.failure(format!("could not start: {}", e)));
            }
        };

        if !out.status.success() {
            remove_partial(output);
            return Err(self.failure(diagnostic(&out)));
        }

        match fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => {
                info!("Wrote {:?} in {:.2?}", output, start.elapsed());
                Ok(())
            }
            _ => {
                remove_partial(output);
                Err(self.failure("exited successfully but wrote no output"))
            }
        }
    }
}

fn diagnostic(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&out.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    format!("exited with {}", out.status)
}

/// True when `output` names the file `input` already is, through `..`, symlinks
/// or any other spelling.
fn same_file(input: &Path, output: &Path) -> bool {
    let Ok(input) = input.canonicalize() else {
        return input == output;
    };
    if let Ok(output) = output.canonicalize() {
        return input == output;
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), output.file_name()) {
        (Ok(parent), Some(name)) => input == parent.join(name),
        _ => false,
    }
}

fn remove_partial(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output {:?}", output),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {:?}: {}", output, e),
    }
}
