use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{CompressError, Result};
use crate::ghostscript::Compress;
use crate::inspect::inspect;
use crate::level::CompressionLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded(JobReport),
    Failed(String),
}

/// One uploaded (or named) file moving through compression.
#[derive(Debug, Clone)]
pub struct FileJob {
    /// Name shown to the user; never used to build paths.
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub level: CompressionLevel,
    pub status: JobStatus,
}

impl FileJob {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        level: CompressionLevel,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            level,
            status: JobStatus::Pending,
        }
    }

    /// Runs the job once. Errors are recorded in `status`, never returned.
    pub fn run<C: Compress + ?Sized>(&mut self, compressor: &C) -> &JobStatus {
        self.status = match self.try_run(compressor) {
            Ok(report) => {
                info!(
                    "{}: {} -> {} bytes, {} page(s)",
                    self.name, report.original_bytes, report.compressed_bytes, report.pages
                );
                JobStatus::Succeeded(report)
            }
            Err(e) => {
                warn!("Failed to compress {}: {}", self.name, e);
                JobStatus::Failed(e.to_string())
            }
        };
        &self.status
    }

    fn try_run<C: Compress + ?Sized>(&self, compressor: &C) -> Result<JobReport> {
        if !has_pdf_extension(&self.name) {
            return Err(CompressError::InvalidArgument(format!(
                "{} is not a .pdf file",
                self.name
            )));
        }

        compressor.compress(&self.input, &self.output, self.level)?;

        let original_bytes = fs::metadata(&self.input)?.len();
        let summary = match inspect(&self.output) {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&self.output) {
                    warn!("Failed to remove unreadable output {:?}: {}", self.output, rm);
                }
                return Err(e);
            }
        };
        Ok(JobReport {
            original_bytes,
            compressed_bytes: summary.bytes,
            pages: summary.pages,
        })
    }

    pub fn report(&self) -> Option<&JobReport> {
        match &self.status {
            JobStatus::Succeeded(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

pub fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs every job in order. A failing job does not stop the ones after it.
pub fn run_batch<C: Compress + ?Sized>(compressor: &C, jobs: &mut [FileJob]) -> BatchSummary {
    let total = jobs.len();
    let mut summary = BatchSummary::default();
    for (i, job) in jobs.iter_mut().enumerate() {
        info!("[{}/{}] {} ({} level)", i + 1, total, job.name, job.level);
        match job.run(compressor) {
            JobStatus::Succeeded(_) => summary.succeeded += 1,
            _ => summary.failed.push(job.name.clone()),
        }
    }
    if !summary.failed.is_empty() {
        warn!(
            "Failed to compress the following files: {}",
            summary.failed.join(", ")
        );
    }
    summary
}
