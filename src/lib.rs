//! Compress PDF files by handing them to Ghostscript's `pdfwrite` device at one
//! of three quality levels, from the command line or through a small web page.

pub mod error;
pub mod ghostscript;
pub mod inspect;
pub mod job;
pub mod level;
pub mod server;
pub mod workspace;

pub use error::{CompressError, Result};
pub use ghostscript::{Compress, Ghostscript, GhostscriptConfig};
pub use inspect::{format_size, inspect, reduction_percent, PdfSummary};
pub use job::{run_batch, BatchSummary, FileJob, JobReport, JobStatus};
pub use level::{CompressionLevel, Preset};
pub use workspace::{download_name, unique_output, Workspace};
