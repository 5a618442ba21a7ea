use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use pdf_compressor_gs::server::{self, ServerConfig};
use pdf_compressor_gs::{
    download_name, format_size, inspect, reduction_percent, run_batch, unique_output,
    CompressionLevel, FileJob, Ghostscript, GhostscriptConfig, JobStatus,
};

/// Compress PDFs with Ghostscript at low, medium or high quality
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Ghostscript executable
    #[arg(long, global = true, env = "PDF_COMPRESSOR_GS", default_value = "gs")]
    gs: PathBuf,

    /// PDF compatibility level of the output
    #[arg(long, global = true, default_value = "1.4")]
    compatibility: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress one PDF file
    Compress {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file
        output: PathBuf,

        /// low, medium or high
        #[arg(long, default_value_t = CompressionLevel::Medium)]
        level: CompressionLevel,
    },

    /// Compress several PDF files, continuing past failures
    Batch {
        /// Input PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for the compressed_<name>.pdf outputs
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// low, medium or high
        #[arg(long, default_value_t = CompressionLevel::Medium)]
        level: CompressionLevel,
    },

    /// Print version, page count and size of a PDF
    Inspect {
        file: PathBuf,
    },

    /// Run the upload web page
    Serve {
        #[arg(long, env = "PDF_COMPRESSOR_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Largest accepted upload request, in bytes
        #[arg(long, default_value_t = 200 * 1024 * 1024)]
        max_upload_bytes: usize,

        /// Finished batches kept available for download
        #[arg(long, default_value_t = 16)]
        retained_batches: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let gs = Ghostscript::new(GhostscriptConfig {
        binary: args.gs,
        compatibility_level: args.compatibility,
    });

    match args.command {
        Command::Compress {
            input,
            output,
            level,
        } => compress_one(&gs, input, output, level),
        Command::Batch {
            files,
            out_dir,
            level,
        } => compress_many(&gs, files, &out_dir, level),
        Command::Inspect { file } => {
            let summary = inspect(&file).with_context(|| format!("Failed to load {:?}", file))?;
            println!("File:      {:?}", file);
            println!("Version:   {}", summary.version);
            println!("Pages:     {}", summary.pages);
            println!("Encrypted: {}", summary.encrypted);
            println!("Size:      {}", format_size(summary.bytes));
            Ok(())
        }
        Command::Serve {
            bind,
            max_upload_bytes,
            retained_batches,
        } => {
            let config = ServerConfig {
                bind,
                max_upload_bytes,
                retained_batches,
            };
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime
                .block_on(server::serve(config, Arc::new(gs)))
                .context("Server failed")
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn compress_one(
    gs: &Ghostscript,
    input: PathBuf,
    output: PathBuf,
    level: CompressionLevel,
) -> Result<()> {
    println!("Compressing {:?} with {} level", input, level);
    let start = Instant::now();
    let mut job = FileJob::new(display_name(&input), input, output, level);

    job.run(gs);
    match &job.status {
        JobStatus::Succeeded(report) => {
            println!("Compressed in {:.2?}", start.elapsed());
            println!("Original size: {}", format_size(report.original_bytes));
            println!(
                "New size:      {} ({:.1}% smaller, {} pages)",
                format_size(report.compressed_bytes),
                reduction_percent(report.original_bytes, report.compressed_bytes),
                report.pages
            );
            Ok(())
        }
        _ => Err(anyhow!(
            "Failed to compress {}: {}",
            job.name,
            job.error().unwrap_or("not run")
        )),
    }
}

fn compress_many(
    gs: &Ghostscript,
    files: Vec<PathBuf>,
    out_dir: &Path,
    level: CompressionLevel,
) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let mut taken = HashSet::new();
    let mut jobs: Vec<FileJob> = files
        .into_iter()
        .map(|input| {
            let name = display_name(&input);
            let output = unique_output(out_dir, &download_name(&name), &mut taken);
            FileJob::new(name, input, output, level)
        })
        .collect();

    let start = Instant::now();
    let summary = run_batch(gs, &mut jobs);

    for job in &jobs {
        match &job.status {
            JobStatus::Succeeded(report) => println!(
                "OK    {} -> {:?}: {} -> {}",
                job.name,
                job.output,
                format_size(report.original_bytes),
                format_size(report.compressed_bytes)
            ),
            JobStatus::Failed(msg) => println!("FAIL  {}: {}", job.name, msg),
            JobStatus::Pending => {}
        }
    }
    println!(
        "Compressed {} of {} file(s) in {:.2?}",
        summary.succeeded,
        jobs.len(),
        start.elapsed()
    );

    if !summary.all_succeeded() {
        bail!(
            "Failed to compress the following files: {}",
            summary.failed.join(", ")
        );
    }
    Ok(())
}
