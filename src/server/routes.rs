use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use crate::error::CompressError;
use crate::job::run_batch;
use crate::level::CompressionLevel;
use crate::server::page;
use crate::server::state::{AppState, FinishedBatch};
use crate::workspace::{download_name, Workspace};

/// Request-level failure, rendered as an HTML error page.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Keeps the status axum assigns, so an over-limit body becomes 413.
    fn multipart(what: &str, e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: format!("Failed to read {}: {}", what, e),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "No such download".to_string(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<CompressError> for AppError {
    fn from(e: CompressError) -> Self {
        match e {
            CompressError::InvalidArgument(_) => AppError::bad_request(e.to_string()),
            _ => AppError::internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Html(page::error(&self.message))).into_response()
    }
}

/// GET /
pub async fn index() -> Html<String> {
    Html(page::index())
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// POST /compress - one `level` field and any number of `files` fields
pub async fn compress(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut level: Option<CompressionLevel> = None;
    let mut uploads: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::multipart("upload", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "level" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::multipart("level", e))?;
                if level.is_some() {
                    return Err(AppError::bad_request("Select exactly one compression level"));
                }
                level = Some(text.parse()?);
            }
            "files" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::multipart(&filename, e))?;
                // browsers send an empty part when no file was picked
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                uploads.push((filename, data));
            }
            other => warn!("Ignoring unexpected form field {:?}", other),
        }
    }

    let level = level.ok_or_else(|| AppError::bad_request("Missing compression level"))?;
    if uploads.is_empty() {
        return Err(AppError::bad_request("No PDF files uploaded"));
    }

    info!(
        "Starting compression of {} file(s) at {} level",
        uploads.len(),
        level
    );
    let compressor = state.compressor();
    let store = state.clone();
    let batch = tokio::task::spawn_blocking(move || -> Result<Arc<FinishedBatch>, CompressError> {
        let mut workspace = Workspace::new()?;
        let mut jobs = Vec::with_capacity(uploads.len());
        for (name, data) in &uploads {
            jobs.push(workspace.stage(name, data, level)?);
        }
        let summary = run_batch(compressor.as_ref(), &mut jobs);
        // may evict older batches and delete their workspaces
        Ok(store.insert_batch(FinishedBatch::new(level, jobs, summary, workspace)))
    })
    .await
    .map_err(|e| {
        error!("Compression task panicked: {}", e);
        AppError::internal("Compression task failed")
    })??;

    info!(
        "Batch {}: {} succeeded, {} failed",
        batch.id,
        batch.summary.succeeded,
        batch.summary.failed.len()
    );
    Ok(Html(page::results(&batch)))
}

/// GET /download/:batch/:index
pub async fn download(
    State(state): State<AppState>,
    Path((batch_id, index)): Path<(String, usize)>,
) -> Result<Response, AppError> {
    let id = Uuid::parse_str(&batch_id).map_err(|_| AppError::not_found())?;
    let batch = state.batch(id).ok_or_else(AppError::not_found)?;
    let job = batch.jobs.get(index).ok_or_else(AppError::not_found)?;
    if job.report().is_none() {
        return Err(AppError::not_found());
    }

    let data = tokio::fs::read(&job.output).await.map_err(|e| {
        error!("Failed to read {:?}: {}", job.output, e);
        AppError::internal("Compressed file is no longer available")
    })?;

    let disposition = content_disposition(&download_name(&job.name));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback name plus the UTF-8 form.
pub(crate) fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    if fallback == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
