//! HTML for the upload form and the results page.

use crate::inspect::{format_size, reduction_percent};
use crate::level::CompressionLevel;
use crate::server::state::FinishedBatch;
use crate::workspace::download_name;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
.ok{color:#1a7f37}.err{color:#cf222e}.warn{background:#fff8c5;padding:.5rem}\
li{margin:.3rem 0}";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>\n{}\n</body></html>\n",
        escape(title),
        STYLE,
        body
    )
}

pub fn index() -> String {
    let mut body = String::new();
    body.push_str("<h1>PDF Compressor with Levels</h1>\n");
    body.push_str(
        "<p>Upload PDF files to compress them with different levels of compression.</p>\n",
    );
    body.push_str(
        "<form method=\"post\" action=\"/compress\" enctype=\"multipart/form-data\">\n\
         <fieldset><legend>Select Compression Level</legend>\n",
    );
    for level in CompressionLevel::ALL {
        let checked = if level == CompressionLevel::default() {
            " checked"
        } else {
            ""
        };
        body.push_str(&format!(
            "<label><input type=\"radio\" name=\"level\" value=\"{0}\"{1}> {0} ({2})</label><br>\n",
            level,
            checked,
            level.description()
        ));
    }
    body.push_str(
        "</fieldset>\n<p><label>Upload PDF Files \
         <input type=\"file\" name=\"files\" accept=\".pdf,application/pdf\" multiple required>\
         </label></p>\n<button type=\"submit\">Compress PDFs</button>\n</form>\n",
    );
    layout("PDF Compressor", &body)
}

pub fn results(batch: &FinishedBatch) -> String {
    let mut body = String::new();
    body.push_str("<h1>PDF Compressor with Levels</h1>\n");
    body.push_str(&format!(
        "<p>Compressed {} file(s) with {} level.</p>\n",
        batch.jobs.len(),
        batch.level
    ));

    if batch.summary.succeeded > 0 {
        body.push_str("<p class=\"ok\">Compression completed successfully!</p>\n<ul>\n");
        for (index, job) in batch.jobs.iter().enumerate() {
            let Some(report) = job.report() else {
                continue;
            };
            body.push_str(&format!(
                "<li><a href=\"/download/{}/{}\" download=\"{}\">Download {}</a> \
                 {} &rarr; {} ({:.1}% smaller, {} page(s))</li>\n",
                batch.id,
                index,
                escape(&download_name(&job.name)),
                escape(&job.name),
                format_size(report.original_bytes),
                format_size(report.compressed_bytes),
                reduction_percent(report.original_bytes, report.compressed_bytes),
                report.pages
            ));
        }
        body.push_str("</ul>\n");
    }

    for job in &batch.jobs {
        if let Some(err) = job.error() {
            body.push_str(&format!(
                "<p class=\"err\">Failed to compress {}: {}</p>\n",
                escape(&job.name),
                escape(err)
            ));
        }
    }

    if !batch.summary.failed.is_empty() {
        body.push_str(&format!(
            "<p class=\"warn\">Failed to compress the following files: {}</p>\n",
            escape(&batch.summary.failed.join(", "))
        ));
    }

    body.push_str("<p><a href=\"/\">Compress more files</a></p>\n");
    layout("PDF Compressor - results", &body)
}

pub fn error(message: &str) -> String {
    let body = format!(
        "<h1>PDF Compressor with Levels</h1>\n<p class=\"err\">{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape(message)
    );
    layout("PDF Compressor - error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn index_preselects_medium() {
        let html = index();
        assert!(html.contains("value=\"medium\" checked"));
        assert!(html.contains("value=\"low\">"));
        assert!(html.contains("value=\"high\">"));
        assert!(html.contains("enctype=\"multipart/form-data\""));
    }

    #[test]
    fn results_list_downloads_then_failures() {
        use crate::job::{BatchSummary, FileJob, JobReport, JobStatus};
        use crate::workspace::Workspace;

        let mut ok = FileJob::new("a&b.pdf", "in0", "out0", CompressionLevel::Low);
        ok.status = JobStatus::Succeeded(JobReport {
            original_bytes: 4096,
            compressed_bytes: 1024,
            pages: 2,
        });
        let mut bad = FileJob::new("bad.pdf", "in1", "out1", CompressionLevel::Low);
        bad.status = JobStatus::Failed("gs failed: boom".to_string());
        let summary = BatchSummary {
            succeeded: 1,
            failed: vec!["bad.pdf".to_string()],
        };
        let batch = FinishedBatch::new(
            CompressionLevel::Low,
            vec![ok, bad],
            summary,
            Workspace::new().unwrap(),
        );

        let html = results(&batch);
        assert!(html.contains(&format!(
            "<a href=\"/download/{}/0\" download=\"compressed_a&amp;b.pdf\">Download a&amp;b.pdf</a> \
             4.00 KB &rarr; 1.00 KB (75.0% smaller, 2 page(s))</li>\n",
            batch.id
        )));
        assert!(!html.contains(&format!("/download/{}/1", batch.id)));
        assert!(html.contains("<p class=\"err\">Failed to compress bad.pdf: gs failed: boom</p>\n"));
        assert!(html.contains("Failed to compress the following files: bad.pdf</p>\n"));
    }

    #[test]
    fn error_page_escapes_message() {
        assert!(error("<script>").contains("&lt;script&gt;"));
    }
}
