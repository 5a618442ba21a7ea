//! Per-batch staging area for uploaded files.

use std::fs;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use tempfile::TempDir;

use crate::error::Result;
use crate::job::FileJob;
use crate::level::CompressionLevel;

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex = Regex::new(r#"[/\\"\x00-\x1f\x7f]"#).unwrap();
}

/// Owns a fresh temporary directory. Uploaded bytes are written under generated
/// names so two uploads called `report.pdf` never touch the same file; the
/// directory is removed on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    next: usize,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("pdf-compress-").tempdir()?;
        debug!("Created workspace {:?}", dir.path());
        Ok(Self { dir, next: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `bytes` into the workspace and returns a pending job for them.
    pub fn stage(&mut self, name: &str, bytes: &[u8], level: CompressionLevel) -> Result<FileJob> {
        let (input, output) = self.reserve();
        fs::write(&input, bytes)?;
        debug!("Staged {:?} as {:?} ({} bytes)", name, input, bytes.len());
        Ok(FileJob::new(name, input, output, level))
    }

    fn reserve(&mut self) -> (PathBuf, PathBuf) {
        let n = self.next;
        self.next += 1;
        (
            self.dir.path().join(format!("job-{:04}.pdf", n)),
            self.dir.path().join(format!("job-{:04}.out.pdf", n)),
        )
    }
}

/// Name offered to the browser for a compressed file.
pub fn download_name(display: &str) -> String {
    let base = display.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(display);
    format!("compressed_{}", UNSAFE_NAME_CHARS.replace_all(base, "_"))
}

/// `dir/name`, or `dir/stem-N.ext` when an earlier input already claimed that name.
pub fn unique_output(dir: &Path, name: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let first = dir.join(name);
    if taken.insert(first.clone()) {
        return first;
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{}-{}{}", stem, n, ext));
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    #[test]
    fn same_name_uploads_do_not_collide() {
        let mut ws = Workspace::new().unwrap();
        let a = ws.stage("report.pdf", b"first", CompressionLevel::Low).unwrap();
        let b = ws.stage("report.pdf", b"second", CompressionLevel::Low).unwrap();

        assert_ne!(a.input, b.input);
        assert_ne!(a.output, b.output);
        assert_eq!(fs::read(&a.input).unwrap(), b"first");
        assert_eq!(fs::read(&b.input).unwrap(), b"second");
        assert_eq!(a.name, "report.pdf");
        assert_eq!(a.status, JobStatus::Pending);
    }

    #[test]
    fn separate_workspaces_use_separate_directories() {
        let mut one = Workspace::new().unwrap();
        let mut two = Workspace::new().unwrap();
        let a = one.stage("x.pdf", b"1", CompressionLevel::High).unwrap();
        let b = two.stage("x.pdf", b"2", CompressionLevel::High).unwrap();
        assert_ne!(a.input, b.input);
    }

    #[test]
    fn directory_removed_on_drop() {
        let ws = Workspace::new().unwrap();
        let path = ws.path().to_path_buf();
        assert!(path.is_dir());
        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn repeated_output_names_get_a_suffix() {
        let dir = Path::new("out");
        let mut taken = HashSet::new();
        let name = download_name("a.pdf");
        assert_eq!(unique_output(dir, &name, &mut taken), dir.join("compressed_a.pdf"));
        assert_eq!(unique_output(dir, &name, &mut taken), dir.join("compressed_a-1.pdf"));
        assert_eq!(unique_output(dir, &name, &mut taken), dir.join("compressed_a-2.pdf"));
        assert_eq!(
            unique_output(dir, "compressed_b.pdf", &mut taken),
            dir.join("compressed_b.pdf")
        );
    }

    #[test]
    fn download_names_are_sanitized() {
        assert_eq!(download_name("report.pdf"), "compressed_report.pdf");
        assert_eq!(download_name("../../etc/passwd.pdf"), "compressed_passwd.pdf");
        assert_eq!(download_name(r"C:\docs\a.pdf"), "compressed_a.pdf");
        assert_eq!(download_name("say \"hi\".pdf"), "compressed_say _hi_.pdf");
        assert_eq!(download_name("tab\there.pdf"), "compressed_tab_here.pdf");
    }
}
