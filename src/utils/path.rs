//! Path utilities for the downloads directory

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Path utilities for artifact directories
pub struct PathUtils;

impl PathUtils {
    /// Create `dir` and its parents if missing
    pub async fn ensure_directory(dir: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(dir).await
    }

    /// Resolve `path` against the current directory when relative
    pub fn absolutize(path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Whether a file name belongs to an in-flight download,
    /// i.e. `temp_<millis>-<seq>_XXXX.<ext>`
    pub fn is_temp_artifact(file_name: &str) -> bool {
        temp_artifact_pattern().is_match(file_name)
    }

    /// Remove leftover temp files in `dir`, returning how many were deleted.
    ///
    /// Only meant for startup, before any job runs.
    pub async fn sweep_temp_artifacts(dir: &Path) -> io::Result<usize> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !Self::is_temp_artifact(&name.to_string_lossy()) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn temp_artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^temp_\d+-\d+_[A-Za-z0-9]{4}\.[A-Za-z0-9]+$").expect("valid temp artifact regex")
    })
}
