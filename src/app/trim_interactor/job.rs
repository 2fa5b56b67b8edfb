// Pipeline job - Per-request state and the resources it owns

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::TempPath;
use tracing::{debug, error, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::OutputNaming;
use crate::utils::time::timestamp_millis;

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `<millis>-<seq>`, unique within the process
pub fn next_job_id() -> String {
    let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{}-{}", timestamp_millis(), seq)
}

pub(crate) fn storage_error(context: &str, err: io::Error) -> PipelineError {
    PipelineError::Storage(format!("{}: {}", context, err))
}

/// One execution of the pipeline
#[derive(Debug)]
pub struct PipelineJob {
    pub id: String,
    pub request: TrimRequest,
    state: JobState,
    pub temp_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl PipelineJob {
    pub fn new(request: TrimRequest) -> Self {
        let job = Self {
            id: next_job_id(),
            request,
            state: JobState::Created,
            temp_path: None,
            output_path: None,
        };
        info!(
            job_id = %job.id,
            video_id = %job.request.video_id,
            start = job.request.window.start,
            end = job.request.window.end,
            quality = %job.request.quality,
            format = %job.request.format,
            audio_only = job.request.audio_only,
            "Job created"
        );
        job
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn transition(&mut self, next: JobState) {
        debug_assert!(!self.state.is_terminal(), "job {} already finished", self.id);
        info!(job_id = %self.id, from = %self.state, to = %next, "Job state changed");
        self.state = next;
    }

    pub fn fail(&mut self, err: &PipelineError) {
        error!(
            job_id = %self.id,
            stage = %self.state,
            kind = ?err.kind(),
            error = %err,
            "Job failed"
        );
        self.state = JobState::Failed;
    }

    /// Create the job-scoped temp file `temp_<jobId>_XXXX.<ext>` in `dir`
    pub fn create_temp_file(&mut self, dir: &Path, extension: &str) -> Result<TempPath, PipelineError> {
        let extension = if !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            extension
        } else {
            "tmp"
        };

        let temp = tempfile::Builder::new()
            .prefix(&format!("temp_{}_", self.id))
            .suffix(&format!(".{}", extension))
            .rand_bytes(4)
            .tempfile_in(dir)
            .map_err(|e| storage_error("Failed to create temp file", e))?
            .into_temp_path();

        debug!(job_id = %self.id, path = %temp.display(), "Temp file created");
        self.temp_path = Some(temp.to_path_buf());
        Ok(temp)
    }
}

/// Reserved artifact path, deleted on drop unless kept
#[derive(Debug)]
pub struct OutputGuard {
    path: PathBuf,
    keep: bool,
}

impl OutputGuard {
    const MAX_ATTEMPTS: i64 = 1000;

    /// Reserve `<sanitizedTitle>_<timestamp>.<ext>` in `dir` with create-new
    /// semantics, bumping the timestamp on collision
    pub async fn reserve(dir: &Path, title: &str, container: Container) -> Result<Self, PipelineError> {
        let base = timestamp_millis();

        for bump in 0..Self::MAX_ATTEMPTS {
            let path = dir.join(OutputNaming::file_name(title, base + bump, container));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(Self { path, keep: false }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(storage_error("Failed to reserve output file", e)),
            }
        }

        Err(PipelineError::Storage(format!(
            "No free output name in {}",
            dir.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand the artifact over to the caller
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed unfinished output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Could not remove unfinished output: {}", e),
        }
    }
}
