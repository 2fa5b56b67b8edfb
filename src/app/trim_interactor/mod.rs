// Trim interactor - Orchestrates the segment trim use case

use std::io;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

mod job;

pub use job::{next_job_id, OutputGuard, PipelineJob};
use job::storage_error;

/// Interactor for the trim use case
pub struct TrimInteractor {
    resolver: Arc<dyn SourceResolver>,
    extractor: Arc<dyn SegmentExtractor>,
    probe: Option<Arc<dyn ProbePort>>,
    settings: Arc<PipelineSettings>,
    limiter: Option<Arc<Semaphore>>,
}

impl TrimInteractor {
    /// Create new trim interactor with injected ports
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        extractor: Arc<dyn SegmentExtractor>,
        probe: Option<Arc<dyn ProbePort>>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        let limiter = match settings.max_concurrent_jobs {
            0 => None,
            permits => Some(Arc::new(Semaphore::new(permits))),
        };

        Self {
            resolver,
            extractor,
            probe,
            settings,
            limiter,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one request end to end.
    ///
    /// Every exit path, including cancellation of the returned future,
    /// leaves neither the temp file nor a partial artifact behind.
    pub async fn execute(&self, request: TrimRequest) -> Result<TrimResult, PipelineError> {
        // A closed semaphore never happens; run unbounded if it did
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let mut job = PipelineJob::new(request);
        let result = self.run(&mut job).await;

        match &result {
            Ok(result) => {
                job.transition(JobState::Completed);
                info!(job_id = %job.id, file = %result.file_name, "Job completed");
            }
            Err(err) => job.fail(err),
        }
        result
    }

    async fn run(&self, job: &mut PipelineJob) -> Result<TrimResult, PipelineError> {
        let request = job.request.clone();
        let source = self.settings.descriptor(&request.video_id)?;

        job.transition(JobState::Resolving);
        let metadata = timeout(self.settings.resolve_timeout, self.resolver.resolve(&source))
            .await
            .map_err(|_| PipelineError::Timeout {
                stage: "resolve",
                seconds: self.settings.resolve_timeout.as_secs(),
            })??;
        debug!(
            job_id = %job.id,
            title = %metadata.title,
            duration = metadata.duration,
            formats = metadata.formats.len(),
            "Source resolved"
        );

        request.window.validate_against_duration(metadata.duration)?;

        let container = request.output_container()?;
        if !self.extractor.supports(container).await {
            return Err(PipelineError::UnsupportedContainer(format!(
                "{} is not supported by the transcoder",
                container
            )));
        }

        let audio_only = request.audio_only || container.is_audio_only();
        let option = FormatSelector::select(
            &metadata.formats,
            FormatPreferences {
                quality: request.quality,
                audio_only,
            },
            &self.settings.quality_map,
        )?;
        info!(
            job_id = %job.id,
            token = %option.token,
            tier = %option.tier(),
            requires_auth = option.requires_auth,
            "Encoding selected"
        );

        let destination = request
            .destination
            .clone()
            .unwrap_or_else(|| self.settings.downloads_dir.clone());
        PathUtils::ensure_directory(&destination)
            .await
            .map_err(|e| storage_error("Failed to create output directory", e))?;
        let output = OutputGuard::reserve(&destination, &metadata.title, container).await?;
        job.output_path = Some(output.path().to_path_buf());

        job.transition(JobState::Downloading);
        let temp = job.create_temp_file(&destination, &option.container)?;
        let written = timeout(
            self.settings.download_timeout,
            self.download(&source, &option, &temp),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            stage: "download",
            seconds: self.settings.download_timeout.as_secs(),
        })??;
        debug!(job_id = %job.id, bytes = written, "Source downloaded");

        job.transition(JobState::Extracting);
        let options = ExtractOptions {
            container,
            audio_only,
            audio_bitrate_kbps: self.settings.audio_bitrate_kbps,
        };
        self.extractor
            .extract(&temp, output.path(), &request.window, &options)
            .await?;

        if self.settings.verify_output {
            self.verify(job, output.path(), &request.window, audio_only)
                .await?;
        }

        if let Err(e) = temp.close() {
            warn!(job_id = %job.id, "Could not remove temp file: {}", e);
        }
        let output_path = output.keep();
        Ok(TrimResult::success(output_path, container, audio_only))
    }

    /// Copy the selected stream into `temp`, returning the byte count
    async fn download(
        &self,
        source: &SourceDescriptor,
        option: &EncodingOption,
        temp: &Path,
    ) -> Result<u64, PipelineError> {
        let mut stream = self.resolver.open_stream(source, option).await?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(temp)
            .await
            .map_err(|e| storage_error("Failed to open temp file", e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(stream_error)?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| storage_error("Failed to write temp file", e))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| storage_error("Failed to write temp file", e))?;

        if written == 0 {
            return Err(PipelineError::SourceUnavailable(
                "source stream was empty".to_string(),
            ));
        }
        Ok(written)
    }

    async fn verify(
        &self,
        job: &PipelineJob,
        artifact: &Path,
        window: &TrimWindow,
        audio_only: bool,
    ) -> Result<(), PipelineError> {
        let Some(probe) = &self.probe else {
            return Ok(());
        };

        let report = match probe.probe(artifact).await {
            Ok(report) => report,
            Err(e) => {
                // Probing is advisory when the artifact was written fine
                warn!(job_id = %job.id, "Could not probe artifact: {}", e);
                return Ok(());
            }
        };

        for warning in ArtifactValidator::validate(&report, window, audio_only)? {
            warn!(job_id = %job.id, "{}", warning);
        }
        Ok(())
    }
}

/// Error of the source stream, as classified by the resolver when possible
fn stream_error(err: io::Error) -> PipelineError {
    let message = err.to_string();
    PipelineError::from_io(err).unwrap_or(PipelineError::SourceUnavailable(message))
}
