//! # Recognition Client Module
//!
//! Two-phase protocol over an asynchronous OCR job API: submit the image,
//! then poll the job until it leaves the `NotStarted`/`Running` states.
//! Polling is bounded by an attempt cap and a wall-clock timeout.

use std::time::Duration;

use log::{debug, info, trace};
use tokio::time::Instant;

use crate::monitor_config::PollConfig;
use crate::sample_errors::SampleError;
use crate::schedule::Sleeper;

/// Opaque reference to a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationRef(String);

impl OperationRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the reference from a location identifier, whose last path
    /// segment is the operation id
    pub fn from_location(location: &str) -> Option<Self> {
        location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a recognition job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Snapshot of a job returned by one status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionJob {
    pub status: JobStatus,
    /// Recognized lines, grouped by text region in service order; empty
    /// until the job succeeds
    pub lines: Vec<String>,
}

impl RecognitionJob {
    pub fn pending(status: JobStatus) -> Self {
        Self {
            status,
            lines: Vec::new(),
        }
    }

    pub fn succeeded(lines: Vec<String>) -> Self {
        Self {
            status: JobStatus::Succeeded,
            lines,
        }
    }
}

/// Remote OCR job API
#[allow(async_fn_in_trait)]
pub trait RecognitionService {
    /// Send `image` with a language hint and return the job reference
    async fn submit(&self, image: Vec<u8>, language: &str) -> Result<OperationRef, SampleError>;

    /// Query the current state of a submitted job
    async fn poll(&self, operation: &OperationRef) -> Result<RecognitionJob, SampleError>;
}

impl<T: RecognitionService> RecognitionService for &T {
    async fn submit(&self, image: Vec<u8>, language: &str) -> Result<OperationRef, SampleError> {
        (**self).submit(image, language).await
    }

    async fn poll(&self, operation: &OperationRef) -> Result<RecognitionJob, SampleError> {
        (**self).poll(operation).await
    }
}

/// Turns image bytes into recognized text lines
#[allow(async_fn_in_trait)]
pub trait Recognizer {
    async fn recognize(&self, image: Vec<u8>) -> Result<Vec<String>, SampleError>;
}

/// Polling client over any [`RecognitionService`]
pub struct RecognitionClient<S, Z> {
    service: S,
    sleeper: Z,
    language: String,
    poll: PollConfig,
}

impl<S: RecognitionService, Z: Sleeper> RecognitionClient<S, Z> {
    pub fn new(service: S, sleeper: Z, language: impl Into<String>, poll: PollConfig) -> Self {
        Self {
            service,
            sleeper,
            language: language.into(),
            poll,
        }
    }

    /// Poll `operation` until its status is terminal or a bound is exceeded
    async fn wait_for_result(&self, operation: &OperationRef) -> Result<RecognitionJob, SampleError> {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            let job = self.service.poll(operation).await?;
            attempts += 1;
            trace!(
                "Poll {attempts} of operation {}: {:?}",
                operation.as_str(),
                job.status
            );

            if job.status.is_terminal() {
                debug!(
                    "Operation {} finished after {attempts} polls",
                    operation.as_str()
                );
                return Ok(job);
            }

            let elapsed = started.elapsed();
            if attempts >= self.poll.max_attempts || elapsed + self.poll.interval > self.poll.timeout {
                return Err(SampleError::RecognitionTimeout { attempts, elapsed });
            }

            self.sleeper.sleep(self.poll.interval).await;
        }
    }
}

impl<S: RecognitionService, Z: Sleeper> Recognizer for RecognitionClient<S, Z> {
    async fn recognize(&self, image: Vec<u8>) -> Result<Vec<String>, SampleError> {
        let size = image.len();
        let operation = self.service.submit(image, &self.language).await?;
        info!(
            "Submitted {size} byte image for recognition, operation {}",
            operation.as_str()
        );

        let job = self.wait_for_result(&operation).await?;
        match job.status {
            JobStatus::Succeeded => Ok(job.lines),
            _ => Err(SampleError::Recognition(format!(
                "operation {} reported failure",
                operation.as_str()
            ))),
        }
    }
}

impl<T: Recognizer> Recognizer for &T {
    async fn recognize(&self, image: Vec<u8>) -> Result<Vec<String>, SampleError> {
        (**self).recognize(image).await
    }
}

/// Total time a job may spend waiting under `poll`, ignoring request latency
pub fn worst_case_wait(poll: &PollConfig) -> Duration {
    let by_attempts = poll.interval * poll.max_attempts.saturating_sub(1);
    by_attempts.min(poll.timeout)
}
