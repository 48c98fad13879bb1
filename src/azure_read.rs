//! # Azure Read Service Module
//!
//! [`RecognitionService`] over the Computer Vision Read v3.2 REST API.
//! Submission posts the raw image and answers `202 Accepted` with an
//! `Operation-Location` header; the result is fetched from
//! `read/analyzeResults/{operation id}`.

use std::time::Duration;

use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;

use crate::monitor_config::RecognitionConfig;
use crate::recognition::{JobStatus, OperationRef, RecognitionJob, RecognitionService};
use crate::sample_errors::SampleError;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";
const READ_API_PATH: &str = "vision/v3.2/read";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ReadStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ReadPage {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    read_results: Vec<ReadPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadOperationResult {
    status: ReadStatus,
    analyze_result: Option<AnalyzeResult>,
}

/// Decode a `read/analyzeResults` response body
///
/// Lines are flattened region by region in the order the service reports
/// them. Statuses the client does not know are treated as failures.
pub fn parse_read_result(body: &str) -> Result<RecognitionJob, SampleError> {
    let result: ReadOperationResult = serde_json::from_str(body)
        .map_err(|e| SampleError::Recognition(format!("malformed read result: {e}")))?;

    let job = match result.status {
        ReadStatus::NotStarted => RecognitionJob::pending(JobStatus::NotStarted),
        ReadStatus::Running => RecognitionJob::pending(JobStatus::Running),
        ReadStatus::Failed | ReadStatus::Unknown => RecognitionJob::pending(JobStatus::Failed),
        ReadStatus::Succeeded => RecognitionJob::succeeded(
            result
                .analyze_result
                .map(|analysis| {
                    analysis
                        .read_results
                        .into_iter()
                        .flat_map(|page| page.lines)
                        .map(|line| line.text)
                        .collect()
                })
                .unwrap_or_default(),
        ),
    };
    Ok(job)
}

/// HTTP client for the Read API
#[derive(Clone)]
pub struct AzureReadService {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl AzureReadService {
    pub fn new(config: &RecognitionConfig) -> Result<Self, SampleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| SampleError::Submission(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            key: config.key.clone(),
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}{READ_API_PATH}/analyze", self.endpoint)
    }

    fn result_url(&self, operation: &OperationRef) -> String {
        format!(
            "{}{READ_API_PATH}/analyzeResults/{}",
            self.endpoint,
            operation.as_str()
        )
    }
}

impl RecognitionService for AzureReadService {
    async fn submit(&self, image: Vec<u8>, language: &str) -> Result<OperationRef, SampleError> {
        let response = self
            .client
            .post(self.analyze_url())
            .query(&[("language", language)])
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))
            .body(image)
            .send()
            .await
            .map_err(|e| SampleError::Submission(format!("read request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SampleError::Submission(format!(
                "read request rejected with {status}: {}",
                body.trim()
            )));
        }

        let location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                SampleError::Submission(format!("response has no {OPERATION_LOCATION_HEADER} header"))
            })?;
        debug!("Read operation location: {location}");

        OperationRef::from_location(location).ok_or_else(|| {
            SampleError::Submission(format!("unusable operation location {location:?}"))
        })
    }

    async fn poll(&self, operation: &OperationRef) -> Result<RecognitionJob, SampleError> {
        let response = self
            .client
            .get(self.result_url(operation))
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .send()
            .await
            .map_err(|e| SampleError::Recognition(format!("status request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SampleError::Recognition(format!("status body unreadable: {e}")))?;
        if !status.is_success() {
            return Err(SampleError::Recognition(format!(
                "status request rejected with {status}: {}",
                body.trim()
            )));
        }

        parse_read_result(&body)
    }
}
