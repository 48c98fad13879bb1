//! # Monitor Configuration Module
//!
//! This module defines configuration structures for the sampler: camera
//! settings, recognition service access, poll bounds, the accepted reading
//! range and the schedule. Values are read once from the environment at
//! startup and never change afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::numeric_extraction::{AcceptedRange, DEFAULT_MAX_PPM, DEFAULT_MIN_PPM};

// Constants for monitor configuration
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_DEVICE: &str = "/dev/video0";
pub const MIN_CAPTURE_WIDTH: u32 = 1280;
pub const MIN_CAPTURE_HEIGHT: u32 = 720;
pub const DEFAULT_LOG_PATH: &str = "co2.csv";
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 10 * 60; // every 10 minutes

/// Camera capture settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    /// V4L2 device path
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Upper bound on one frame acquisition in seconds
    pub capture_timeout_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            width: MIN_CAPTURE_WIDTH,
            height: MIN_CAPTURE_HEIGHT,
            capture_timeout_secs: 20,
        }
    }
}

/// Status polling bounds for an asynchronous recognition job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status queries
    pub interval: Duration,
    /// Maximum number of status queries per job
    pub max_attempts: u32,
    /// Wall-clock bound on the whole wait
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
            timeout: Duration::from_secs(90),
        }
    }
}

/// Recognition service access
#[derive(Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Base URL, with trailing slash
    pub endpoint: String,
    /// Subscription key
    pub key: String,
    /// Language hint sent with each submission
    pub language: String,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
    pub poll: PollConfig,
}

impl RecognitionConfig {
    /// Regional endpoint of the recognition service
    pub fn endpoint_for_region(region: &str) -> String {
        format!("https://{region}.api.cognitive.microsoft.com/")
    }
}

impl fmt::Debug for RecognitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("language", &self.language)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll", &self.poll)
            .finish()
    }
}

/// Complete sampler configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub recognition: RecognitionConfig,
    /// Accepted reading domain
    pub accepted_range: AcceptedRange,
    /// Idle period between two cycles
    pub sample_interval: Duration,
    /// Append-only reading log
    pub log_path: PathBuf,
    /// Where to keep the last encoded frame, if anywhere
    pub frame_snapshot: Option<PathBuf>,
}

impl MonitorConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let region = required("ACCOUNT_REGION")?;
        let key = required("ACCOUNT_KEY")?;
        let endpoint = lookup("OCR_ENDPOINT")
            .map(|e| if e.ends_with('/') { e } else { format!("{e}/") })
            .unwrap_or_else(|| RecognitionConfig::endpoint_for_region(&region));

        let defaults = PollConfig::default();
        let poll = PollConfig {
            interval: Duration::from_millis(parse_or(
                &lookup,
                "OCR_POLL_INTERVAL_MS",
                defaults.interval.as_millis() as u64,
            )?),
            max_attempts: parse_or(&lookup, "OCR_POLL_MAX_ATTEMPTS", defaults.max_attempts)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "OCR_POLL_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
        };

        let recognition = RecognitionConfig {
            endpoint,
            key,
            language: lookup("OCR_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            http_timeout_secs: parse_or(&lookup, "OCR_HTTP_TIMEOUT_SECS", 30)?,
            poll,
        };

        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            device: lookup("CAMERA_DEVICE").unwrap_or(camera_defaults.device),
            width: parse_or(&lookup, "CAMERA_WIDTH", camera_defaults.width)?,
            height: parse_or(&lookup, "CAMERA_HEIGHT", camera_defaults.height)?,
            capture_timeout_secs: parse_or(
                &lookup,
                "CAMERA_CAPTURE_TIMEOUT_SECS",
                camera_defaults.capture_timeout_secs,
            )?,
        };

        let accepted_range = AcceptedRange::new(
            parse_or(&lookup, "CO2_MIN_PPM", DEFAULT_MIN_PPM)?,
            parse_or(&lookup, "CO2_MAX_PPM", DEFAULT_MAX_PPM)?,
        );

        let config = Self {
            camera,
            recognition,
            accepted_range,
            sample_interval: Duration::from_secs(parse_or(
                &lookup,
                "CO2_SAMPLE_INTERVAL_SECS",
                DEFAULT_SAMPLE_INTERVAL_SECS,
            )?),
            log_path: lookup("CO2_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            frame_snapshot: lookup("CO2_FRAME_SNAPSHOT").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the sampler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.camera.width < MIN_CAPTURE_WIDTH || self.camera.height < MIN_CAPTURE_HEIGHT {
            bail!(
                "capture resolution {}x{} is below the minimum {MIN_CAPTURE_WIDTH}x{MIN_CAPTURE_HEIGHT}",
                self.camera.width,
                self.camera.height
            );
        }
        if self.accepted_range.min >= self.accepted_range.max {
            bail!(
                "CO2_MIN_PPM ({}) must be below CO2_MAX_PPM ({})",
                self.accepted_range.min,
                self.accepted_range.max
            );
        }
        let poll = &self.recognition.poll;
        if poll.interval.is_zero() {
            bail!("OCR_POLL_INTERVAL_MS must be greater than zero");
        }
        if poll.max_attempts == 0 {
            bail!("OCR_POLL_MAX_ATTEMPTS must be greater than zero");
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}
