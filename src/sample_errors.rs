//! # Sample Error Types Module
//!
//! This module defines the error taxonomy of one sampling cycle. Every stage of
//! the pipeline fails fast with one of these variants; the monitor loop is the
//! only place they are caught.

use std::time::Duration;

use thiserror::Error;

/// Custom error types for a sampling cycle
#[derive(Debug, Error)]
pub enum SampleError {
    /// Camera could not be opened or produced no usable frame
    #[error("Device error: {0}")]
    Device(String),
    /// Captured frame could not be encoded for submission
    #[error("Encode error: {0}")]
    Encode(String),
    /// Recognition request could not be sent or was rejected
    #[error("Submission error: {0}")]
    Submission(String),
    /// Remote job reported failure or its status could not be read
    #[error("Recognition error: {0}")]
    Recognition(String),
    /// Job did not reach a terminal status within the poll bounds
    #[error("Recognition timeout: no terminal status after {attempts} polls ({elapsed:?})")]
    RecognitionTimeout { attempts: u32, elapsed: Duration },
    /// No recognized line starts with a digit run
    #[error("Extraction error: {0}")]
    Extraction(String),
    /// Extracted value is outside the accepted domain
    #[error("Validation error: bad co2 level {value} (accepted range is [{min}, {max}))")]
    Validation { value: u64, min: u64, max: u64 },
    /// Reading could not be appended to the log
    #[error("Log error: {0}")]
    Log(#[from] std::io::Error),
}

impl SampleError {
    /// Stable short name of the failure, used in cycle reports
    pub fn kind(&self) -> &'static str {
        match self {
            SampleError::Device(_) => "device",
            SampleError::Encode(_) => "encode",
            SampleError::Submission(_) => "submission",
            SampleError::Recognition(_) => "recognition",
            SampleError::RecognitionTimeout { .. } => "recognition_timeout",
            SampleError::Extraction(_) => "extraction",
            SampleError::Validation { .. } => "validation",
            SampleError::Log(_) => "log",
        }
    }
}
