//! # Sample Pipeline Module
//!
//! One sampling cycle end to end: capture, PNG encoding, recognition,
//! extraction and validation. The first failing stage ends the cycle and its
//! error is returned unchanged; nothing is retried here.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::frame_source::FrameSource;
use crate::numeric_extraction::{extract_value, AcceptedRange};
use crate::reading::Reading;
use crate::recognition::Recognizer;
use crate::sample_errors::SampleError;
use crate::schedule::Clock;

/// Anything that can produce one reading per call
#[allow(async_fn_in_trait)]
pub trait Sampler {
    async fn sample(&mut self) -> Result<Reading, SampleError>;
}

pub struct SamplePipeline<F, R, C> {
    frames: F,
    recognizer: R,
    clock: C,
    accepted_range: AcceptedRange,
    frame_snapshot: Option<PathBuf>,
}

impl<F: FrameSource, R: Recognizer, C: Clock> SamplePipeline<F, R, C> {
    pub fn new(frames: F, recognizer: R, clock: C, accepted_range: AcceptedRange) -> Self {
        Self {
            frames,
            recognizer,
            clock,
            accepted_range,
            frame_snapshot: None,
        }
    }

    /// Also write each encoded frame to `path`
    pub fn with_frame_snapshot(mut self, path: Option<PathBuf>) -> Self {
        self.frame_snapshot = path;
        self
    }

    async fn keep_snapshot(&self, png: &[u8]) {
        if let Some(path) = &self.frame_snapshot {
            match tokio::fs::write(path, png).await {
                Ok(()) => debug!("Frame snapshot written to {}", path.display()),
                Err(e) => warn!("Could not write frame snapshot {}: {e}", path.display()),
            }
        }
    }
}

impl<F: FrameSource, R: Recognizer, C: Clock> Sampler for SamplePipeline<F, R, C> {
    async fn sample(&mut self) -> Result<Reading, SampleError> {
        let png = {
            let frame = self.frames.capture().await?;
            frame.encode_png()?
        };
        self.keep_snapshot(&png).await;

        let lines = self.recognizer.recognize(png).await?;
        let value = self.accepted_range.check(extract_value(&lines)?)?;

        info!("CO2 level: {value} ppm");
        Ok(Reading::new(self.clock.now(), value))
    }
}
