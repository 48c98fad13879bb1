//! # Frame Source Module
//!
//! Single still-frame acquisition from a V4L2 camera. The camera is driven
//! through an `ffmpeg` child process that grabs exactly one raw `bgr24` frame;
//! the process is the device handle and is killed on every exit path, so the
//! next capture can reacquire the device.

use std::io::Cursor;
use std::process::Stdio;
use std::time::Duration;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use log::{debug, info, warn};
use tokio::process::Command;

use crate::monitor_config::CameraConfig;
use crate::sample_errors::SampleError;

/// In-memory RGB raster, three bytes per pixel in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Build a frame from RGB bytes
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Device`] if `data` is not `width * height * 3` bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, SampleError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SampleError::Device(format!(
                "expected {expected} bytes for a {width}x{height} frame, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a frame from BGR bytes, as delivered by the camera, reordering
    /// channels to RGB
    pub fn from_bgr(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self, SampleError> {
        for pixel in data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        Self::from_rgb(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.data
    }

    /// Encode the frame as a lossless PNG bitmap
    pub fn encode_png(&self) -> Result<Vec<u8>, SampleError> {
        let mut buffer = Cursor::new(Vec::new());
        PngEncoder::new(&mut buffer)
            .write_image(&self.data, self.width, self.height, ColorType::Rgb8)
            .map_err(|e| SampleError::Encode(format!("PNG encoding failed: {e}")))?;
        Ok(buffer.into_inner())
    }
}

/// Produces one still frame on demand
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn capture(&mut self) -> Result<Frame, SampleError>;
}

/// Camera capture through `ffmpeg` and `v4l2-ctl`
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    config: CameraConfig,
}

impl FfmpegFrameSource {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Ask the driver for continuous autofocus. Cameras without the control
    /// still capture, so failure is only logged.
    async fn enable_autofocus(&self) {
        let result = Command::new("v4l2-ctl")
            .arg("--device")
            .arg(&self.config.device)
            .arg("--set-ctrl=focus_automatic_continuous=1")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                debug!("Autofocus enabled on {}", self.config.device);
            }
            Ok(output) => warn!(
                "Could not enable autofocus on {}: {}",
                self.config.device,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("Could not run v4l2-ctl for autofocus: {e}"),
        }
    }

    fn ffmpeg_command(&self) -> Command {
        let size = format!("{}x{}", self.config.width, self.config.height);
        let scale = format!("scale={}:{}", self.config.width, self.config.height);

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-f")
            .arg("video4linux2")
            .arg("-video_size")
            .arg(&size)
            .arg("-i")
            .arg(&self.config.device)
            .arg("-frames:v")
            .arg("1")
            .arg("-vf")
            .arg(&scale)
            .arg("-pix_fmt")
            .arg("bgr24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl FrameSource for FfmpegFrameSource {
    async fn capture(&mut self) -> Result<Frame, SampleError> {
        self.enable_autofocus().await;

        let child = self.ffmpeg_command().spawn().map_err(|e| {
            SampleError::Device(format!("failed to start ffmpeg for {}: {e}", self.config.device))
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let timeout = Duration::from_secs(self.config.capture_timeout_secs);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SampleError::Device(format!(
                    "no frame from {} within {timeout:?}",
                    self.config.device
                ))
            })?
            .map_err(|e| SampleError::Device(format!("ffmpeg did not finish: {e}")))?;

        if !output.status.success() {
            return Err(SampleError::Device(format!(
                "could not open {}: {}",
                self.config.device,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame = Frame::from_bgr(self.config.width, self.config.height, output.stdout)?;
        info!(
            "Captured {}x{} frame from {}",
            frame.width(),
            frame.height(),
            self.config.device
        );
        Ok(frame)
    }
}
