//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use co2_monitor::frame_source::{Frame, FrameSource};
use co2_monitor::recognition::{OperationRef, RecognitionJob, RecognitionService, Recognizer};
use co2_monitor::sample_errors::SampleError;
use co2_monitor::schedule::{Clock, Sleeper};

pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Clock that always reads the same instant
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Sleeper that returns immediately and records every requested duration
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Frame source yielding a small black frame, or failing when `fail` is set
#[derive(Default)]
pub struct FakeCamera {
    pub fail: bool,
    pub captures: usize,
}

impl FrameSource for FakeCamera {
    async fn capture(&mut self) -> Result<Frame, SampleError> {
        self.captures += 1;
        if self.fail {
            return Err(SampleError::Device("camera unplugged".to_string()));
        }
        Frame::from_rgb(4, 2, vec![0; 4 * 2 * 3])
    }
}

/// Recognition service replaying a scripted sequence of job states
pub struct ScriptedService {
    pub submit_error: Option<String>,
    pub polls: Mutex<VecDeque<Result<RecognitionJob, SampleError>>>,
    pub submitted: Mutex<Vec<(usize, String)>>,
    pub poll_count: Mutex<u32>,
}

impl ScriptedService {
    pub fn new(polls: Vec<Result<RecognitionJob, SampleError>>) -> Self {
        Self {
            submit_error: None,
            polls: Mutex::new(polls.into()),
            submitted: Mutex::new(Vec::new()),
            poll_count: Mutex::new(0),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            submit_error: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn polls_made(&self) -> u32 {
        *self.poll_count.lock().unwrap()
    }
}

impl RecognitionService for ScriptedService {
    async fn submit(&self, image: Vec<u8>, language: &str) -> Result<OperationRef, SampleError> {
        if let Some(message) = &self.submit_error {
            return Err(SampleError::Submission(message.clone()));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((image.len(), language.to_string()));
        Ok(OperationRef::new("op-1"))
    }

    async fn poll(&self, operation: &OperationRef) -> Result<RecognitionJob, SampleError> {
        assert_eq!(operation.as_str(), "op-1");
        *self.poll_count.lock().unwrap() += 1;
        // Once the script runs out the job stays running.
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RecognitionJob::pending(co2_monitor::recognition::JobStatus::Running)))
    }
}

/// Recognizer returning one scripted result per call
pub struct ScriptedRecognizer {
    pub results: Mutex<VecDeque<Result<Vec<String>, SampleError>>>,
}

impl ScriptedRecognizer {
    pub fn new(results: Vec<Result<Vec<String>, SampleError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, image: Vec<u8>) -> Result<Vec<String>, SampleError> {
        assert!(image.starts_with(b"\x89PNG"), "recognizer expects a PNG image");
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SampleError::Recognition("script exhausted".to_string())))
    }
}
