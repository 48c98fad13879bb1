//! # Reading Log Module
//!
//! A [`Reading`] is the only value that outlives a sampling cycle. It is written
//! as one `timestamp,value` line to an append-only text log; lines are never
//! rewritten or reordered.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use log::info;

/// Timestamp layout of a log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One validated, timestamped concentration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    timestamp: NaiveDateTime,
    value: u64,
}

impl Reading {
    /// Create a reading; sub-second precision is dropped so the log line
    /// round-trips exactly
    pub fn new(timestamp: NaiveDateTime, value: u64) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self { timestamp, value }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Format as a log line, trailing newline included
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use co2_monitor::reading::Reading;
    ///
    /// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 5, 0).unwrap();
    /// assert_eq!(Reading::new(at, 450).to_log_line(), "2024-03-01 08:05:00,450\n");
    /// ```
    pub fn to_log_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.timestamp.format(TIMESTAMP_FORMAT), self.value)
    }
}

/// Errors when parsing a log line back into a [`Reading`]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseReadingError {
    #[error("missing ',' separator in {0:?}")]
    MissingSeparator(String),
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
    #[error("invalid value {0:?}")]
    Value(String),
}

impl FromStr for Reading {
    type Err = ParseReadingError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (timestamp, value) = line
            .split_once(',')
            .ok_or_else(|| ParseReadingError::MissingSeparator(line.to_string()))?;

        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseReadingError::Timestamp(timestamp.to_string()))?;
        let value = value
            .parse::<u64>()
            .map_err(|_| ParseReadingError::Value(value.to_string()))?;

        Ok(Self { timestamp, value })
    }
}

/// Append-only sink for readings
///
/// Every entry is written as a single line and flushed before `append`
/// returns, so a line survives abrupt termination of the process.
pub struct ReadingLog<W: Write> {
    sink: W,
    appended: u64,
}

impl ReadingLog<File> {
    /// Open (or create) the log file at `path` in append mode
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open reading log {}", path.display()))?;

        info!("Appending readings to {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> ReadingLog<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, appended: 0 }
    }

    /// Append one reading and flush it
    pub fn append(&mut self, reading: &Reading) -> io::Result<()> {
        self.sink.write_all(reading.to_log_line().as_bytes())?;
        self.sink.flush()?;
        self.appended += 1;
        Ok(())
    }

    /// Number of entries appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Flush and release the log, returning the underlying sink
    pub fn into_inner(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
