//! # CO2 Monitor
//!
//! Periodically photographs a CO2 sensor display, reads the digits through a
//! remote OCR job API and appends the validated concentration, with a
//! timestamp, to an append-only log.

pub mod azure_read;
pub mod frame_source;
pub mod monitor;
pub mod monitor_config;
pub mod numeric_extraction;
pub mod pipeline;
pub mod reading;
pub mod recognition;
pub mod sample_errors;
pub mod schedule;
