//! # Numeric Extraction Module
//!
//! This module turns the text lines recognized on the sensor display into a
//! single integer reading, and validates that reading against the accepted
//! concentration range.
//!
//! ## Rules
//!
//! - Whitespace and hyphens are stripped from each line (OCR often reads the
//!   display's separators as dashes)
//! - The first line, in the order given, whose cleaned text starts with a digit
//!   run wins; later lines are never examined
//! - Only the leading digit run is kept, so a trailing unit label such as
//!   `ppm` is ignored

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::sample_errors::SampleError;

pub const DEFAULT_MIN_PPM: u64 = 300;
pub const DEFAULT_MAX_PPM: u64 = 5000;

const LEADING_DIGITS_PATTERN: &str = r"^([0-9]+)";

lazy_static! {
    static ref LEADING_DIGITS_REGEX: Regex =
        Regex::new(LEADING_DIGITS_PATTERN).expect("Leading digits pattern should be valid");
}

/// Remove every whitespace character and every literal hyphen from a line
///
/// # Examples
///
/// ```rust
/// use co2_monitor::numeric_extraction::clean_line;
///
/// assert_eq!(clean_line("  1 2 3 - ppm"), "123ppm");
/// ```
pub fn clean_line(line: &str) -> String {
    line.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Return the leading digit run of an already cleaned line, if any
fn leading_digits(cleaned: &str) -> Option<&str> {
    LEADING_DIGITS_REGEX
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract the reading value from recognized lines
///
/// Scans `lines` in order and returns the leading digit run of the first
/// matching cleaned line, parsed as base 10. A run too long for `u64`
/// saturates to `u64::MAX`, which no accepted range admits.
///
/// # Examples
///
/// ```rust
/// use co2_monitor::numeric_extraction::extract_value;
///
/// let lines = vec!["CO2".to_string(), "  1 2 3 - ppm".to_string()];
/// assert_eq!(extract_value(&lines)?, 123);
/// # Ok::<(), co2_monitor::sample_errors::SampleError>(())
/// ```
///
/// # Errors
///
/// Returns [`SampleError::Extraction`] when no line matches.
pub fn extract_value<S: AsRef<str>>(lines: &[S]) -> Result<u64, SampleError> {
    for line in lines {
        let cleaned = clean_line(line.as_ref());
        debug!("Detected: {cleaned}");

        if let Some(digits) = leading_digits(&cleaned) {
            let value = digits.parse::<u64>().unwrap_or(u64::MAX);
            trace!("Leading digit run {digits:?} parsed as {value}");
            return Ok(value);
        }
    }

    Err(SampleError::Extraction(format!(
        "no digits at the start of any of {} recognized lines",
        lines.len()
    )))
}

/// Accepted reading domain, inclusive `min` and exclusive `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedRange {
    pub min: u64,
    pub max: u64,
}

impl AcceptedRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        value >= self.min && value < self.max
    }

    /// Pass `value` through if it lies in range
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Validation`] for values outside `[min, max)`.
    pub fn check(&self, value: u64) -> Result<u64, SampleError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(SampleError::Validation {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for AcceptedRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PPM,
            max: DEFAULT_MAX_PPM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_digits_ignores_trailing_content() {
        assert_eq!(leading_digits("450ppm"), Some("450"));
        assert_eq!(leading_digits("12a34"), Some("12"));
        assert_eq!(leading_digits("ppm450"), None);
        assert_eq!(leading_digits(""), None);
    }

    #[test]
    fn test_clean_line_strips_tabs_and_newlines() {
        assert_eq!(clean_line("4\t5\n0 ppm"), "450ppm");
        assert_eq!(clean_line("---"), "");
    }

    #[test]
    fn test_overlong_digit_run_saturates() {
        let lines = ["99999999999999999999999999"];
        assert_eq!(extract_value(&lines).unwrap(), u64::MAX);
        assert!(!AcceptedRange::default().contains(u64::MAX));
    }
}
