//! # Reading Log Tests
//!
//! Tests for log line formatting, parsing and the append-only file sink.

mod common;

#[cfg(test)]
mod tests {
    use super::common::at;
    use chrono::NaiveDate;
    use co2_monitor::reading::{ParseReadingError, Reading, ReadingLog};
    use std::fs;

    #[test]
    fn test_log_line_format() {
        let reading = Reading::new(at(9, 30, 5), 450);
        assert_eq!(reading.to_log_line(), "2024-03-01 09:30:05,450\n");
    }

    #[test]
    fn test_log_line_round_trip() {
        let reading = Reading::new(at(23, 59, 59), 4999);
        let parsed: Reading = reading.to_log_line().parse().unwrap();

        assert_eq!(parsed, reading);
        assert_eq!(parsed.timestamp(), at(23, 59, 59));
        assert_eq!(parsed.value(), 4999);
    }

    #[test]
    fn test_subsecond_precision_is_dropped() {
        let precise = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 750)
            .unwrap();
        let reading = Reading::new(precise, 800);

        assert_eq!(reading.timestamp(), at(12, 0, 0));
        assert_eq!(reading.to_log_line().parse::<Reading>().unwrap(), reading);
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(matches!(
            "2024-03-01 09:30:05 450".parse::<Reading>(),
            Err(ParseReadingError::MissingSeparator(_))
        ));
        assert!(matches!(
            "yesterday,450".parse::<Reading>(),
            Err(ParseReadingError::Timestamp(_))
        ));
        assert!(matches!(
            "2024-03-01 09:30:05,lots".parse::<Reading>(),
            Err(ParseReadingError::Value(_))
        ));
    }

    #[test]
    fn test_log_file_is_only_extended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co2.csv");
        fs::write(&path, "2024-02-29 23:50:00,510\n").unwrap();

        {
            let mut log = ReadingLog::open(&path).unwrap();
            log.append(&Reading::new(at(0, 0, 0), 520)).unwrap();
            log.append(&Reading::new(at(0, 10, 0), 530)).unwrap();
            assert_eq!(log.appended(), 2);

            // Flushed per entry: visible before the handle is closed.
            let contents = fs::read_to_string(&path).unwrap();
            assert_eq!(contents.lines().count(), 3);
        }

        let mut log = ReadingLog::open(&path).unwrap();
        log.append(&Reading::new(at(0, 20, 0), 540)).unwrap();
        log.into_inner().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-02-29 23:50:00,510\n\
             2024-03-01 00:00:00,520\n\
             2024-03-01 00:10:00,530\n\
             2024-03-01 00:20:00,540\n"
        );
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("co2.csv");
        assert!(ReadingLog::open(&path).is_err());
    }
}
