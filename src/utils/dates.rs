//! Conversion of human-entered workshop times to TrainerCentral epoch milliseconds.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{TcError, TcResult};

/// Format expected from tool callers, e.g. `29-11-2025 4:30PM`
pub const WORKSHOP_TIME_FORMAT: &str = "DD-MM-YYYY HH:MMAM/PM";

/// Parse `DD-MM-YYYY HH:MMAM/PM` into a naive local date-time.
pub fn parse_workshop_time(input: &str) -> TcResult<NaiveDateTime> {
    let invalid = || {
        TcError::validation(format!(
            "'{}' is not in {} format",
            input, WORKSHOP_TIME_FORMAT
        ))
    };

    let mut parts = input.split_whitespace();
    let (date_part, time_part) = match (parts.next(), parts.next(), parts.next()) {
        (Some(d), Some(t), None) => (d, t),
        _ => return Err(invalid()),
    };

    let date = NaiveDate::parse_from_str(date_part, "%d-%m-%Y").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(&time_part.to_uppercase(), "%I:%M%p")
        .map_err(|_| invalid())?;

    Ok(date.and_time(time))
}

/// Convert `DD-MM-YYYY HH:MMAM/PM`, read in the server's local time zone,
/// to milliseconds since the Unix epoch.
pub fn workshop_time_to_millis(input: &str) -> TcResult<i64> {
    let naive = parse_workshop_time(input)?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TcError::validation(format!("'{}' does not exist in local time", input)))?;
    Ok(local.timestamp_millis())
}

/// Scheduled window of a live workshop in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ScheduleWindow {
    pub fn from_strings(start: &str, end: &str) -> TcResult<Self> {
        let start_ms = workshop_time_to_millis(start)?;
        let end_ms = workshop_time_to_millis(end)?;
        if end_ms <= start_ms {
            return Err(TcError::validation(format!(
                "end_time '{}' must be after start_time '{}'",
                end, start
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_afternoon_time() {
        let dt = parse_workshop_time("29-11-2025 4:30PM").unwrap();
        assert_eq!(dt.day(), 29);
        assert_eq!(dt.month(), 11);
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.hour(), 16);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_is_case_insensitive_for_meridiem() {
        let dt = parse_workshop_time("01-02-2026 12:05am").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 5);
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(parse_workshop_time("2025-11-29 16:30").is_err());
        assert!(parse_workshop_time("29-11-2025").is_err());
        assert!(parse_workshop_time("29-11-2025 4:30PM extra").is_err());
        assert!(matches!(
            parse_workshop_time("31-02-2025 4:30PM"),
            Err(TcError::Validation(_))
        ));
    }

    #[test]
    fn test_window_duration_in_millis() {
        let window = ScheduleWindow::from_strings("10-03-2026 10:00AM", "10-03-2026 11:30AM")
            .unwrap();
        assert_eq!(window.duration_ms(), 90 * 60 * 1000);
    }

    #[test]
    fn test_window_rejects_reversed_times() {
        let err = ScheduleWindow::from_strings("10-03-2026 11:00AM", "10-03-2026 10:00AM")
            .unwrap_err();
        assert!(matches!(err, TcError::Validation(_)));
    }
}
