//! Still timestamps and elapsed-time utilities.
//!
//! Every still is named after the UTC instant it was captured, using a
//! fixed-width format so that lexical filename order equals chronological
//! order. Colons are replaced with underscores for filesystem safety:
//!
//! ```text
//! 2024-04-27T20_41_44.755476.jpg
//! ```

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

use crate::error::{LeavenError, LeavenResult};

/// Format used when writing still filenames (always six fractional digits).
pub const STILL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S%.6f";

/// Format used when parsing still filenames; accepts any fractional width.
const STILL_TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H_%M_%S%.f";

/// Extension of captured stills.
pub const STILL_EXTENSION: &str = "jpg";

/// Human-readable format used in peak alerts, e.g. `Saturday, April 27 @ 08:41 PM`.
pub const HUMAN_READABLE_FORMAT: &str = "%A, %B %d @ %I:%M %p";

/// Build the filename for a still captured at `captured_at` (UTC).
pub fn still_filename(captured_at: &NaiveDateTime) -> String {
    format!(
        "{}.{STILL_EXTENSION}",
        captured_at.format(STILL_TIMESTAMP_FORMAT)
    )
}

/// Filename for a still captured now.
pub fn still_filename_now() -> String {
    still_filename(&Utc::now().naive_utc())
}

/// Parse the capture timestamp out of a still filename or path.
///
/// Directory components and the extension are ignored.
pub fn timestamp_from_filename(filename: &str) -> LeavenResult<NaiveDateTime> {
    let base = filename
        .rfind(['/', '\\'])
        .map_or(filename, |idx| &filename[idx + 1..]);
    let stem = base.rfind('.').map_or(base, |idx| &base[..idx]);

    NaiveDateTime::parse_from_str(stem, STILL_TIMESTAMP_PARSE_FORMAT).map_err(|e| {
        tracing::warn!(value = stem, error = %e, "Invalid still timestamp");
        LeavenError::timestamp(stem)
    })
}

/// Whole minutes elapsed between two capture timestamps (truncated toward zero).
pub fn elapsed_minutes(start: &NaiveDateTime, current: &NaiveDateTime) -> i64 {
    (*current - *start).num_seconds() / 60
}

/// Format the time between two capture timestamps as `hh:mm:ss`.
pub fn format_elapsed(start: &NaiveDateTime, current: &NaiveDateTime) -> String {
    let total = (*current - *start).num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
}

/// Format a wall-clock timestamp for humans as given.
pub fn format_human(timestamp: &NaiveDateTime) -> String {
    timestamp.format(HUMAN_READABLE_FORMAT).to_string()
}

/// Format a UTC still timestamp for humans in the local timezone.
pub fn human_readable_local(utc: &NaiveDateTime) -> String {
    format_human(&Local.from_utc_datetime(utc).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 27)
            .unwrap()
            .and_hms_micro_opt(20, 41, 44, 755_476)
            .unwrap()
    }

    #[test]
    fn test_still_filename_format() {
        assert_eq!(still_filename(&sample()), "2024-04-27T20_41_44.755476.jpg");
    }

    #[test]
    fn test_filename_timestamp_round_trip_keeps_microseconds() {
        let ts = sample();
        let parsed = timestamp_from_filename(&still_filename(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_zero_microseconds_are_still_fixed_width() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let name = still_filename(&ts);
        assert_eq!(name, "2024-01-02T03_04_05.000000.jpg");
        assert_eq!(timestamp_from_filename(&name).unwrap(), ts);
    }

    #[test]
    fn test_parse_ignores_directories() {
        let parsed = timestamp_from_filename("stills/2024-04-27T20_41_44.755476.jpg").unwrap();
        assert_eq!(parsed, sample());
        let parsed = timestamp_from_filename("C:\\stills\\2024-04-27T20_41_44.755476.jpg").unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        let err = timestamp_from_filename("holiday-photo.jpg").unwrap_err();
        assert!(matches!(err, LeavenError::Timestamp { ref value } if value == "holiday-photo"));
    }

    #[test]
    fn test_elapsed_minutes_truncates() {
        let start = sample();
        let later = start + chrono::Duration::seconds(4 * 3600 + 59);
        assert_eq!(elapsed_minutes(&start, &later), 240);
    }

    #[test]
    fn test_format_elapsed() {
        let start = sample();
        let later = start + chrono::Duration::seconds(5 * 3600 + 7 * 60 + 9);
        assert_eq!(format_elapsed(&start, &later), "05:07:09");
        assert_eq!(format_elapsed(&later, &start), "-05:07:09");
    }

    #[test]
    fn test_format_human() {
        assert_eq!(format_human(&sample()), "Saturday, April 27 @ 08:41 PM");
    }

    #[test]
    fn test_human_readable_local_uses_local_wall_clock() {
        let local = Local.from_utc_datetime(&sample()).naive_local();
        assert_eq!(human_readable_local(&sample()), format_human(&local));
    }
}
