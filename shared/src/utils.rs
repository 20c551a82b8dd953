// Small helpers shared by the engine and any client tooling.
use chrono::{DateTime, Utc};

/// Converts a client timestamp (unix epoch milliseconds) into a UTC datetime.
pub fn datetime_from_millis(ts_millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_datetime_from_millis() {
        let dt = datetime_from_millis(1_735_582_800_000).unwrap(); // 2024-12-30T18:20:00Z
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 12);
        assert_eq!(dt.day(), 30);
        assert_eq!(dt.hour(), 18);
        assert_eq!(dt.minute(), 20);
    }

    #[test]
    fn test_datetime_out_of_range() {
        assert!(datetime_from_millis(i64::MAX).is_none());
    }
}
