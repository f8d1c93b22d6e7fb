use chrono::{DateTime, Datelike, Timelike, Utc};
use std::time::Duration;

#[inline]
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

#[inline]
pub fn minutes(n: i64) -> Duration {
    Duration::from_secs((n * 60).max(0) as u64)
}

#[inline]
pub fn hours(n: i64) -> Duration {
    Duration::from_secs((n * 3600).max(0) as u64)
}

/// truncate a timestamp down to the start of its hour (used to enumerate candidate forecast cycles)
pub fn full_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

pub fn fmt_yyyymmdd(dt: DateTime<Utc>) -> String {
    format!("{:04}{:02}{:02}", dt.year(), dt.month(), dt.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn full_hour_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 7, 28, 13, 42, 7).unwrap();
        let fh = full_hour(dt);
        assert_eq!(fh.minute(), 0);
        assert_eq!(fh.second(), 0);
        assert_eq!(fh.hour(), 13);
    }
}
