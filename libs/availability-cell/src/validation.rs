use std::collections::HashSet;

use chrono::{Days, NaiveDate, NaiveTime, Timelike};

use shared_models::error::PortalError;

use crate::models::TimeRange;

/// Minutes since midnight for a zero-padded 24-hour `HH:MM` value.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let bytes = value.as_bytes();
    if bytes.len() != 5
        || bytes[2] != b':'
        || !bytes[..2].iter().all(u8::is_ascii_digit)
        || !bytes[3..].iter().all(u8::is_ascii_digit)
    {
        return None;
    }
    let time = NaiveTime::parse_from_str(value, "%H:%M").ok()?;
    Some(time.hour() * 60 + time.minute())
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Returns `(start, end)` in minutes when the range is usable.
pub fn validate_range(range: &TimeRange) -> Result<(u32, u32), PortalError> {
    let start = parse_hhmm(&range.start)
        .ok_or_else(|| PortalError::validation(format!("'{}' is not a valid start time (HH:MM)", range.start)))?;
    let end = parse_hhmm(&range.end)
        .ok_or_else(|| PortalError::validation(format!("'{}' is not a valid end time (HH:MM)", range.end)))?;

    if end <= start {
        return Err(PortalError::validation(format!(
            "End time must be after start time ({})",
            range
        )));
    }

    Ok((start, end))
}

pub fn is_valid_range(range: &TimeRange) -> bool {
    validate_range(range).is_ok()
}

/// Exact `(start, end)` pair equality; overlapping ranges are not duplicates.
pub fn has_duplicates<'a, I>(ranges: I) -> bool
where
    I: IntoIterator<Item = &'a TimeRange>,
{
    let mut seen = HashSet::new();
    ranges
        .into_iter()
        .any(|range| !seen.insert((range.start.as_str(), range.end.as_str())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodayFit {
    Upcoming,
    /// Started already, not yet over.
    Partial,
    Elapsed,
}

pub fn classify_for_today(start: u32, end: u32, now: u32) -> TodayFit {
    if end <= now {
        TodayFit::Elapsed
    } else if start < now {
        TodayFit::Partial
    } else {
        TodayFit::Upcoming
    }
}

/// The `days` dates following `base`, without any that precede `today`.
pub fn bulk_target_dates(base: NaiveDate, days: u32, today: NaiveDate) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .filter_map(|offset| base.checked_add_days(Days::new(offset)))
        .filter(|date| *date >= today)
        .collect()
}
