//! UTC offset resolution and final ordering.
//!
//! Offsets are resolved against a single fixed instant so that a run is
//! reproducible regardless of when it happens and of daylight-saving changes
//! between runs. Names the timezone database does not know resolve to UTC.

use chrono::{DateTime, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::cmp::Ordering;

use crate::record::CityRecord;

/// The instant every timezone offset is resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceInstant(DateTime<Utc>);

impl ReferenceInstant {
    /// Midnight UTC on January 1 of `year`.
    ///
    /// Returns `None` for years chrono cannot represent.
    pub fn start_of_year(year: i32) -> Option<Self> {
        let midnight = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        Some(Self(Utc.from_utc_datetime(&midnight)))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Outcome of resolving a timezone name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedOffset {
    /// The timezone database knows the name.
    Known(i32),
    /// Unknown or empty name, treated as UTC.
    Fallback,
}

impl ResolvedOffset {
    pub fn minutes(self) -> i32 {
        match self {
            ResolvedOffset::Known(minutes) => minutes,
            ResolvedOffset::Fallback => 0,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, ResolvedOffset::Fallback)
    }
}

/// Resolve a timezone name to its offset from UTC at `instant`.
pub fn resolve_offset(timezone: &str, instant: ReferenceInstant) -> ResolvedOffset {
    match timezone.parse::<Tz>() {
        Ok(tz) => {
            let offset_secs = tz
                .offset_from_utc_datetime(&instant.0.naive_utc())
                .fix()
                .local_minus_utc();
            ResolvedOffset::Known(offset_secs / 60)
        }
        Err(_) => ResolvedOffset::Fallback,
    }
}

/// Offset from UTC in minutes at `instant`; unresolvable names yield `0`.
///
/// # Examples
/// ```
/// use cityindex::offset::{ReferenceInstant, resolve_offset_minutes};
/// let instant = ReferenceInstant::start_of_year(2025).unwrap();
/// assert_eq!(resolve_offset_minutes("America/New_York", instant), -300);
/// assert_eq!(resolve_offset_minutes("Asia/Kolkata", instant), 330);
/// assert_eq!(resolve_offset_minutes("Not/AZone", instant), 0);
/// ```
pub fn resolve_offset_minutes(timezone: &str, instant: ReferenceInstant) -> i32 {
    resolve_offset(timezone, instant).minutes()
}

/// Ordering used for the final index: westernmost offset first, then city
/// name compared case-insensitively.
pub fn compare_records(a: &CityRecord, b: &CityRecord) -> Ordering {
    a.offset_minutes
        .cmp(&b.offset_minutes)
        .then_with(|| a.city.to_lowercase().cmp(&b.city.to_lowercase()))
}

/// Sort records by offset, then by lowercased city name.
pub fn sort_records(records: &mut [CityRecord]) {
    records.sort_by_cached_key(|record| (record.offset_minutes, record.city.to_lowercase()));
}
