// florist/src/time.rs

//! Istanbul wall-clock helpers.
//!
//! Turkey has observed a fixed UTC+03:00 offset since 2016, so a `FixedOffset`
//! is exact for every timestamp the store produces.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

const ISTANBUL_OFFSET_SECS: i32 = 3 * 3600;

pub fn istanbul() -> FixedOffset {
  FixedOffset::east_opt(ISTANBUL_OFFSET_SECS).expect("UTC+03:00 is within the valid offset range")
}

/// Local hour (0..=23) of a UTC timestamp in Istanbul.
pub fn istanbul_hour(at: DateTime<Utc>) -> u32 {
  at.with_timezone(&istanbul()).hour()
}

/// Calendar date in Istanbul for a UTC timestamp.
pub fn istanbul_date(at: DateTime<Utc>) -> NaiveDate {
  at.with_timezone(&istanbul()).date_naive()
}

/// Converts an Istanbul local date + time to UTC.
pub fn istanbul_to_utc(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
  istanbul()
    .from_local_datetime(&date.and_time(time))
    .single()
    .map(|local| local.with_timezone(&Utc))
}
