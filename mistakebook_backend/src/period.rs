//! Aggregation periods and the local-calendar arithmetic behind them.
//!
//! Everything here works on the server's local time zone: a "day" is a local
//! calendar day, and the end of a period is always the last millisecond of today.

use super::*;
use chrono::{Datelike, DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
    Total,
}

impl Default for Period {
    fn default() -> Period {
        Period::Week
    }
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::Total => "total",
        }
    }

    /// First local day of the period, `None` for the unbounded `Total`.
    pub fn first_day(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Period::Week => Some(today - Duration::days(i64::from(today.weekday().num_days_from_monday()))),
            Period::Month => Some(today.with_day(1).unwrap_or(today)),
            Period::Year => Some(today.with_ordinal(1).unwrap_or(today)),
            Period::Total => None,
        }
    }

    pub fn range(&self, today: NaiveDate) -> DateRange {
        let start = match self.first_day(today) {
            Some(day) => local_to_utc(start_of_day(day)),
            None => epoch(),
        };
        DateRange { start, end: local_to_utc(end_of_day(today)) }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Period> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "total" => Ok(Period::Total),
            other => Err(ErrorKind::InvalidInput(format!("unknown period {:?}", other)).into()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn days(first: NaiveDate, last: NaiveDate) -> DateRange {
        DateRange {
            start: local_to_utc(start_of_day(first)),
            end: local_to_utc(end_of_day(last)),
        }
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        *time >= self.start && *time <= self.end
    }
}

pub fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms(0, 0, 0)
}

pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli(23, 59, 59, 999)
}

pub fn epoch() -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDate::from_ymd(1970, 1, 1).and_hms(0, 0, 0))
}

/// Interprets a local wall-clock time; on a DST gap, falls back to reading it as UTC.
pub fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    Local.from_local_datetime(&local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

pub fn local_day(time: &DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&Local).naive_local().date()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first = NaiveDate::from_ymd(year, month, 1);
    let next = NaiveDate::from_ymd(next_year, next_month, 1);
    next.signed_duration_since(first).num_days() as u32
}

/// The `n` days ending with (and including) `last`, oldest first.
pub fn trailing_days(last: NaiveDate, n: i64) -> Vec<NaiveDate> {
    (0..n).rev().map(|back| last - Duration::days(back)).collect()
}

#[test]
fn test_period_parsing() {
    assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
    assert_eq!("total".parse::<Period>().unwrap(), Period::Total);
    assert!("decade".parse::<Period>().is_err());
    assert_eq!(Period::default(), Period::Week);
    assert_eq!(Period::Month.to_string(), "month");
}

#[test]
fn test_first_days() {
    // 2026-10-16 is a Friday
    let today = NaiveDate::from_ymd(2026, 10, 16);
    assert_eq!(Period::Week.first_day(today), Some(NaiveDate::from_ymd(2026, 10, 12)));
    assert_eq!(Period::Month.first_day(today), Some(NaiveDate::from_ymd(2026, 10, 1)));
    assert_eq!(Period::Year.first_day(today), Some(NaiveDate::from_ymd(2026, 1, 1)));
    assert_eq!(Period::Total.first_day(today), None);

    let monday = NaiveDate::from_ymd(2026, 10, 12);
    assert_eq!(Period::Week.first_day(monday), Some(monday));
    let sunday = NaiveDate::from_ymd(2026, 10, 18);
    assert_eq!(Period::Week.first_day(sunday), Some(monday));
}

#[test]
fn test_range_covers_whole_today() {
    let today = NaiveDate::from_ymd(2026, 10, 16);
    let range = Period::Week.range(today);
    let late_today = local_to_utc(today.and_hms(23, 59, 59));
    let tomorrow = local_to_utc(NaiveDate::from_ymd(2026, 10, 17).and_hms(0, 0, 0));
    let monday_morning = local_to_utc(NaiveDate::from_ymd(2026, 10, 12).and_hms(0, 0, 0));
    let sunday_night = local_to_utc(NaiveDate::from_ymd(2026, 10, 11).and_hms(23, 59, 59));
    assert!(range.contains(&late_today));
    assert!(range.contains(&monday_morning));
    assert!(!range.contains(&tomorrow));
    assert!(!range.contains(&sunday_night));

    let total = Period::Total.range(today);
    assert_eq!(total.start, epoch());
    assert!(total.contains(&monday_morning));
}

#[test]
fn test_days_in_month() {
    assert_eq!(days_in_month(2026, 2), 28);
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2026, 10), 31);
    assert_eq!(days_in_month(2026, 12), 31);
    assert_eq!(days_in_month(2026, 11), 30);
}

#[test]
fn test_trailing_days() {
    let today = NaiveDate::from_ymd(2026, 3, 2);
    let days = trailing_days(today, 3);
    assert_eq!(days, vec![NaiveDate::from_ymd(2026, 2, 28),
                          NaiveDate::from_ymd(2026, 3, 1),
                          today]);
}

#[test]
fn test_local_day_roundtrip() {
    let noon = NaiveDate::from_ymd(2026, 10, 16).and_hms(12, 0, 0);
    assert_eq!(local_day(&local_to_utc(noon)), NaiveDate::from_ymd(2026, 10, 16));
}
