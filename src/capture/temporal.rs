// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use chrono::Duration;

use crate::error::{Error, Result};
use crate::parser::Zone;
use super::types::canonical_name;

#[cfg(test)] use spectral::prelude::*;

/// The closed set of capture groups whose text folds into an event timestamp
/// rather than into its fields.
///
/// Each member owns a distinct slot of a `TimestampAccumulator`, so folding
/// captures in any order yields the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemporalCaptureGroup {
  Year,
  Month,
  Day,
  Hour,
  Minute,
  Second,
  /// decimal fraction of a second, e.g. `123` for 123ms
  Fraction,
  /// seconds added on top of the resolved date-time
  ElapsedSeconds,
  /// milliseconds added on top of the resolved date-time
  ElapsedMillis,
  /// replaces the configured zone for the event, e.g. `+02:00`
  Offset
}

impl TemporalCaptureGroup {
  pub const ALL: [TemporalCaptureGroup; 10] = [
    TemporalCaptureGroup::Year,
    TemporalCaptureGroup::Month,
    TemporalCaptureGroup::Day,
    TemporalCaptureGroup::Hour,
    TemporalCaptureGroup::Minute,
    TemporalCaptureGroup::Second,
    TemporalCaptureGroup::Fraction,
    TemporalCaptureGroup::ElapsedSeconds,
    TemporalCaptureGroup::ElapsedMillis,
    TemporalCaptureGroup::Offset
  ];

  /// The canonical token name, usable as `$NAME` in a line template
  pub fn name(self) -> &'static str {
    match self {
      TemporalCaptureGroup::Year => "YEAR",
      TemporalCaptureGroup::Month => "MONTH",
      TemporalCaptureGroup::Day => "DAY",
      TemporalCaptureGroup::Hour => "HOUR",
      TemporalCaptureGroup::Minute => "MINUTE",
      TemporalCaptureGroup::Second => "SECOND",
      TemporalCaptureGroup::Fraction => "FRACTION",
      TemporalCaptureGroup::ElapsedSeconds => "ELAPSED",
      TemporalCaptureGroup::ElapsedMillis => "ELAPSEDMILLIS",
      TemporalCaptureGroup::Offset => "OFFSET"
    }
  }

  /// Parses captured text into the value this group folds.
  ///
  /// Fractions parse to nanoseconds and offsets to seconds east of UTC; every
  /// other group parses to its plain integer value.
  pub fn parse_value(self, text: &str) -> Result<i64> {
    let text = text.trim();
    let parsed = match self {
      TemporalCaptureGroup::Month => parse_month(text),
      TemporalCaptureGroup::Fraction => parse_fraction(text),
      TemporalCaptureGroup::Offset => parse_offset(text),
      _ => text.parse::<i64>().ok()
    };

    parsed.ok_or_else(|| Error::InvalidTemporalValue {
      group: self.name().to_string(),
      value: text.to_string()
    })
  }

  /// Writes a parsed value into this group's slot of the accumulator
  pub fn fold(self, value: i64, acc: &mut TimestampAccumulator) {
    match self {
      TemporalCaptureGroup::Year => acc.year = Some(value),
      TemporalCaptureGroup::Month => acc.month = Some(value),
      TemporalCaptureGroup::Day => acc.day = Some(value),
      TemporalCaptureGroup::Hour => acc.hour = Some(value),
      TemporalCaptureGroup::Minute => acc.minute = Some(value),
      TemporalCaptureGroup::Second => acc.second = Some(value),
      TemporalCaptureGroup::Fraction => acc.nanos = Some(value),
      TemporalCaptureGroup::ElapsedSeconds => acc.elapsed_seconds = Some(value),
      TemporalCaptureGroup::ElapsedMillis => acc.elapsed_millis = Some(value),
      TemporalCaptureGroup::Offset => acc.offset = Some(value)
    }
  }

  pub fn fold_text(self, text: &str, acc: &mut TimestampAccumulator) -> Result<()> {
    let value = self.parse_value(text)?;
    self.fold(value, acc);

    Ok(())
  }
}

impl fmt::Display for TemporalCaptureGroup {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for TemporalCaptureGroup {
  type Err = Error;

  fn from_str(s: &str) -> Result<TemporalCaptureGroup> {
    let name = canonical_name(s);

    match name.as_str() {
      "YEAR" => Ok(TemporalCaptureGroup::Year),
      "MONTH" => Ok(TemporalCaptureGroup::Month),
      "DAY" => Ok(TemporalCaptureGroup::Day),
      "HOUR" => Ok(TemporalCaptureGroup::Hour),
      "MINUTE" => Ok(TemporalCaptureGroup::Minute),
      "SECOND" => Ok(TemporalCaptureGroup::Second),
      "FRACTION" | "MILLI" | "MILLIS" => Ok(TemporalCaptureGroup::Fraction),
      "ELAPSED" => Ok(TemporalCaptureGroup::ElapsedSeconds),
      "ELAPSEDMILLIS" => Ok(TemporalCaptureGroup::ElapsedMillis),
      "OFFSET" => Ok(TemporalCaptureGroup::Offset),
      _ => Err(Error::UnknownTemporalGroup { name })
    }
  }
}

fn parse_month(text: &str) -> Option<i64> {
  if let Ok(month) = text.parse::<i64>() {
    return Some(month);
  }

  const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december"
  ];

  let lower = text.to_lowercase();
  if lower.len() < 3 {
    return None;
  }

  MONTHS.iter()
    .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
    .map(|i| i as i64 + 1)
}

/// `"5"` -> 500ms, `"123"` -> 123ms, `"123456789123"` -> 123456789ns
fn parse_fraction(text: &str) -> Option<i64> {
  if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }

  let digits: String = text.chars().take(9).collect();
  let scale = 10i64.pow(9 - digits.len() as u32);

  digits.parse::<i64>().ok().map(|v| v * scale)
}

/// accepts `Z`, `UTC`, `GMT`, `+HH`, `+HHMM`, `+HH:MM`, optionally prefixed by
/// `UTC`/`GMT`
fn parse_offset(text: &str) -> Option<i64> {
  let upper = text.to_ascii_uppercase();
  let mut rest = upper.as_str();

  if rest == "Z" || rest == "UTC" || rest == "GMT" {
    return Some(0);
  }

  if rest.starts_with("UTC") || rest.starts_with("GMT") {
    rest = &rest[3..];
  }

  let sign = match rest.chars().next() {
    Some('+') => 1,
    Some('-') => -1,
    _ => return None
  };

  let digits: String = rest[1..].chars().filter(|c| *c != ':').collect();
  if !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }

  let (hours, minutes) = match digits.len() {
    1 | 2 => (digits.parse::<i64>().ok()?, 0),
    4 => (digits[..2].parse::<i64>().ok()?, digits[2..].parse::<i64>().ok()?),
    _ => return None
  };

  if minutes >= 60 {
    return None;
  }

  Some(sign * (hours * 3600 + minutes * 60))
}

/// Collects temporal captures for a single line until they are resolved into
/// a timestamp.
///
/// Slots left empty default to the matching component of the anchor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampAccumulator {
  year: Option<i64>,
  month: Option<i64>,
  day: Option<i64>,
  hour: Option<i64>,
  minute: Option<i64>,
  second: Option<i64>,
  nanos: Option<i64>,
  elapsed_seconds: Option<i64>,
  elapsed_millis: Option<i64>,
  offset: Option<i64>
}

fn component<T: TryFrom<i64>>(slot: Option<i64>, default: T) -> Option<T> {
  match slot {
    Some(value) => T::try_from(value).ok(),
    None => Some(default)
  }
}

impl TimestampAccumulator {
  pub fn new() -> TimestampAccumulator {
    TimestampAccumulator::default()
  }

  /// Resolves the accumulated fields against `anchor`, interpreted in `zone`
  /// unless an offset was captured. Elapsed seconds and milliseconds are added
  /// to the resolved instant; with an epoch anchor that gives Unix time only
  /// when the zone is UTC, elsewhere the count starts at local midnight.
  ///
  /// Returns None if the fields don't form a valid date-time (e.g. month 13,
  /// February 30th, or an offset beyond a day).
  pub fn resolve(
    &self, anchor: &NaiveDateTime, zone: &Zone
  ) -> Option<DateTime<FixedOffset>> {
    let date = NaiveDate::from_ymd_opt(
      component(self.year, anchor.year())?,
      component(self.month, anchor.month())?,
      component(self.day, anchor.day())?
    )?;

    let time = NaiveTime::from_hms_nano_opt(
      component(self.hour, anchor.hour())?,
      component(self.minute, anchor.minute())?,
      component(self.second, anchor.second())?,
      component(self.nanos, anchor.nanosecond())?
    )?;

    let elapsed = Duration::try_seconds(self.elapsed_seconds.unwrap_or(0))?
      .checked_add(&Duration::try_milliseconds(self.elapsed_millis.unwrap_or(0))?)?;

    let zone = match self.offset {
      Some(seconds) => Zone::Fixed(FixedOffset::east_opt(i32::try_from(seconds).ok()?)?),
      None => *zone
    };

    // elapsed time is real time after the resolved start
    let start = zone.resolve_local(&date.and_time(time))?;
    let instant = start.with_timezone(&Utc).checked_add_signed(elapsed)?;

    Some(zone.localize(&instant))
  }
}
