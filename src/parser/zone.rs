// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use chrono::Duration;
use chrono_tz::Tz;
use simple_error::SimpleError;

use crate::capture::TemporalCaptureGroup;

#[cfg(test)] use spectral::prelude::*;

/// The time zone used to interpret the local date-times a profile captures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
  Named(Tz),
  Fixed(FixedOffset)
}

fn resolve_in<Z: TimeZone>(
  zone: &Z, local: &NaiveDateTime
) -> Option<DateTime<FixedOffset>> {
  // local times inside a DST gap don't exist; shift them past the gap
  let resolved = zone.from_local_datetime(local).earliest().or_else(|| {
    local.checked_add_signed(Duration::hours(1))
      .and_then(|shifted| zone.from_local_datetime(&shifted).earliest())
  })?;

  Some(resolved.with_timezone(&resolved.offset().fix()))
}

impl Zone {
  pub fn utc() -> Zone {
    Zone::Named(Tz::UTC)
  }

  /// Attaches this zone to a local date-time; ambiguous times resolve to the
  /// earliest instant
  pub fn resolve_local(&self, local: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match self {
      Zone::Named(tz) => resolve_in(tz, local),
      Zone::Fixed(offset) => resolve_in(offset, local)
    }
  }

  /// The instant `utc` as seen in this zone
  pub fn localize(&self, utc: &DateTime<Utc>) -> DateTime<FixedOffset> {
    match self {
      Zone::Named(tz) => {
        let local = utc.with_timezone(tz);
        local.with_timezone(&local.offset().fix())
      },
      Zone::Fixed(offset) => utc.with_timezone(offset)
    }
  }

  /// The current wall-clock time in this zone
  pub fn now(&self) -> NaiveDateTime {
    self.localize(&Utc::now()).naive_local()
  }
}

impl Default for Zone {
  fn default() -> Zone {
    Zone::utc()
  }
}

impl fmt::Display for Zone {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Zone::Named(tz) => f.write_str(tz.name()),
      Zone::Fixed(offset) => write!(f, "{}", offset)
    }
  }
}

impl FromStr for Zone {
  type Err = SimpleError;

  fn from_str(s: &str) -> Result<Zone, SimpleError> {
    if let Ok(tz) = s.parse::<Tz>() {
      return Ok(Zone::Named(tz));
    }

    TemporalCaptureGroup::Offset.parse_value(s).ok()
      .and_then(|seconds| i32::try_from(seconds).ok())
      .and_then(FixedOffset::east_opt)
      .map(Zone::Fixed)
      .ok_or_else(|| SimpleError::new(format!("invalid time zone: {}", s)))
  }
}
