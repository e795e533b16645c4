// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use chrono::prelude::*;
use encoding_rs::Encoding;
use regex::Regex;
use simple_error::SimpleError;
use tracing::debug;

use crate::capture::{NamedCaptureGroup, TimestampAccumulator};
use crate::error::Result;
use crate::profile::ParsingProfile;
use super::event::{ParsedEvent, AD_HOC_SEQUENCE};
use super::stream::EventParser;
use super::zone::Zone;

#[cfg(test)] use spectral::prelude::*;

/// Supplies every temporal field a profile doesn't capture itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalAnchor {
  /// 1970-01-01T00:00:00
  Epoch,

  /// midnight of the current day in the format's zone
  Today,

  /// the current time in the format's zone
  Now,

  At(NaiveDateTime)
}

impl TemporalAnchor {
  /// Pins the anchor to a concrete local date-time. Dynamic anchors read the
  /// clock here, so callers resolve once per parsing session.
  pub fn resolve(&self, zone: &Zone) -> NaiveDateTime {
    match self {
      TemporalAnchor::Epoch => NaiveDateTime::default(),
      TemporalAnchor::Today => zone.now().date().and_time(NaiveTime::MIN),
      TemporalAnchor::Now => zone.now(),
      TemporalAnchor::At(datetime) => *datetime
    }
  }
}

impl Default for TemporalAnchor {
  fn default() -> TemporalAnchor {
    TemporalAnchor::Epoch
  }
}

impl fmt::Display for TemporalAnchor {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TemporalAnchor::Epoch => f.write_str("epoch"),
      TemporalAnchor::Today => f.write_str("today"),
      TemporalAnchor::Now => f.write_str("now"),
      TemporalAnchor::At(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.f"))
    }
  }
}

impl FromStr for TemporalAnchor {
  type Err = SimpleError;

  fn from_str(s: &str) -> std::result::Result<TemporalAnchor, SimpleError> {
    match s.trim().to_lowercase().as_str() {
      "epoch" => return Ok(TemporalAnchor::Epoch),
      "today" => return Ok(TemporalAnchor::Today),
      "now" => return Ok(TemporalAnchor::Now),
      _ => ()
    };

    let s = s.trim();
    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
      if let Ok(datetime) = NaiveDateTime::parse_from_str(s, fmt) {
        return Ok(TemporalAnchor::At(datetime));
      }
    }

    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
      Ok(date) => Ok(TemporalAnchor::At(date.and_time(NaiveTime::MIN))),
      Err(_) => Err(SimpleError::new(format!("invalid temporal anchor: {}", s)))
    }
  }
}

/// A profile's compiled pattern bound to a zone and a resolved anchor; turns
/// single lines into events
#[derive(Debug, Clone)]
pub struct EventMatcher {
  pattern: Regex,
  groups: Vec<NamedCaptureGroup>,
  zone: Zone,
  anchor: NaiveDateTime
}

impl EventMatcher {
  pub fn new(
    pattern: Regex, groups: Vec<NamedCaptureGroup>, zone: Zone, anchor: NaiveDateTime
  ) -> EventMatcher {
    EventMatcher { pattern, groups, zone, anchor }
  }

  pub fn anchor(&self) -> &NaiveDateTime {
    &self.anchor
  }

  /// Matches a line, returning None if the pattern doesn't match or the
  /// captured temporal fields don't form a valid timestamp
  pub fn parse(&self, sequence: i64, line: &str) -> Option<ParsedEvent> {
    let caps = self.pattern.captures(line)?;

    let mut acc = TimestampAccumulator::new();
    let mut fields = HashMap::new();

    for group in &self.groups {
      let text = match caps.name(group.name()) {
        Some(m) if !m.as_str().trim().is_empty() => m.as_str(),
        _ => continue
      };

      match group {
        NamedCaptureGroup::Temporal(temporal) => {
          if let Err(e) = temporal.fold_text(text, &mut acc) {
            debug!(sequence, error = %e, "discarding match with invalid temporal capture");
            return None;
          }
        },
        NamedCaptureGroup::Text(group) => {
          fields.insert(group.name().to_string(), text.to_string());
        }
      }
    }

    let timestamp = match acc.resolve(&self.anchor, &self.zone) {
      Some(timestamp) => timestamp,
      None => {
        debug!(sequence, "discarding match with an unresolvable timestamp");
        return None;
      }
    };

    Some(ParsedEvent::new(sequence, timestamp, line.to_string(), fields))
  }
}

/// Binds a parsing profile to a character encoding, a time zone and a
/// temporal anchor
#[derive(Debug, Clone)]
pub struct EventFormat {
  profile: ParsingProfile,
  zone: Zone,
  encoding: &'static Encoding,
  anchor: TemporalAnchor
}

impl EventFormat {
  pub fn new(
    profile: ParsingProfile,
    zone: Zone,
    encoding: &'static Encoding,
    anchor: TemporalAnchor
  ) -> EventFormat {
    EventFormat { profile, zone, encoding, anchor }
  }

  pub fn profile(&self) -> &ParsingProfile {
    &self.profile
  }

  pub fn zone(&self) -> &Zone {
    &self.zone
  }

  pub fn encoding(&self) -> &'static Encoding {
    self.encoding
  }

  pub fn anchor(&self) -> &TemporalAnchor {
    &self.anchor
  }

  /// Reads the profile's pattern and pins the anchor
  pub fn matcher(&self) -> Result<EventMatcher> {
    let groups = self.profile.capture_groups().iter()
      .map(|(group, _)| group.clone())
      .collect();

    Ok(EventMatcher::new(
      self.profile.pattern()?,
      groups,
      self.zone,
      self.anchor.resolve(&self.zone)
    ))
  }

  /// Creates a parser over `input`, which it owns until exhausted or closed
  pub fn parse<R: Read>(&self, input: R) -> Result<EventParser<R>> {
    let matcher = self.matcher()?;

    debug!(
      profile = self.profile.id(),
      encoding = self.encoding.name(),
      zone = %self.zone,
      "starting event parser"
    );

    Ok(EventParser::new(
      input,
      self.encoding,
      matcher,
      self.profile.failure_policy()
    ))
  }

  /// Parses a single line outside of any stream; the event's sequence is
  /// `AD_HOC_SEQUENCE`
  pub fn parse_line(&self, text: &str) -> Result<Option<ParsedEvent>> {
    Ok(self.matcher()?.parse(AD_HOC_SEQUENCE, text))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use encoding_rs::UTF_8;

  use crate::capture::TemporalCaptureGroup;
  use crate::profile::{BuiltInProfile, FailurePolicy};

  fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 2, 3).unwrap().and_hms_opt(4, 5, 6).unwrap()
  }

  fn format(profile: ParsingProfile) -> EventFormat {
    EventFormat::new(profile, Zone::utc(), UTF_8, TemporalAnchor::At(anchor()))
  }

  fn ymdhms_profile(order: &[TemporalCaptureGroup]) -> ParsingProfile {
    let groups = order.iter()
      .map(|g| (NamedCaptureGroup::from(*g), r"\d+".to_string()))
      .collect();

    ParsingProfile::frozen(
      "ymdhms", "ymdhms", groups,
      "^$YEAR $MONTH $DAY $HOUR $MINUTE $SECOND$",
      FailurePolicy::Concat
    ).unwrap()
  }

  #[test]
  fn test_anchor_from_str() {
    assert_that!("epoch".parse::<TemporalAnchor>()).is_ok_containing(TemporalAnchor::Epoch);
    assert_that!("Today".parse::<TemporalAnchor>()).is_ok_containing(TemporalAnchor::Today);
    assert_that!("2001-02-03T04:05:06".parse::<TemporalAnchor>())
      .is_ok_containing(TemporalAnchor::At(anchor()));
    assert_that!("2001-02-03 04:05:06".parse::<TemporalAnchor>())
      .is_ok_containing(TemporalAnchor::At(anchor()));
    assert_that!("2001-02-03".parse::<TemporalAnchor>()).is_ok_containing(
      TemporalAnchor::At(NaiveDate::from_ymd_opt(2001, 2, 3).unwrap().and_hms_opt(0, 0, 0).unwrap())
    );
    assert_that!("yesterday".parse::<TemporalAnchor>()).is_err();
  }

  #[test]
  fn test_anchor_resolution() {
    let zone = Zone::utc();
    assert_that!(TemporalAnchor::Epoch.resolve(&zone)).is_equal_to(
      NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    );

    let today = TemporalAnchor::Today.resolve(&zone);
    assert_that!(today.time()).is_equal_to(NaiveTime::MIN);
    assert_that!(today.date()).is_equal_to(zone.now().date());
  }

  #[test]
  fn test_parse_line_verbatim() {
    let format = format(BuiltInProfile::Iso.profile().clone());
    let line = "[2020-11-13 19:59:22.627] [INFO ] Hello world!";
    let event = format.parse_line(line).unwrap().unwrap();

    assert_that!(event.text()).is_equal_to(line);
    assert_that!(event.sequence()).is_equal_to(AD_HOC_SEQUENCE);
  }

  #[test]
  fn test_parse_line_no_match() {
    let format = format(BuiltInProfile::Iso.profile().clone());

    assert_that!(format.parse_line("hello")).is_ok_containing(None);
  }

  #[test]
  fn test_temporal_order_independence() {
    let forward = ymdhms_profile(&[
      TemporalCaptureGroup::Year,
      TemporalCaptureGroup::Month,
      TemporalCaptureGroup::Day,
      TemporalCaptureGroup::Hour,
      TemporalCaptureGroup::Minute,
      TemporalCaptureGroup::Second,
    ]);
    let shuffled = ymdhms_profile(&[
      TemporalCaptureGroup::Minute,
      TemporalCaptureGroup::Day,
      TemporalCaptureGroup::Second,
      TemporalCaptureGroup::Year,
      TemporalCaptureGroup::Hour,
      TemporalCaptureGroup::Month,
    ]);

    let expected = FixedOffset::east_opt(0).unwrap()
      .with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    for profile in vec![forward, shuffled] {
      let event = format(profile).parse_line("2024 01 02 03 04 05").unwrap().unwrap();
      assert_that!(*event.timestamp()).is_equal_to(expected);
    }
  }

  #[test]
  fn test_configured_zone() {
    let profile = ymdhms_profile(&[
      TemporalCaptureGroup::Year,
      TemporalCaptureGroup::Month,
      TemporalCaptureGroup::Day,
      TemporalCaptureGroup::Hour,
      TemporalCaptureGroup::Minute,
      TemporalCaptureGroup::Second,
    ]);
    let format = EventFormat::new(
      profile, "Asia/Tokyo".parse().unwrap(), UTF_8, TemporalAnchor::Epoch
    );
    let event = format.parse_line("2024 01 02 03 04 05").unwrap().unwrap();

    assert_that!(event.timestamp().offset().local_minus_utc()).is_equal_to(9 * 3600);
    assert_that!(event.timestamp().naive_utc().hour()).is_equal_to(18);
  }

  #[test]
  fn test_missing_fields_use_anchor() {
    let format = format(BuiltInProfile::Syslog.profile().clone());
    let event = format.parse_line("May  1 10:20:30 box sshd[42]: Accepted").unwrap().unwrap();

    assert_that!(event.timestamp().year()).is_equal_to(2001);
    assert_that!(event.timestamp().month()).is_equal_to(5);
    assert_that!(event.field("HOST")).is_equal_to(Some("box"));
  }

  #[test]
  fn test_invalid_timestamp_is_no_match() {
    let format = format(BuiltInProfile::Iso.profile().clone());

    assert_that!(format.parse_line("[2020-02-31 10:00:00] [INFO] nope")).is_ok_containing(None);
  }

  #[test]
  fn test_elapsed_out_of_range_is_no_match() {
    let profile = ParsingProfile::frozen(
      "uptime", "uptime",
      vec![(NamedCaptureGroup::from(TemporalCaptureGroup::ElapsedMillis), r"-?\d+".to_string())],
      "^$ELAPSEDMILLIS$",
      FailurePolicy::Concat
    ).unwrap();
    let format = format(profile);

    assert_that!(format.parse_line("-9223372036854775808")).is_ok_containing(None);
    assert_that!(format.parse_line("1500").unwrap().is_some()).is_true();
  }
}
