// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;
use std::str::FromStr;

use simple_error::SimpleError;

use crate::capture::{CaptureGroup, NamedCaptureGroup, TemporalCaptureGroup};
use crate::error::Result;
use super::{FailurePolicy, ParsingProfile};

#[cfg(test)] use spectral::prelude::*;

const ISO_SEVERITY: &str = r"(?i)TRACE|DEBUG|PERF|NOTE|INFO|WARN|ERROR|FATAL";
const JVM_SEVERITY: &str = r"(?i)TRACE|DEBUG|INFO|WARNING|WARN|ERROR";

lazy_static! {
  static ref CATALOG: Vec<ParsingProfile> = BuiltInProfile::values()
    .iter()
    .map(|builtin| builtin.build().unwrap())
    .collect();
}

/// The fixed set of profiles shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInProfile {
  All,
  Iso,
  IsoStrict,
  Syslog,
  JvmUnified
}

fn temporal(group: TemporalCaptureGroup, expression: &str) -> (NamedCaptureGroup, String) {
  (NamedCaptureGroup::from(group), expression.to_string())
}

fn text(name: &str, expression: &str) -> (NamedCaptureGroup, String) {
  (NamedCaptureGroup::from(CaptureGroup::of(name)), expression.to_string())
}

fn iso_groups() -> Vec<(NamedCaptureGroup, String)> {
  use TemporalCaptureGroup::*;

  vec![
    temporal(Year, r"\d{4}"),
    temporal(Month, r"\d{2}"),
    temporal(Day, r"\d{2}"),
    temporal(Hour, r"\d{2}"),
    temporal(Minute, r"\d{2}"),
    temporal(Second, r"\d{2}"),
    temporal(Fraction, r"\d{3}"),
    text("SEVERITY", ISO_SEVERITY),
  ]
}

impl BuiltInProfile {
  pub fn values() -> &'static [BuiltInProfile] {
    &[
      BuiltInProfile::All,
      BuiltInProfile::Iso,
      BuiltInProfile::IsoStrict,
      BuiltInProfile::Syslog,
      BuiltInProfile::JvmUnified
    ]
  }

  pub fn id(self) -> &'static str {
    match self {
      BuiltInProfile::All => "ALL",
      BuiltInProfile::Iso => "ISO",
      BuiltInProfile::IsoStrict => "ISO_STRICT",
      BuiltInProfile::Syslog => "SYSLOG",
      BuiltInProfile::JvmUnified => "JVM_UNIFIED"
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      BuiltInProfile::All => "All lines",
      BuiltInProfile::Iso => "ISO-like timestamps",
      BuiltInProfile::IsoStrict => "ISO-like timestamps (strict)",
      BuiltInProfile::Syslog => "Syslogs",
      BuiltInProfile::JvmUnified => "JVM unified logging"
    }
  }

  fn build(self) -> Result<ParsingProfile> {
    use TemporalCaptureGroup::*;

    let (groups, template) = match self {
      BuiltInProfile::All => (Vec::new(), ".*"),
      BuiltInProfile::Iso => (
        iso_groups(),
        r"^\[$YEAR[/-]$MONTH[/-]$DAY[-\sT]$HOUR:$MINUTE:$SECOND([.,]$FRACTION)?\]\s*(\[\s?$SEVERITY\s?\])?.*"
      ),
      BuiltInProfile::IsoStrict => (
        iso_groups(),
        r"^\[$YEAR-$MONTH-$DAY\s$HOUR:$MINUTE:$SECOND\.$FRACTION\]\s+\[$SEVERITY\s?\].*"
      ),
      BuiltInProfile::Syslog => (
        vec![
          temporal(Month, r"[A-Za-z]{3}"),
          temporal(Day, r"\d{1,2}"),
          temporal(Hour, r"\d{2}"),
          temporal(Minute, r"\d{2}"),
          temporal(Second, r"\d{2}"),
          text("HOST", r"\S+"),
          text("APP", r"[^\s\[:]+"),
          text("PID", r"\d+"),
        ],
        r"^$MONTH\s+$DAY\s+$HOUR:$MINUTE:$SECOND\s+$HOST\s+$APP(?:\[$PID\])?:\s*.*"
      ),
      BuiltInProfile::JvmUnified => (
        vec![
          temporal(ElapsedSeconds, r"\d+"),
          temporal(Fraction, r"\d{3}"),
          text("SEVERITY", JVM_SEVERITY),
          text("TAGS", r"[\w,]+"),
        ],
        r"^\[$ELAPSED[.,]$FRACTION[s]\]\[$SEVERITY\s*\]\[$TAGS\s*\].*"
      )
    };

    ParsingProfile::frozen(self.id(), self.name(), groups, template, FailurePolicy::Concat)
  }

  /// The shared, immutable profile for this entry
  pub fn profile(self) -> &'static ParsingProfile {
    &CATALOG[self as usize]
  }
}

impl fmt::Display for BuiltInProfile {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "[Built-in] {}", self.name())
  }
}

impl FromStr for BuiltInProfile {
  type Err = SimpleError;

  fn from_str(s: &str) -> std::result::Result<BuiltInProfile, SimpleError> {
    BuiltInProfile::values()
      .iter()
      .find(|builtin| builtin.id().eq_ignore_ascii_case(s.trim()))
      .copied()
      .ok_or_else(|| SimpleError::new(format!("invalid built-in profile: {}", s)))
  }
}

/// Every built-in profile, in catalog order
pub fn catalog() -> &'static [ParsingProfile] {
  &CATALOG
}

/// Finds a built-in profile by id, ignoring case
pub fn by_id(id: &str) -> Option<&'static ParsingProfile> {
  id.parse::<BuiltInProfile>().ok().map(BuiltInProfile::profile)
}
