// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};

#[cfg(test)] use spectral::prelude::*;

/// Sequence number of events parsed outside of a stream
pub const AD_HOC_SEQUENCE: i64 = -1;

/// Always writes an explicit offset, so UTC comes out as `+00:00` and not `Z`
fn ser_rfc3339<S>(timestamp: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.serialize_str(&timestamp.to_rfc3339())
}

/// A single event produced by a parsing profile.
///
/// Events are never modified once built: absorbing a continuation line
/// produces a new event. Each absorption copies the accumulated text, so very
/// long multi-line events cost quadratic time to assemble.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParsedEvent {
  /// 1-based line number the event started on, or `AD_HOC_SEQUENCE`
  sequence: i64,

  #[serde(serialize_with = "ser_rfc3339")]
  timestamp: DateTime<FixedOffset>,

  /// The raw event text, continuation lines included
  text: String,

  /// Free-text captures, keyed by canonical group name
  fields: HashMap<String, String>
}

impl ParsedEvent {
  pub fn new(
    sequence: i64,
    timestamp: DateTime<FixedOffset>,
    text: String,
    fields: HashMap<String, String>
  ) -> ParsedEvent {
    ParsedEvent { sequence, timestamp, text, fields }
  }

  pub fn sequence(&self) -> i64 {
    self.sequence
  }

  pub fn timestamp(&self) -> &DateTime<FixedOffset> {
    &self.timestamp
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn fields(&self) -> &HashMap<String, String> {
    &self.fields
  }

  pub fn field(&self, name: &str) -> Option<&str> {
    self.fields.get(name).map(String::as_str)
  }

  /// Returns a new event with `line` appended to the text; sequence,
  /// timestamp and fields carry over unchanged
  pub fn with_continuation(&self, line: &str) -> ParsedEvent {
    let mut text = String::with_capacity(self.text.len() + line.len() + 1);
    text.push_str(&self.text);
    text.push('\n');
    text.push_str(line);

    ParsedEvent {
      sequence: self.sequence,
      timestamp: self.timestamp,
      text,
      fields: self.fields.clone()
    }
  }
}

impl fmt::Display for ParsedEvent {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f, "#{} {} {}",
      self.sequence, self.timestamp.to_rfc3339(), self.text
    )
  }
}
