// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use super::temporal::TemporalCaptureGroup;

#[cfg(test)] use spectral::prelude::*;

/// Normalizes a template token or group name: one leading `$` is dropped and
/// ASCII letters are upper-cased, so `$severity`, `severity` and `SEVERITY`
/// all name the same group.
pub fn canonical_name(name: &str) -> String {
  let trimmed = name.trim();
  let stripped = if trimmed.starts_with('$') {
    &trimmed[1..]
  } else {
    trimmed
  };

  stripped.to_ascii_uppercase()
}

/// A free-text capture group, whose matched text lands in an event's fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureGroup {
  name: String
}

impl CaptureGroup {
  pub fn of(name: &str) -> CaptureGroup {
    CaptureGroup {
      name: canonical_name(name)
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for CaptureGroup {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.name)
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
  Text,
  Temporal
}

/// Either a free-text group or one of the closed set of temporal groups.
///
/// Identity is the canonical name alone: a text group that happens to be
/// called `YEAR` is equal to `TemporalCaptureGroup::Year`.
#[derive(Debug, Clone)]
pub enum NamedCaptureGroup {
  Text(CaptureGroup),
  Temporal(TemporalCaptureGroup)
}

impl NamedCaptureGroup {
  /// Resolves a name to a temporal group if it names one (aliases included),
  /// otherwise to a free-text group
  pub fn of(name: &str) -> NamedCaptureGroup {
    match name.parse::<TemporalCaptureGroup>() {
      Ok(temporal) => NamedCaptureGroup::Temporal(temporal),
      Err(_) => NamedCaptureGroup::Text(CaptureGroup::of(name))
    }
  }

  /// Builds a group of an explicit kind, as carried by exchanged profiles
  pub fn with_kind(name: &str, kind: GroupKind) -> Result<NamedCaptureGroup> {
    match kind {
      GroupKind::Text => Ok(NamedCaptureGroup::Text(CaptureGroup::of(name))),
      GroupKind::Temporal => name.parse::<TemporalCaptureGroup>()
        .map(NamedCaptureGroup::Temporal)
    }
  }

  pub fn name(&self) -> &str {
    match self {
      NamedCaptureGroup::Text(group) => group.name(),
      NamedCaptureGroup::Temporal(temporal) => temporal.name()
    }
  }

  pub fn kind(&self) -> GroupKind {
    match self {
      NamedCaptureGroup::Text(_) => GroupKind::Text,
      NamedCaptureGroup::Temporal(_) => GroupKind::Temporal
    }
  }

  pub fn as_temporal(&self) -> Option<TemporalCaptureGroup> {
    match self {
      NamedCaptureGroup::Temporal(temporal) => Some(*temporal),
      NamedCaptureGroup::Text(_) => None
    }
  }

  /// True if `token` (e.g. `$YEAR` lifted from a line template) refers to
  /// this group
  pub fn matches_token(&self, token: &str) -> bool {
    NamedCaptureGroup::of(token) == *self
  }
}

impl PartialEq for NamedCaptureGroup {
  fn eq(&self, other: &NamedCaptureGroup) -> bool {
    self.name() == other.name()
  }
}

impl Eq for NamedCaptureGroup {}

impl Hash for NamedCaptureGroup {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.name().hash(state)
  }
}

impl fmt::Display for NamedCaptureGroup {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl From<TemporalCaptureGroup> for NamedCaptureGroup {
  fn from(temporal: TemporalCaptureGroup) -> NamedCaptureGroup {
    NamedCaptureGroup::Temporal(temporal)
  }
}

impl From<CaptureGroup> for NamedCaptureGroup {
  fn from(group: CaptureGroup) -> NamedCaptureGroup {
    NamedCaptureGroup::Text(group)
  }
}

impl FromStr for NamedCaptureGroup {
  type Err = Error;

  fn from_str(s: &str) -> Result<NamedCaptureGroup> {
    Ok(NamedCaptureGroup::of(s))
  }
}
