// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use simple_error::SimpleError;
use uuid::Uuid;

use crate::capture::{GroupKind, NamedCaptureGroup};
use crate::error::Result;

#[cfg(test)] use spectral::prelude::*;

/// What the parser does with a line the profile's pattern doesn't match
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailurePolicy {
  /// append the line to the pending event
  Concat,

  /// drop the line
  Ignore,

  /// stop parsing with an error
  Abort
}

impl Default for FailurePolicy {
  fn default() -> FailurePolicy {
    FailurePolicy::Concat
  }
}

impl fmt::Display for FailurePolicy {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      FailurePolicy::Concat => f.write_str("CONCAT"),
      FailurePolicy::Ignore => f.write_str("IGNORE"),
      FailurePolicy::Abort => f.write_str("ABORT")
    }
  }
}

impl FromStr for FailurePolicy {
  type Err = SimpleError;

  fn from_str(s: &str) -> std::result::Result<FailurePolicy, SimpleError> {
    match s.to_lowercase().as_str() {
      "concat" => Ok(FailurePolicy::Concat),
      "ignore" => Ok(FailurePolicy::Ignore),
      "abort" => Ok(FailurePolicy::Abort),
      _ => Err(SimpleError::new(format!("invalid failure policy: {}", s)))
    }
  }
}

pub fn new_profile_id() -> String {
  Uuid::new_v4().to_string()
}

/// Exchange form of a single capture group
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaptureGroupDefinition {
  pub name: String,

  #[serde(default = "default_kind")]
  pub kind: GroupKind,

  /// the regex fragment substituted for `$NAME` in the line template
  pub expression: String
}

fn default_kind() -> GroupKind {
  GroupKind::Text
}

impl CaptureGroupDefinition {
  /// `name` is kept as written; `group` only supplies the kind
  pub fn new(
    name: &str, group: &NamedCaptureGroup, expression: &str
  ) -> CaptureGroupDefinition {
    CaptureGroupDefinition {
      name: name.to_string(),
      kind: group.kind(),
      expression: expression.to_string()
    }
  }

  pub fn to_group(&self) -> Result<(NamedCaptureGroup, String)> {
    let group = NamedCaptureGroup::with_kind(&self.name, self.kind)?;

    Ok((group, self.expression.clone()))
  }
}

/// Exchange form of a parsing profile, as persisted by whatever stores
/// profiles
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProfileDefinition {
  #[serde(default = "new_profile_id")]
  pub id: String,

  pub name: String,

  #[serde(default)]
  pub capture_groups: Vec<CaptureGroupDefinition>,

  pub line_template: String,

  #[serde(default)]
  pub on_failure: FailurePolicy
}
