// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
  #[snafu(display(
    "profile {}: template token {} has no matching capture group",
    profile, token
  ))]
  UnknownCaptureGroup {
    profile: String,
    token: String
  },

  #[snafu(display(
    "profile {}: could not compile parsing pattern: {}",
    profile, source
  ))]
  InvalidPattern {
    profile: String,
    source: regex::Error
  },

  #[snafu(display(
    "profile {}: capture group {} has the same name as {}",
    profile, name, existing
  ))]
  DuplicateCaptureGroup {
    profile: String,
    name: String,
    existing: String
  },

  #[snafu(display("{} is not a temporal capture group", name))]
  UnknownTemporalGroup {
    name: String
  },

  #[snafu(display(
    "invalid value for capture group {}: {:?}",
    group, value
  ))]
  InvalidTemporalValue {
    group: String,
    value: String
  },

  /// Raised under the `ABORT` failure policy on the first unmatched line
  #[snafu(display("failed to parse line {}: {}", line, text))]
  ParsingAborted {
    line: u64,
    text: String
  },

  #[snafu(display(
    "error reading input after line {}: {}",
    line, source
  ))]
  ReadInput {
    line: u64,
    source: std::io::Error
  },

  #[snafu(display("unable to open {}: {}", path.display(), source))]
  OpenInput {
    path: PathBuf,
    source: std::io::Error
  },

  #[snafu(display("no parsing profile with id {}", id))]
  UnknownProfile {
    id: String
  },

  #[snafu(display(
    "unable to read profiles at {}: {}",
    path.display(), source
  ))]
  ProfileRead {
    path: PathBuf,
    source: std::io::Error
  },

  #[snafu(display(
    "unable to deserialize profiles at {}: {}",
    path.display(), source
  ))]
  ProfileDeserialize {
    path: PathBuf,
    source: serde_yaml::Error
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// True for errors that terminate an event stream
  pub fn is_fatal(&self) -> bool {
    match self {
      Error::ParsingAborted { .. } | Error::ReadInput { .. } => true,
      _ => false
    }
  }

  /// Process exit status: 1 when a stream stopped part way, 2 when parsing
  /// never started (bad profile, missing input, and so on)
  pub fn exit_code(&self) -> i32 {
    if self.is_fatal() {
      1
    } else {
      2
    }
  }
}
