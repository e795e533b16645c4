// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

mod temporal;
mod types;

pub use temporal::{TemporalCaptureGroup, TimestampAccumulator};
pub use types::{canonical_name, CaptureGroup, GroupKind, NamedCaptureGroup};
