// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Turns line-oriented text logs into timestamped events.
//!
//! A `ParsingProfile` describes a log format as a line template made of
//! `$TOKEN` placeholders, each bound to a regex fragment. Temporal tokens
//! (`$YEAR`, `$HOUR`, `$FRACTION`, ...) fold into the event timestamp; any
//! other token becomes a named field. An `EventFormat` pairs a profile with an
//! encoding, a time zone and an anchor for the date and time fields the
//! profile doesn't capture, and turns any `Read` into an `EventParser`.

#[macro_use] extern crate lazy_static;
#[cfg(test)] #[macro_use] extern crate maplit;

pub mod capture;
pub mod config;
pub mod error;
pub mod parser;
pub mod profile;
pub mod reader;
pub mod renderer;

pub use capture::{CaptureGroup, NamedCaptureGroup, TemporalCaptureGroup};
pub use error::{Error, Result};
pub use parser::{EventFormat, EventParser, ParsedEvent, TemporalAnchor, Zone};
pub use profile::{BuiltInProfile, FailurePolicy, ParsingProfile, ProfileDefinition};
