// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use crate::parser::ParsedEvent;
use crate::renderer::types::*;

#[cfg(test)] use spectral::prelude::*;

/// One JSON object per line
pub fn render_json(event: &ParsedEvent, out: &mut dyn Write) -> io::Result<()> {
  serde_json::to_writer(&mut *out, event)?;

  writeln!(out)
}

pub fn json_renderer(rx: Receiver<LogEntry>) -> io::Result<JoinHandle<()>> {
  spawn_renderer("json_renderer", rx, render_json)
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::prelude::*;
  use serde_json::Value;

  #[test]
  fn test_render_json() {
    let timestamp = FixedOffset::east_opt(2 * 3600).unwrap()
      .with_ymd_and_hms(2023, 5, 1, 10, 20, 30).unwrap();
    let event = ParsedEvent::new(
      7, timestamp, "first\nsecond".to_string(),
      hashmap!{ "HOST".to_string() => "box".to_string() }
    );

    let mut out = Vec::new();
    render_json(&event, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_that!(text.ends_with('\n')).is_true();
    assert_that!(text.trim_end().contains('\n')).is_false();

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_that!(value["sequence"].as_i64()).is_equal_to(Some(7));
    assert_that!(value["timestamp"].as_str()).is_equal_to(Some("2023-05-01T10:20:30+02:00"));
    assert_that!(value["text"].as_str()).is_equal_to(Some("first\nsecond"));
    assert_that!(value["fields"]["HOST"].as_str()).is_equal_to(Some("box"));
  }
}
