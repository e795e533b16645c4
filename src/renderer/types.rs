// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::parser::ParsedEvent;

#[derive(Debug)]
pub enum LogEntry {
  Event(ParsedEvent),

  /// Sent once the reader has nothing left to send
  Eof
}

/// Writes one event to the output
pub type RenderFn = fn(event: &ParsedEvent, out: &mut dyn Write) -> io::Result<()>;

pub type Renderer = fn(rx: Receiver<LogEntry>) -> io::Result<JoinHandle<()>>;

/// Drains `rx` into stdout on a thread called `name` until end of input, or
/// until stdout goes away
pub fn spawn_renderer(
  name: &str, rx: Receiver<LogEntry>, render: RenderFn
) -> io::Result<JoinHandle<()>> {
  let name = name.to_string();

  thread::Builder::new().name(name.clone()).spawn(move || {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = render_entries(rx, render, &mut out) {
      // a closed pipe (e.g. `| head`) isn't worth reporting
      if e.kind() != io::ErrorKind::BrokenPipe {
        error!(renderer = name.as_str(), error = %e, "unable to write output");
      }
    }
  })
}

/// Renders every event from `rx`, stopping at `LogEntry::Eof` or when the
/// sender hangs up
pub fn render_entries(
  rx: Receiver<LogEntry>, render: RenderFn, out: &mut dyn Write
) -> io::Result<()> {
  for entry in rx {
    match entry {
      LogEntry::Event(event) => render(&event, out)?,
      LogEntry::Eof => break
    }
  }

  out.flush()
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::collections::HashMap;
  use std::sync::mpsc::channel;

  use chrono::prelude::*;
  use spectral::prelude::*;

  fn event(text: &str) -> ParsedEvent {
    let timestamp = FixedOffset::east_opt(0).unwrap()
      .with_ymd_and_hms(2023, 5, 1, 10, 20, 30).unwrap();

    ParsedEvent::new(1, timestamp, text.to_string(), HashMap::new())
  }

  fn text_only(event: &ParsedEvent, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", event.text())
  }

  #[test]
  fn test_render_entries_stops_at_eof() {
    let (tx, rx) = channel();
    tx.send(LogEntry::Event(event("one"))).unwrap();
    tx.send(LogEntry::Eof).unwrap();
    tx.send(LogEntry::Event(event("two"))).unwrap();

    let mut out = Vec::new();
    render_entries(rx, text_only, &mut out).unwrap();

    assert_that!(String::from_utf8(out).unwrap()).is_equal_to("one\n".to_string());
  }

  #[test]
  fn test_render_entries_hangup() {
    let (tx, rx) = channel();
    tx.send(LogEntry::Event(event("one"))).unwrap();
    drop(tx);

    let mut out = Vec::new();
    render_entries(rx, text_only, &mut out).unwrap();

    assert_that!(String::from_utf8(out).unwrap()).is_equal_to("one\n".to_string());
  }

  #[test]
  fn test_spawn_renderer_names_thread() {
    let (tx, rx) = channel();
    tx.send(LogEntry::Eof).unwrap();

    let handle = spawn_renderer("text_renderer", rx, text_only).unwrap();
    assert_that!(handle.thread().name()).is_equal_to(Some("text_renderer"));
    assert_that!(handle.join().is_ok()).is_true();
  }
}
