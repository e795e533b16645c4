// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Read};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::error::Result;
use crate::parser::EventFormat;
use crate::renderer::LogEntry;

/// Sends every event parsed from `input` to `tx`, followed by
/// `LogEntry::Eof`. Returns the error that ended the stream, if any.
pub fn read_events<R: Read>(format: &EventFormat, input: R, tx: &Sender<LogEntry>) -> Result<u64> {
  let mut parser = format.parse(input)?;
  let mut sent = 0;

  let result = loop {
    match parser.next() {
      Some(Ok(event)) => match tx.send(LogEntry::Event(event)) {
        Ok(_) => sent += 1,
        // assume the renderer has quit and stop
        Err(_) => break Ok(sent)
      },
      Some(Err(e)) => break Err(e),
      None => break Ok(sent)
    }
  };

  info!(
    lines = parser.line_count(),
    events = sent,
    characters = parser.progress().get(),
    "finished reading input"
  );

  if let Ok(0) = result {
    warn!("reached end of input without reading any events");
  }

  parser.close();

  // not much we can do if this fails
  tx.send(LogEntry::Eof).ok();

  result
}

/// Runs `read_events` on its own thread
pub fn spawn_reader(
  format: EventFormat,
  input: Box<dyn Read + Send>,
  tx: Sender<LogEntry>
) -> io::Result<JoinHandle<Result<u64>>> {
  thread::Builder::new().name("reader".to_string()).spawn(move || {
    read_events(&format, input, &tx)
  })
}
