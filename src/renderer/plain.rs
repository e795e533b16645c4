// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use crate::parser::ParsedEvent;
use crate::renderer::types::*;

#[cfg(test)] use spectral::prelude::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";
const CONTINUATION_INDENT: &str = "    ";

/// `<timestamp> KEY=value ... <first line>`, with continuation lines indented
/// underneath. Fields are sorted by name so output is stable.
pub fn render_plain(event: &ParsedEvent, out: &mut dyn Write) -> io::Result<()> {
  write!(out, "{}", event.timestamp().format(TIMESTAMP_FORMAT))?;

  let mut fields: Vec<(&String, &String)> = event.fields().iter().collect();
  fields.sort();
  for (name, value) in fields {
    write!(out, " {}={}", name, value)?;
  }

  let mut lines = event.text().split('\n');
  writeln!(out, " {}", lines.next().unwrap_or(""))?;

  for line in lines {
    writeln!(out, "{}{}", CONTINUATION_INDENT, line)?;
  }

  Ok(())
}

pub fn plain_renderer(rx: Receiver<LogEntry>) -> io::Result<JoinHandle<()>> {
  spawn_renderer("plain_renderer", rx, render_plain)
}
