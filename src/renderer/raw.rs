// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use crate::parser::ParsedEvent;
use crate::renderer::types::*;

/// The event's text exactly as read, continuation lines included
pub fn render_raw(event: &ParsedEvent, out: &mut dyn Write) -> io::Result<()> {
  writeln!(out, "{}", event.text())
}

pub fn raw_renderer(rx: Receiver<LogEntry>) -> io::Result<JoinHandle<()>> {
  spawn_renderer("raw_renderer", rx, render_raw)
}
