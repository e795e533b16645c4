// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use encoding_rs::Encoding;
use snafu::ResultExt;
use tracing::{debug, trace};

use crate::error::{Error, ReadInput, Result};
use crate::profile::FailurePolicy;
use super::decode::DecodingReader;
use super::event::ParsedEvent;
use super::format::EventMatcher;

/// Characters consumed between two updates of the progress indicator
pub const PROGRESS_STEP: u64 = 10_240;

/// Longest offending text reported by an aborted parse, in characters
const MAX_REPORTED_TEXT: usize = 256;

/// A shared, coarse count of characters consumed by a parser. Safe to read
/// from any thread while the parser runs.
#[derive(Debug, Clone, Default)]
pub struct ProgressIndicator(Arc<AtomicU64>);

impl ProgressIndicator {
  pub fn get(&self) -> u64 {
    self.0.load(Ordering::Relaxed)
  }

  fn advance(&self, chars: u64) {
    self.0.fetch_add(chars, Ordering::Relaxed);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
  NotStarted,
  Running,
  Exhausted
}

impl fmt::Display for ParserState {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Replaces control characters and caps the length of text quoted in errors
pub fn sanitize(text: &str) -> String {
  let mut sanitized: String = text.chars()
    .take(MAX_REPORTED_TEXT)
    .map(|c| if c.is_control() { ' ' } else { c })
    .collect();

  if text.chars().nth(MAX_REPORTED_TEXT).is_some() {
    sanitized.push_str("...");
  }

  sanitized
}

/// Pulls lines from an input stream and yields parsed events.
///
/// A matched line isn't released until the next matched line (or the end of
/// input) shows up, so that unmatched continuation lines can still be folded
/// into it under the `CONCAT` policy. Fatal errors are yielded once, after
/// which the iterator is exhausted.
pub struct EventParser<R> {
  reader: Option<BufReader<DecodingReader<R>>>,
  matcher: EventMatcher,
  policy: FailurePolicy,
  pending: Option<ParsedEvent>,
  state: ParserState,
  line_count: u64,
  unreported_chars: u64,
  progress: ProgressIndicator
}

impl<R: Read> EventParser<R> {
  pub(crate) fn new(
    input: R,
    encoding: &'static Encoding,
    matcher: EventMatcher,
    policy: FailurePolicy
  ) -> EventParser<R> {
    EventParser {
      reader: Some(BufReader::new(DecodingReader::new(input, encoding))),
      matcher,
      policy,
      pending: None,
      state: ParserState::NotStarted,
      line_count: 0,
      unreported_chars: 0,
      progress: ProgressIndicator::default()
    }
  }

  pub fn state(&self) -> ParserState {
    self.state
  }

  pub fn is_exhausted(&self) -> bool {
    self.state == ParserState::Exhausted
  }

  pub fn policy(&self) -> FailurePolicy {
    self.policy
  }

  /// Number of lines read so far
  pub fn line_count(&self) -> u64 {
    self.line_count
  }

  pub fn progress(&self) -> ProgressIndicator {
    self.progress.clone()
  }

  /// Releases the input and ends iteration; any pending event is dropped.
  /// Calling this more than once is harmless.
  pub fn close(&mut self) {
    if self.reader.take().is_some() {
      debug!(lines = self.line_count, "event parser closed");
    }

    self.pending = None;
    self.state = ParserState::Exhausted;
  }

  fn finish(&mut self) {
    if self.unreported_chars > 0 {
      self.progress.advance(self.unreported_chars);
      self.unreported_chars = 0;
    }

    self.reader = None;
    self.state = ParserState::Exhausted;
  }

  fn read_line(&mut self) -> Result<Option<String>> {
    let reader = match self.reader.as_mut() {
      Some(reader) => reader,
      None => return Ok(None)
    };

    let mut line = String::new();
    let read = reader.read_line(&mut line)
      .context(ReadInput { line: self.line_count })?;

    if read == 0 {
      return Ok(None);
    }

    if line.ends_with('\n') {
      line.pop();
      if line.ends_with('\r') {
        line.pop();
      }
    }

    self.line_count += 1;
    self.unreported_chars += line.chars().count() as u64;
    if self.unreported_chars >= PROGRESS_STEP {
      self.progress.advance(self.unreported_chars);
      self.unreported_chars = 0;
    }

    Ok(Some(line))
  }

  /// Feeds one line through the matcher and the failure policy, returning
  /// whatever became ready to yield
  fn consume(&mut self, line: String) -> Option<Result<ParsedEvent>> {
    if let Some(event) = self.matcher.parse(self.line_count as i64, &line) {
      return self.pending.replace(event).map(Ok);
    }

    match self.policy {
      FailurePolicy::Concat => {
        match self.pending.take() {
          Some(pending) => self.pending = Some(pending.with_continuation(&line)),
          None => trace!(line = self.line_count, "dropping unmatched leading line")
        };

        None
      },
      FailurePolicy::Ignore => {
        trace!(line = self.line_count, "ignoring unmatched line");
        None
      },
      FailurePolicy::Abort => {
        let line_number = self.line_count;
        self.pending = None;
        self.finish();

        debug!(line = line_number, "aborting on unmatched line");
        Some(Err(Error::ParsingAborted {
          line: line_number,
          text: sanitize(&line)
        }))
      }
    }
  }
}

impl<R: Read> Iterator for EventParser<R> {
  type Item = Result<ParsedEvent>;

  fn next(&mut self) -> Option<Result<ParsedEvent>> {
    loop {
      match self.state {
        ParserState::Exhausted => return None,
        ParserState::NotStarted => self.state = ParserState::Running,
        ParserState::Running => ()
      };

      match self.read_line() {
        Ok(Some(line)) => {
          if let Some(item) = self.consume(line) {
            return Some(item);
          }
        },
        Ok(None) => {
          self.finish();
          debug!(lines = self.line_count, "reached end of input");

          return self.pending.take().map(Ok);
        },
        Err(e) => {
          self.pending = None;
          self.finish();

          return Some(Err(e));
        }
      }
    }
  }
}

impl<R: Read> FusedIterator for EventParser<R> {}

impl<R> fmt::Debug for EventParser<R> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("EventParser")
      .field("policy", &self.policy)
      .field("state", &self.state)
      .field("line_count", &self.line_count)
      .field("pending", &self.pending)
      .finish()
  }
}
