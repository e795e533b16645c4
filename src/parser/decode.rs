// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};

#[cfg(test)] use spectral::prelude::*;

const INPUT_BUFFER_SIZE: usize = 8 * 1024;

/// Adapts a byte stream in any encoding_rs-supported encoding into a stream
/// of UTF-8 bytes.
///
/// A byte order mark, if present, overrides the given encoding. Malformed
/// sequences are replaced with U+FFFD rather than failing the read.
pub struct DecodingReader<R> {
  inner: R,
  decoder: Decoder,
  input: Box<[u8]>,
  input_start: usize,
  input_end: usize,
  output: String,
  output_pos: usize,
  input_done: bool,
  finished: bool
}

impl<R: Read> DecodingReader<R> {
  pub fn new(inner: R, encoding: &'static Encoding) -> DecodingReader<R> {
    DecodingReader {
      inner,
      decoder: encoding.new_decoder(),
      input: vec![0u8; INPUT_BUFFER_SIZE].into_boxed_slice(),
      input_start: 0,
      input_end: 0,
      output: String::with_capacity(INPUT_BUFFER_SIZE * 2),
      output_pos: 0,
      input_done: false,
      finished: false
    }
  }

  /// decodes the next chunk into `output`; returns false once everything has
  /// been decoded and flushed
  fn fill_output(&mut self) -> io::Result<bool> {
    self.output.clear();
    self.output_pos = 0;

    while self.output.is_empty() {
      if self.finished {
        return Ok(false);
      }

      if self.input_start == self.input_end && !self.input_done {
        let read = loop {
          match self.inner.read(&mut self.input) {
            Ok(n) => break n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
          }
        };

        self.input_start = 0;
        self.input_end = read;
        self.input_done = read == 0;
      }

      let pending = self.input_end - self.input_start;
      let needed = self.decoder.max_utf8_buffer_length(pending)
        .unwrap_or(INPUT_BUFFER_SIZE * 4);
      self.output.reserve(needed);

      let (result, consumed, _) = self.decoder.decode_to_string(
        &self.input[self.input_start..self.input_end],
        &mut self.output,
        self.input_done
      );
      self.input_start += consumed;

      if self.input_done && result == CoderResult::InputEmpty {
        self.finished = true;
      }
    }

    Ok(true)
  }
}

impl<R: Read> Read for DecodingReader<R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if buf.is_empty() {
      return Ok(0);
    }

    if self.output_pos >= self.output.len() && !self.fill_output()? {
      return Ok(0);
    }

    let available = &self.output.as_bytes()[self.output_pos..];
    let count = available.len().min(buf.len());
    buf[..count].copy_from_slice(&available[..count]);
    self.output_pos += count;

    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use encoding_rs::{UTF_16LE, UTF_8, WINDOWS_1252};

  fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let mut reader = DecodingReader::new(bytes, encoding);
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();

    out
  }

  #[test]
  fn test_utf8_passthrough() {
    assert_that!(decode("héllo\nwörld".as_bytes(), UTF_8))
      .is_equal_to("héllo\nwörld".to_string());
  }

  #[test]
  fn test_empty() {
    assert_that!(decode(b"", UTF_8)).is_equal_to(String::new());
  }

  #[test]
  fn test_single_byte_encoding() {
    assert_that!(decode(b"caf\xe9", WINDOWS_1252)).is_equal_to("café".to_string());
  }

  #[test]
  fn test_utf16_with_bom() {
    let mut bytes = vec![0xff, 0xfe];
    for unit in "ab\nc".encode_utf16() {
      bytes.extend_from_slice(&unit.to_le_bytes());
    }

    // the BOM wins over the requested encoding
    assert_that!(decode(&bytes, UTF_8)).is_equal_to("ab\nc".to_string());
    assert_that!(decode(&bytes, UTF_16LE)).is_equal_to("ab\nc".to_string());
  }

  #[test]
  fn test_large_input_crosses_buffers() {
    let line = "0123456789é\n";
    let input: String = std::iter::repeat(line).take(5000).collect();

    assert_that!(decode(input.as_bytes(), UTF_8)).is_equal_to(input.clone());
  }

  #[test]
  fn test_malformed_is_replaced() {
    assert_that!(decode(b"a\xffb", UTF_8)).is_equal_to("a\u{fffd}b".to_string());
  }
}
