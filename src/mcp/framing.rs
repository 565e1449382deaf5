//! Newline framing for the STDIO transport.
//!
//! Input arrives in arbitrary chunks. Bytes are accumulated until a `\n` is
//! seen; each complete line is one JSON-RPC message and the trailing partial
//! fragment waits for the next chunk. Splitting happens on bytes, so a UTF-8
//! sequence cut across two reads is reassembled before decoding.

use std::string::FromUtf8Error;

/// One framed line, or the decode failure of a line that is not valid UTF-8.
pub type Frame = Result<String, FromUtf8Error>;

/// Split `buf` into complete lines and the unterminated remainder.
///
/// Line terminators (`\n`, and a `\r` right before it) are not part of the
/// returned lines. A line holding invalid UTF-8 is reported as an error in
/// place, never repaired.
pub fn split_lines(buf: &[u8]) -> (Vec<Frame>, &[u8]) {
    let mut lines = Vec::new();
    let mut start = 0;
    while let Some(pos) = buf[start..].iter().position(|b| *b == b'\n') {
        let end = start + pos;
        lines.push(decode_line(&buf[start..end]));
        start = end + 1;
    }
    (lines, &buf[start..])
}

fn decode_line(raw: &[u8]) -> Frame {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8(raw.to_vec())
}

/// Incremental accumulator around [`split_lines`].
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);
        let (lines, rest) = split_lines(&self.buffer);
        let consumed = self.buffer.len() - rest.len();
        self.buffer.drain(..consumed);
        lines
    }

    /// End of input: hand out the unterminated tail, if it holds anything.
    pub fn finish(&mut self) -> Option<Frame> {
        let tail = std::mem::take(&mut self.buffer);
        match decode_line(&tail) {
            Ok(line) if line.trim().is_empty() => None,
            frame => Some(frame),
        }
    }

    /// Bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
