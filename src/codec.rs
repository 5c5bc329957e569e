//! Line-based codec for tokio.
//!
//! `\r\n`-terminated line framing over the byte stream. Decoding yields raw
//! lines (the engine parses them, so its drop-and-continue error policy
//! applies per line); encoding takes outgoing [`Command`]s.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::error::{self, ProtocolError};

/// Maximum IRC line length in bytes, per the protocol standard.
pub const MAX_LINE_LEN: usize = 512;

/// Codec for newline-terminated IRC lines.
pub struct LineCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
    /// Maximum line length.
    max_len: usize,
    /// Set after an over-length error without a newline; input is dropped
    /// until the next newline so decoding can resume on a line boundary.
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_LINE_LEN,
            discarding: false,
        }
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if self.discarding {
            match src.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let _ = src.split_to(offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                None => {
                    src.clear();
                    return Ok(None);
                }
            }
        }

        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            // Found a line; take it off the buffer before validating so a
            // bad line never wedges the stream.
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let data = std::str::from_utf8(&line)
                .map_err(|e| ProtocolError::InvalidUtf8 {
                    byte_pos: e.valid_up_to(),
                })?
                .to_string();

            Ok(Some(data))
        } else {
            // No complete line yet; remember where we stopped.
            self.next_index = src.len();

            if src.len() > self.max_len {
                // Drop what we have and resynchronize at the next newline.
                let actual = src.len();
                src.clear();
                self.next_index = 0;
                self.discarding = true;
                return Err(ProtocolError::LineTooLong {
                    actual,
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Command> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, cmd: Command, dst: &mut BytesMut) -> error::Result<()> {
        let mut wire = cmd.to_string();
        // A message body with an embedded line ending would smuggle a
        // second command; truncate at the first one.
        if let Some(pos) = wire.find(['\r', '\n']) {
            wire.truncate(pos);
        }
        dst.extend_from_slice(wire.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
