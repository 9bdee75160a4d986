// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line Codec.
//!
//! Frames CRLF (or bare LF) terminated protocol lines with a hard length
//! limit, and encodes outbound `Message`s with a CRLF terminator. Lines that
//! are too long or not UTF-8 are dropped so one bad line never ends the
//! stream.

use anyhow::{anyhow, Result};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::engine_core::constants::limits;
use crate::protocol::replies::Message;

pub struct LineCodec {
    max_length: usize,
    /// How far into the buffer we already scanned for a terminator
    next_index: usize,
    /// Set while skipping the rest of an overlong line
    discarding: bool,
}

impl LineCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(limits::MAX_LINE_LENGTH)
    }

    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Turn one terminated frame (without its `\n`) into a line, if it is usable.
    fn accept(&self, raw: &[u8]) -> Option<String> {
        if raw.len() + 1 > self.max_length {
            warn!("Dropping line longer than {} bytes", self.max_length);
            return None;
        }
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                warn!("Dropping line with invalid UTF-8: {}", e);
                return None;
            }
        };
        if line.is_empty() {
            return None;
        }
        trace!("Decoded line: {}", line);
        Some(line.to_string())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');
            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    let _ = src.split_to(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (true, None) => {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let raw = src.split_to(end + 1);
                    if let Some(line) = self.accept(&raw[..end]) {
                        return Ok(Some(line));
                    }
                }
                (false, None) => {
                    if src.len() > self.max_length {
                        warn!("Dropping line longer than {} bytes", self.max_length);
                        self.discarding = true;
                        continue;
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    /// A final line without a terminator still counts.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if self.discarding || src.is_empty() {
            self.discarding = false;
            src.clear();
            return Ok(None);
        }
        let raw = src.split_to(src.len());
        Ok(self.accept(&raw))
    }
}

impl<'a> Encoder<&'a Message> for LineCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: &'a Message, dst: &mut BytesMut) -> Result<()> {
        let line = item.to_string();
        if line.len() + 2 > self.max_length {
            return Err(anyhow!("Outbound line exceeds {} bytes", self.max_length));
        }
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
