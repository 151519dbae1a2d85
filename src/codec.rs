//! Line codec for chat connections
//!
//! Wraps `LinesCodec` so that a single bad line (over the length limit or
//! not UTF-8) comes out as a frame instead of a stream error. The stream
//! then only fails on transport errors.

use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// One decoded input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete UTF-8 line, without the trailing `\n` / `\r\n`
    Text(String),
    /// Longer than the configured limit. The rest of it is discarded up to
    /// the next newline.
    Overlong,
    /// Not valid UTF-8. The whole line has been consumed.
    NotUtf8,
}

#[derive(Debug)]
pub struct ChatCodec {
    inner: LinesCodec,
}

impl ChatCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_line_length),
        }
    }
}

/// Map per-line decode errors to frames, pass transport errors through
fn classify(
    result: Result<Option<String>, LinesCodecError>,
) -> Result<Option<Line>, LinesCodecError> {
    match result {
        Ok(line) => Ok(line.map(Line::Text)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Line::Overlong)),
        Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
            Ok(Some(Line::NotUtf8))
        }
        Err(e) => Err(e),
    }
}

impl Decoder for ChatCodec {
    type Item = Line;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        classify(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        classify(self.inner.decode_eof(buf))
    }
}

impl Encoder<String> for ChatCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), LinesCodecError> {
        self.inner.encode(line, buf)
    }
}
