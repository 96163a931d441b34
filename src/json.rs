//! Decoder for concatenated JSON progress streams.
//!
//! Build, pull, push and events endpoints write one JSON object per event with
//! no framing: values may be separated by newlines, other whitespace, or
//! nothing at all, and reads split them at arbitrary points.
//! [`JsonStreamCodec`] finds value boundaries by tracking `{`/`[` nesting
//! depth outside string literals, then deserializes each complete value into
//! the record type `T`.

use std::{any, marker::PhantomData};

use bytes::{Buf, BytesMut};
use serde::de::DeserializeOwned;
use tokio_util::codec::Decoder;

use crate::{
    codec::{CodecError, EofError, FramingError, clamp_frame_length},
    config::DecoderConfig,
};

/// Incremental boundary scanner for one top-level JSON value.
///
/// The scan position and string state survive across calls, so bytes that
/// arrived in earlier reads are not scanned again.
#[derive(Clone, Copy, Debug, Default)]
struct Scanner {
    position: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scanner {
    /// Scan `src` from the retained position. Returns the length of the
    /// first complete value, or `None` if it is not yet complete.
    fn scan(&mut self, src: &[u8]) -> Result<Option<usize>, FramingError> {
        for (offset, &byte) in src.iter().enumerate().skip(self.position) {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' if self.depth == 0 => {
                    return Err(FramingError::UnbalancedDelimiter { byte, offset });
                }
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        *self = Self::default();
                        return Ok(Some(offset + 1));
                    }
                }
                _ if self.depth == 0 => {
                    return Err(FramingError::UnexpectedByte { byte, offset });
                }
                b'"' => self.in_string = true,
                _ => {}
            }
        }
        self.position = src.len();
        Ok(None)
    }
}

fn skip_whitespace(src: &mut BytesMut) {
    let whitespace = src
        .iter()
        .take_while(|byte| byte.is_ascii_whitespace())
        .count();
    src.advance(whitespace);
}

/// Codec extracting typed records from a concatenated JSON stream.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use dockerframe::{json::JsonStreamCodec, models::BuildInfo};
/// use tokio_util::codec::Decoder;
///
/// let mut codec = JsonStreamCodec::<BuildInfo>::default();
/// let mut buf = BytesMut::from(&br#"{"stream":"Step 1/2"}{"stream":"Step 2/2"}"#[..]);
/// let first = codec.decode(&mut buf).expect("valid JSON").expect("complete value");
/// assert_eq!(first.stream.as_deref(), Some("Step 1/2"));
/// ```
pub struct JsonStreamCodec<T> {
    scanner: Scanner,
    max_frame_length: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonStreamCodec<T> {
    /// Construct a codec buffering values up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            scanner: Scanner::default(),
            max_frame_length: clamp_frame_length(max_frame_length),
            _record: PhantomData,
        }
    }

    /// Construct a codec from shared decoder settings.
    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self { Self::new(config.frame_length_limit()) }

    /// Return the maximum value length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl<T> Default for JsonStreamCodec<T> {
    fn default() -> Self { Self::from_config(&DecoderConfig::default()) }
}

impl<T> std::fmt::Debug for JsonStreamCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStreamCodec")
            .field("record", &any::type_name::<T>())
            .field("scanner", &self.scanner)
            .field("max_frame_length", &self.max_frame_length)
            .finish()
    }
}

impl<T: DeserializeOwned> Decoder for JsonStreamCodec<T> {
    type Item = T;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.scanner.position == 0 {
            skip_whitespace(src);
        }

        let Some(end) = self.scanner.scan(src)? else {
            if src.len() > self.max_frame_length {
                return Err(FramingError::OversizedFrame {
                    size: src.len(),
                    max: self.max_frame_length,
                }
                .into());
            }
            return Ok(None);
        };

        let value = src.split_to(end);
        skip_whitespace(src);
        tracing::trace!(
            frame.bytes = value.len(),
            record = any::type_name::<T>(),
            "JSON value extracted"
        );
        serde_json::from_slice(&value)
            .map(Some)
            .map_err(|source| CodecError::Deserialize {
                record: record_name::<T>(),
                source,
            })
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if src.is_empty() {
            return Ok(None);
        }
        Err(EofError::UnterminatedValue {
            bytes_buffered: src.len(),
            depth: self.scanner.depth,
        }
        .into())
    }
}

/// Short name of a record type, without its module path.
fn record_name<T>() -> &'static str {
    let name = any::type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests;
