//! Decoder for the attach/exec/logs multiplexed stream.
//!
//! Docker Engine interleaves a process's stdout and stderr on one connection
//! by prefixing every chunk with an 8-byte header:
//!
//! ```text
//! +---------+----------------+-----------------------+
//! | tag (1) | reserved (3)   | length (4, big-endian) |
//! +---------+----------------+-----------------------+
//! ```
//!
//! followed by exactly `length` payload bytes. The tag selects the channel:
//! `0` stdin, `1` stdout, `2` stderr. Reserved bytes are skipped without
//! validation.

use std::fmt;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{read_network_u32, write_network_u32},
    codec::{CodecError, EofError, FramingError, clamp_frame_length},
    config::{DecoderConfig, StdinPolicy},
};

/// Size of the multiplex frame header.
pub const HEADER_LEN: usize = 8;

/// Channel a multiplexed frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamType {
    /// Standard input (write side only).
    Stdin = 0,
    /// Standard output.
    Stdout = 1,
    /// Standard error.
    Stderr = 2,
}

impl StreamType {
    /// Return the wire tag for this channel.
    #[must_use]
    pub fn as_u8(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for StreamType {
    type Error = FramingError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Stdin),
            1 => Ok(Self::Stdout),
            2 => Ok(Self::Stderr),
            tag => Err(FramingError::UnknownStreamType { tag }),
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// One demultiplexed chunk of process output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiplexFrame {
    /// Channel the payload was written to.
    pub stream: StreamType,
    /// Payload bytes; may be empty.
    pub payload: Bytes,
}

impl MultiplexFrame {
    /// Build a frame for `stream` carrying `payload`.
    pub fn new(stream: StreamType, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            payload: payload.into(),
        }
    }
}

/// Codec for the multiplexed attach stream.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use dockerframe::multiplex::{MultiplexCodec, StreamType};
/// use tokio_util::codec::Decoder;
///
/// let mut codec = MultiplexCodec::default();
/// let mut buf = BytesMut::from(&[1, 0, 0, 0, 0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'][..]);
/// let frame = codec
///     .decode(&mut buf)
///     .expect("valid header")
///     .expect("complete frame");
/// assert_eq!(frame.stream, StreamType::Stdout);
/// assert_eq!(&frame.payload[..], b"hello");
/// ```
#[derive(Clone, Debug)]
pub struct MultiplexCodec {
    max_frame_length: usize,
    stdin_policy: StdinPolicy,
}

impl MultiplexCodec {
    /// Construct a codec accepting payloads up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
            stdin_policy: StdinPolicy::default(),
        }
    }

    /// Construct a codec from shared decoder settings.
    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self {
            max_frame_length: config.frame_length_limit(),
            stdin_policy: config.stdin(),
        }
    }

    /// Replace the stdin policy.
    #[must_use]
    pub fn with_stdin_policy(mut self, stdin_policy: StdinPolicy) -> Self {
        self.stdin_policy = stdin_policy;
        self
    }

    /// Return the maximum payload length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Return the stdin policy in effect.
    #[must_use]
    pub fn stdin_policy(&self) -> StdinPolicy { self.stdin_policy }

    /// Split the next complete frame off `src`, whatever its channel.
    fn split_frame(&self, src: &mut BytesMut) -> Result<Option<MultiplexFrame>, CodecError> {
        let Some(header) = src.get(..HEADER_LEN) else {
            return Ok(None);
        };
        let stream = StreamType::try_from(header[0])?;
        let length = read_network_u32([header[4], header[5], header[6], header[7]]) as usize;
        if length > self.max_frame_length {
            return Err(FramingError::OversizedFrame {
                size: length,
                max: self.max_frame_length,
            }
            .into());
        }

        let total = HEADER_LEN + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        frame.advance(HEADER_LEN);
        Ok(Some(MultiplexFrame {
            stream,
            payload: frame.freeze(),
        }))
    }
}

impl Default for MultiplexCodec {
    fn default() -> Self { Self::from_config(&DecoderConfig::default()) }
}

impl Decoder for MultiplexCodec {
    type Item = MultiplexFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(frame) = self.split_frame(src)? {
            if frame.stream == StreamType::Stdin && self.stdin_policy == StdinPolicy::Drop {
                tracing::trace!(
                    frame.bytes = frame.payload.len(),
                    "dropping stdin frame from output stream"
                );
                continue;
            }
            return Ok(Some(frame));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        Err(truncation_error(src).into())
    }
}

/// Classify a leftover buffer as a mid-header or mid-payload truncation.
pub(crate) fn truncation_error(src: &[u8]) -> EofError {
    match src.get(4..HEADER_LEN) {
        Some(length) => EofError::MidFrame {
            bytes_received: src.len() - HEADER_LEN,
            expected: read_network_u32([length[0], length[1], length[2], length[3]]) as usize,
        },
        None => EofError::MidHeader {
            bytes_received: src.len(),
            header_size: HEADER_LEN,
        },
    }
}

impl Encoder<MultiplexFrame> for MultiplexCodec {
    type Error = CodecError;

    fn encode(&mut self, item: MultiplexFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.payload.len();
        let length = u32::try_from(size)
            .ok()
            .filter(|_| size <= self.max_frame_length)
            .ok_or(FramingError::OversizedFrame {
                size,
                max: self.max_frame_length,
            })?;
        dst.reserve(HEADER_LEN + size);
        dst.extend_from_slice(&[item.stream.as_u8(), 0, 0, 0]);
        dst.extend_from_slice(&write_network_u32(length));
        dst.extend_from_slice(&item.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
