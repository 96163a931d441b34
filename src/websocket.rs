//! Decoder for the websocket attach stream.
//!
//! After a `101 Switching Protocols` response the attach body is a websocket
//! connection. [`WebSocketCodec`] unwraps RFC 6455 frames (extended lengths,
//! masking, fragmentation, control frames) and hands the recovered data bytes
//! to an inner framing:
//!
//! - [`InnerFraming::Multiplexed`]: the multiplex decoder runs over the concatenation of all data
//!   payloads, so a multiplex frame may span websocket frames.
//! - [`InnerFraming::Raw`]: each data payload is surfaced as a stdout frame.
//!
//! Ping and pong frames are skipped. A close frame ends the message flow and
//! anything after it is discarded.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::{
    byte_order::read_network_u16,
    codec::{CodecError, EofError, FramingError},
    config::{DecoderConfig, InnerFraming},
    multiplex::{self, MultiplexCodec, MultiplexFrame, StreamType},
};

pub mod frame;
pub mod handshake;

pub use frame::{FrameHeader, Opcode};
pub use handshake::UpgradeRequest;

/// Codec unwrapping websocket frames into multiplexed output frames.
#[derive(Debug)]
pub struct WebSocketCodec {
    inner: MultiplexCodec,
    framing: InnerFraming,
    max_frame_length: usize,
    payload: BytesMut,
    fragmented: bool,
    closed: bool,
}

impl WebSocketCodec {
    /// Construct a codec accepting websocket payloads up to
    /// `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self::from_config(&DecoderConfig::default().max_frame_length(max_frame_length))
    }

    /// Construct a codec from shared decoder settings.
    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self {
            inner: MultiplexCodec::from_config(config),
            framing: config.framing(),
            max_frame_length: config.frame_length_limit(),
            payload: BytesMut::new(),
            fragmented: false,
            closed: false,
        }
    }

    /// Replace the inner framing.
    #[must_use]
    pub fn with_inner_framing(mut self, framing: InnerFraming) -> Self {
        self.framing = framing;
        self
    }

    /// Returns true once a close frame has been received.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed }

    /// Return the maximum websocket payload length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    fn next_output(&mut self) -> Result<Option<MultiplexFrame>, CodecError> {
        match self.framing {
            InnerFraming::Multiplexed => self.inner.decode(&mut self.payload),
            InnerFraming::Raw if self.payload.is_empty() => Ok(None),
            InnerFraming::Raw => Ok(Some(MultiplexFrame::new(
                StreamType::Stdout,
                self.payload.split().freeze(),
            ))),
        }
    }

    fn accept(&mut self, header: FrameHeader, payload: BytesMut) -> Result<(), FramingError> {
        match header.opcode {
            Opcode::Continuation => {
                if !self.fragmented {
                    return Err(FramingError::UnexpectedContinuation);
                }
                self.fragmented = !header.fin;
                self.payload.unsplit(payload);
            }
            Opcode::Text | Opcode::Binary => {
                if self.fragmented {
                    return Err(FramingError::ExpectedContinuation {
                        opcode: header.opcode.as_u8(),
                    });
                }
                self.fragmented = !header.fin;
                self.payload.unsplit(payload);
            }
            Opcode::Close => {
                let code = payload
                    .get(..2)
                    .map(|code| read_network_u16([code[0], code[1]]));
                tracing::debug!(close.code = ?code, "websocket close frame received");
                self.closed = true;
            }
            Opcode::Ping | Opcode::Pong => {
                tracing::trace!(
                    opcode = ?header.opcode,
                    frame.bytes = payload.len(),
                    "skipping websocket control frame"
                );
            }
        }
        Ok(())
    }
}

impl Default for WebSocketCodec {
    fn default() -> Self { Self::from_config(&DecoderConfig::default()) }
}

impl Decoder for WebSocketCodec {
    type Item = MultiplexFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if let Some(frame) = self.next_output()? {
                return Ok(Some(frame));
            }
            if self.closed {
                if !src.is_empty() {
                    tracing::trace!(
                        discarded.bytes = src.len(),
                        "discarding bytes after websocket close"
                    );
                    src.clear();
                }
                return Ok(None);
            }

            let Some(header) = FrameHeader::parse(src, self.max_frame_length)? else {
                return Ok(None);
            };
            let total = header.header_len + header.payload_len;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            let mut payload = src.split_to(total);
            payload.advance(header.header_len);
            if let Some(key) = header.mask {
                frame::unmask(&mut payload, key);
            }
            self.accept(header, payload)?;
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            return Err(truncation_error(src, self.max_frame_length).into());
        }
        if !self.payload.is_empty() {
            return Err(multiplex::truncation_error(&self.payload).into());
        }
        Ok(None)
    }
}

fn truncation_error(src: &[u8], max_frame_length: usize) -> EofError {
    match FrameHeader::parse(src, max_frame_length) {
        Ok(Some(header)) => EofError::MidFrame {
            bytes_received: src.len() - header.header_len,
            expected: header.payload_len,
        },
        _ => EofError::MidHeader {
            bytes_received: src.len(),
            header_size: frame::required_header_len(src),
        },
    }
}
