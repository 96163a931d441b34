//! Frame reader contract shared by every Docker stream decoder.
//!
//! A frame reader is a [`tokio_util::codec::Decoder`] whose error type is
//! [`CodecError`]. The drain loops lend it the unconsumed prefix of the
//! stream:
//!
//! - `decode` returns `Ok(Some(frame))` after splitting one complete frame off
//!   the buffer, or `Ok(None)` when more input is required. It never consumes
//!   bytes that do not yet form a frame.
//! - `decode_eof` runs once the byte source reports end-of-data. A leftover
//!   that cannot form a frame is reported as an [`EofError`] rather than being
//!   dropped.
//!
//! # Error Handling
//!
//! [`CodecError`] separates malformed framing, truncated streams, record
//! deserialization failures and transport errors. See the [`error`] module.

use tokio_util::codec::Decoder;
pub use tokio_util::codec::Encoder;

pub mod error;

pub use error::{CodecError, EofError, FramingError};

/// Minimum frame length in bytes.
///
/// Limits passed to codec constructors are clamped to at least this value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Limits passed to codec constructors are clamped to at most this value so
/// that a corrupt length prefix cannot trigger an unbounded allocation on a
/// long-lived stream.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// A decoder that can drive a [`FrameStream`](crate::stream::FrameStream) or
/// an [`AsyncFrameStream`](crate::framed::AsyncFrameStream).
pub trait FrameReader: Decoder<Error = CodecError> {}

impl<D> FrameReader for D where D: Decoder<Error = CodecError> {}
