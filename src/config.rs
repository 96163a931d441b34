//! Decoder and drain configuration.
//!
//! [`DecoderConfig`] gathers the knobs shared by the stream decoders and the
//! drain loops. Codecs and streams are built from it with
//! `from_config`/`with_config` constructors; the defaults suit Docker Engine
//! responses.

use crate::codec::{MAX_FRAME_LENGTH, clamp_frame_length};

/// Default number of bytes requested from the byte source per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// What the multiplex decoder does with frames tagged as stdin.
///
/// Stdin frames only appear on the write side of an attach connection, so an
/// output stream should never carry them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StdinPolicy {
    /// Discard stdin frames after consuming their bytes.
    #[default]
    Drop,
    /// Surface stdin frames to handlers like any other channel.
    PassThrough,
}

/// How websocket data payloads map to output frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InnerFraming {
    /// Apply the multiplex framing to the concatenation of all websocket
    /// data payloads.
    #[default]
    Multiplexed,
    /// Surface every websocket data payload as a stdout frame.
    Raw,
}

/// Configuration shared by the stream decoders and drain loops.
///
/// # Examples
///
/// ```
/// use dockerframe::config::{DecoderConfig, StdinPolicy};
///
/// let config = DecoderConfig::default()
///     .max_frame_length(1024 * 1024)
///     .stdin_policy(StdinPolicy::PassThrough);
/// assert_eq!(config.frame_length_limit(), 1024 * 1024);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    max_frame_length: usize,
    read_chunk_size: usize,
    stdin_policy: StdinPolicy,
    inner_framing: InnerFraming,
}

impl DecoderConfig {
    /// Set the largest frame or JSON value a decoder will buffer.
    ///
    /// The value is clamped to
    /// [`MIN_FRAME_LENGTH`](crate::codec::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = clamp_frame_length(max_frame_length);
        self
    }

    /// Set how many bytes the blocking drain requests per read. Zero is
    /// treated as one.
    #[must_use]
    pub fn read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        self
    }

    /// Set the handling of stdin-tagged multiplex frames.
    #[must_use]
    pub fn stdin_policy(mut self, stdin_policy: StdinPolicy) -> Self {
        self.stdin_policy = stdin_policy;
        self
    }

    /// Set how websocket payloads are framed.
    #[must_use]
    pub fn inner_framing(mut self, inner_framing: InnerFraming) -> Self {
        self.inner_framing = inner_framing;
        self
    }

    /// Largest frame or JSON value a decoder will buffer.
    #[must_use]
    pub fn frame_length_limit(&self) -> usize { self.max_frame_length }

    /// Bytes requested per read by the blocking drain.
    #[must_use]
    pub fn chunk_size(&self) -> usize { self.read_chunk_size }

    /// Configured stdin policy.
    #[must_use]
    pub fn stdin(&self) -> StdinPolicy { self.stdin_policy }

    /// Configured websocket inner framing.
    #[must_use]
    pub fn framing(&self) -> InnerFraming { self.inner_framing }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frame_length: MAX_FRAME_LENGTH,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            stdin_policy: StdinPolicy::default(),
            inner_framing: InnerFraming::default(),
        }
    }
}
