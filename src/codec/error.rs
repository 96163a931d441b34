//! Error types for the stream decoders.
//!
//! The taxonomy lets callers tell apart the ways a Docker stream can fail:
//!
//! - [`FramingError`]: the peer sent bytes that violate the framing (unknown multiplex tag,
//!   inconsistent websocket length, stray bytes between JSON values).
//! - [`EofError`]: the byte source ended while a frame or JSON value was only partly buffered. This
//!   is "the server cut the connection", as opposed to "the server sent garbage".
//! - [`CodecError::Deserialize`]: a structurally complete JSON value did not match the record
//!   schema.
//! - [`CodecError::Io`]: the byte source itself failed; the error is carried unchanged.
//!
//! Framing and EOF errors are fatal for the stream: the protocol position is
//! lost and nothing is retried. Deserialization errors leave the position
//! intact because the offending value has already been consumed.

use std::io;

use thiserror::Error;

/// Wire-level violations detected while locating frame boundaries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Multiplex header tag outside `0..=2`.
    #[error("unknown stream type tag: {tag}")]
    UnknownStreamType {
        /// Tag byte found at offset 0 of the header.
        tag: u8,
    },

    /// Declared frame length exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Length declared by the peer, or buffered so far for JSON values.
        size: usize,
        /// Maximum allowed frame length.
        max: usize,
    },

    /// Websocket RSV bits set without a negotiated extension.
    #[error("reserved websocket bits set: {bits:#05b}")]
    ReservedBits {
        /// The three RSV bits, shifted down.
        bits: u8,
    },

    /// Websocket opcode with no defined meaning.
    #[error("reserved websocket opcode: {opcode:#x}")]
    ReservedOpcode {
        /// Opcode nibble.
        opcode: u8,
    },

    /// Extended websocket length that would fit a shorter encoding.
    #[error("websocket length {length} must not use the {width}-byte extended form")]
    NonMinimalLength {
        /// Decoded length.
        length: u64,
        /// Width of the extended length field in bytes.
        width: usize,
    },

    /// 64-bit websocket length with the most significant bit set.
    #[error("websocket 64-bit length has the most significant bit set")]
    LengthOverflow,

    /// Control frame without the FIN bit.
    #[error("fragmented websocket control frame (opcode {opcode:#x})")]
    FragmentedControlFrame {
        /// Control opcode.
        opcode: u8,
    },

    /// Control frame payload above 125 bytes.
    #[error("websocket control frame payload too long: {length} > 125")]
    OversizedControlFrame {
        /// Declared payload length.
        length: u64,
    },

    /// Continuation frame with no fragmented message in progress.
    #[error("websocket continuation frame outside a fragmented message")]
    UnexpectedContinuation,

    /// New data frame while a fragmented message is still open.
    #[error("expected websocket continuation frame, got opcode {opcode:#x}")]
    ExpectedContinuation {
        /// Opcode of the offending frame.
        opcode: u8,
    },

    /// Byte outside any JSON value that is neither whitespace nor an opening
    /// delimiter.
    #[error("unexpected byte {byte:#04x} outside a JSON value at offset {offset}")]
    UnexpectedByte {
        /// Offending byte.
        byte: u8,
        /// Offset within the buffered, unconsumed input.
        offset: usize,
    },

    /// Closing `}` or `]` with no value open.
    #[error("unbalanced closing delimiter {byte:#04x} at offset {offset}")]
    UnbalancedDelimiter {
        /// Offending byte.
        byte: u8,
        /// Offset within the buffered, unconsumed input.
        offset: usize,
    },
}

/// End-of-data reached with an incomplete frame buffered.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The source ended inside a frame header.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Size of the complete header.
        header_size: usize,
    },

    /// The source ended inside a frame payload.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte payload received")]
    MidFrame {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Payload length declared by the header.
        expected: usize,
    },

    /// The source ended inside a JSON value.
    #[error("premature EOF: unterminated JSON value ({bytes_buffered} bytes buffered, depth {depth})")]
    UnterminatedValue {
        /// Bytes of the partial value.
        bytes_buffered: usize,
        /// Nesting depth when the source ended.
        depth: usize,
    },
}

/// Top-level decoder error.
///
/// # Examples
///
/// ```
/// use dockerframe::codec::{CodecError, EofError, FramingError};
///
/// let err = CodecError::from(FramingError::UnknownStreamType { tag: 7 });
/// assert!(err.is_malformed());
/// assert!(!err.is_truncation());
///
/// let err = CodecError::from(EofError::MidHeader {
///     bytes_received: 5,
///     header_size: 8,
/// });
/// assert!(err.is_truncation());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed framing.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Truncated stream.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),

    /// A complete JSON value did not match the target record type.
    #[error("failed to decode {record} record: {source}")]
    Deserialize {
        /// Name of the record type being decoded.
        record: &'static str,
        /// Underlying `serde_json` error.
        #[source]
        source: serde_json::Error,
    },

    /// Error reported by the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns true if the peer sent bytes that violate the framing.
    #[must_use]
    pub fn is_malformed(&self) -> bool { matches!(self, Self::Framing(_)) }

    /// Returns true if the source ended with an incomplete frame buffered.
    #[must_use]
    pub fn is_truncation(&self) -> bool { matches!(self, Self::Eof(_)) }

    /// Returns true if the stream position is still valid after this error.
    ///
    /// Only deserialization failures qualify: the value's bytes were consumed
    /// before decoding, so the next call starts at the following value.
    #[must_use]
    pub fn is_recoverable(&self) -> bool { matches!(self, Self::Deserialize { .. }) }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"eof"`, `"deserialize"` or `"io"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Eof(_) => "eof",
            Self::Deserialize { .. } => "deserialize",
            Self::Io(_) => "io",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            err @ (CodecError::Framing(_) | CodecError::Deserialize { .. }) => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
