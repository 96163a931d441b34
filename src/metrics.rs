//! Metric helpers for `dockerframe`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking frames handed to handlers.
pub const FRAMES_DECODED: &str = "dockerframe_frames_decoded_total";
/// Name of the counter tracking decode errors, labelled by error type.
pub const DECODE_ERRORS: &str = "dockerframe_decode_errors_total";

/// Record a decoded frame.
pub fn inc_frames() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DECODED).increment(1);
}

/// Record a decode error of the given [`crate::codec::CodecError::error_type`].
pub fn inc_errors(error_type: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS, "type" => error_type).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = error_type;
}
