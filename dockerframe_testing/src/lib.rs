//! Utilities for exercising `dockerframe` decoders and drain loops in tests.
//!
//! The readers here replay captured response bodies in caller-chosen
//! chunks, the wire helpers build multiplex and websocket bytes directly, and
//! [`Recorder`] collects dispatched frames for assertions.
//!
//! ```rust
//! use dockerframe::{Body, FrameStream, StreamType};
//! use dockerframe_testing::{ChunkedReader, Recorder, multiplexed_frame};
//!
//! let wire = multiplexed_frame(StreamType::Stdout, b"hello");
//! let reader = ChunkedReader::with_chunk_size(wire, 3);
//! let recorder = Recorder::new();
//! let mut stream = FrameStream::multiplexed(Body::new(reader), &Default::default());
//! stream.on_frame(recorder.handler());
//! stream.wait().expect("valid stream");
//! assert_eq!(recorder.len(), 1);
//! ```

pub mod readers;
pub mod recorder;
pub mod runner;
pub mod wire;

pub use readers::{ChunkedReader, ReadStep, RepeatingReader};
pub use recorder::Recorder;
pub use runner::{chunked, deterministic_runner, split_points_strategy};
pub use wire::{
    json_stream,
    masked_websocket_frame,
    multiplexed_frame,
    multiplexed_wire,
    websocket_frame,
};
