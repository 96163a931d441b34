#![doc(html_root_url = "https://docs.rs/dockerframe/latest")]
//! Public API for the `dockerframe` library.
//!
//! This crate decodes the streaming response bodies of the Docker Engine
//! API: multiplexed attach, exec and logs output, websocket attach streams,
//! and the concatenated JSON progress of build, pull, push and events. A
//! [`FrameStream`] drains a blocking byte source through one of the frame
//! readers and dispatches each decoded frame to registered handlers;
//! [`AsyncFrameStream`] does the same over `tokio` readers.

pub mod byte_order;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod framed;
pub mod handler;
pub mod json;
pub mod metrics;
pub mod models;
pub mod multiplex;
pub mod source;
pub mod stream;
pub mod websocket;

pub use codec::{CodecError, EofError, FramingError};
pub use config::{DecoderConfig, InnerFraming, StdinPolicy};
pub use endpoint::{Endpoint, StreamFormat};
pub use framed::AsyncFrameStream;
pub use handler::{HandlerError, HandlerRegistry};
pub use json::JsonStreamCodec;
pub use metrics::{DECODE_ERRORS, FRAMES_DECODED};
pub use models::{BuildInfo, CreateImageInfo, EventMessage, PushImageInfo, Record, RecordKind};
pub use multiplex::{MultiplexCodec, MultiplexFrame, StreamType};
pub use source::{Body, ByteSource, CloseHandle};
pub use stream::{
    BuildStream,
    CreateImageStream,
    DrainError,
    EventStream,
    FrameStream,
    JsonStream,
    MultiplexStream,
    PushStream,
    WebSocketStream,
};
pub use websocket::{UpgradeRequest, WebSocketCodec};
