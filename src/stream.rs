//! Blocking drain loop over a byte source.
//!
//! [`FrameStream`] owns a [`ByteSource`], a frame reader and the buffer
//! between them. [`FrameStream::wait`] reads until end of data and hands
//! every decoded frame to the registered handlers, in registration order,
//! before asking for the next frame. The same loop is available in pull form
//! through [`FrameStream::next_frame`] and the [`Iterator`] impl.
//!
//! ```
//! use dockerframe::{source::Body, stream::FrameStream};
//!
//! let wire = [1, 0, 0, 0, 0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'];
//! let mut stream = FrameStream::multiplexed(Body::new(&wire[..]), &Default::default());
//! stream.on_output(|stream_type, payload| println!("{stream_type}: {payload:?}"));
//! stream.wait().expect("well-formed stream");
//! ```

use std::io;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::codec::Decoder;

use crate::{
    codec::{CodecError, FrameReader},
    config::DecoderConfig,
    handler::{HandlerError, HandlerRegistry},
    json::JsonStreamCodec,
    metrics,
    models::{BuildInfo, CreateImageInfo, EventMessage, PushImageInfo},
    multiplex::{MultiplexCodec, MultiplexFrame, StreamType},
    source::ByteSource,
    websocket::{UpgradeRequest, WebSocketCodec},
};

/// Error ending a drain.
#[derive(Debug, Error)]
pub enum DrainError {
    /// The stream could not be decoded or read.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A handler rejected a frame.
    #[error("frame handler failed: {0}")]
    Handler(#[source] HandlerError),
}

impl From<io::Error> for DrainError {
    fn from(e: io::Error) -> Self { Self::Codec(CodecError::Io(e)) }
}

impl From<DrainError> for io::Error {
    fn from(e: DrainError) -> Self {
        match e {
            DrainError::Codec(e) => e.into(),
            DrainError::Handler(e) => io::Error::other(e),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Reading from the source.
    Streaming,
    /// The source reported end of data; flushing buffered frames.
    Draining,
    /// Nothing more will be produced.
    Exhausted,
}

/// A single-use stream of frames decoded from one byte source.
pub struct FrameStream<S, D: Decoder> {
    source: S,
    decoder: D,
    buffer: BytesMut,
    handlers: HandlerRegistry<D::Item>,
    read_chunk_size: usize,
    state: State,
    frames: u64,
}

/// Stream of stdout/stderr frames from attach, exec or logs.
pub type MultiplexStream<S> = FrameStream<S, MultiplexCodec>;
/// Stream of output frames from a websocket attach.
pub type WebSocketStream<S> = FrameStream<S, WebSocketCodec>;
/// Stream of records from a JSON progress endpoint.
pub type JsonStream<S, T> = FrameStream<S, JsonStreamCodec<T>>;
/// `POST /build` progress.
pub type BuildStream<S> = JsonStream<S, BuildInfo>;
/// `POST /images/create` progress.
pub type CreateImageStream<S> = JsonStream<S, CreateImageInfo>;
/// `POST /images/{name}/push` progress.
pub type PushStream<S> = JsonStream<S, PushImageInfo>;
/// `GET /events` messages.
pub type EventStream<S> = JsonStream<S, EventMessage>;

impl<S, D> FrameStream<S, D>
where
    S: ByteSource,
    D: FrameReader,
{
    /// Wrap `source` with `decoder` using default settings.
    pub fn new(source: S, decoder: D) -> Self {
        Self::with_config(source, decoder, &DecoderConfig::default())
    }

    /// Wrap `source` with `decoder`, reading `config.chunk_size()` bytes at
    /// a time.
    pub fn with_config(source: S, decoder: D, config: &DecoderConfig) -> Self {
        Self {
            source,
            decoder,
            buffer: BytesMut::new(),
            handlers: HandlerRegistry::new(),
            read_chunk_size: config.chunk_size(),
            state: State::Streaming,
            frames: 0,
        }
    }

    /// Subscribe `handler` to every decoded frame.
    pub fn on_frame<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&D::Item) + Send + 'static,
    {
        self.handlers.push(handler);
        self
    }

    /// Subscribe a handler whose error aborts the drain.
    pub fn try_on_frame<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&D::Item) -> Result<(), HandlerError> + Send + 'static,
    {
        self.handlers.push_fallible(handler);
        self
    }

    /// Decode the next frame, reading from the source as needed.
    ///
    /// Returns `Ok(None)` once the source is exhausted and every buffered
    /// frame has been returned. Handlers are not invoked.
    ///
    /// # Errors
    ///
    /// Returns decoding, truncation and transport errors. Only
    /// [`CodecError::Deserialize`] leaves the stream usable; after any other
    /// error the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<D::Item>, CodecError> {
        loop {
            match self.state {
                State::Exhausted => return Ok(None),
                State::Draining => {
                    return match self.decoder.decode_eof(&mut self.buffer) {
                        Ok(Some(frame)) => Ok(Some(self.count(frame))),
                        Ok(None) => {
                            self.finish();
                            Ok(None)
                        }
                        Err(e) => Err(self.fail(e)),
                    };
                }
                State::Streaming => {
                    match self.decoder.decode(&mut self.buffer) {
                        Ok(Some(frame)) => return Ok(Some(self.count(frame))),
                        Ok(None) => {}
                        Err(e) => return Err(self.fail(e)),
                    }
                    if self.fill()? == 0 {
                        self.state = State::Draining;
                    }
                }
            }
        }
    }

    /// Drain the stream, dispatching every frame to the handlers.
    ///
    /// Returns immediately if the stream is already exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first decoding or transport error, or the first handler
    /// error. A panicking handler unwinds through this call.
    pub fn wait(&mut self) -> Result<(), DrainError> {
        while let Some(frame) = self.next_frame()? {
            self.handlers.dispatch(&frame).map_err(DrainError::Handler)?;
        }
        Ok(())
    }

    /// Close the source, then drain what is already buffered.
    ///
    /// # Errors
    ///
    /// As [`FrameStream::wait`]. A partial frame left in the buffer is a
    /// truncation error.
    pub fn close_and_read(&mut self) -> Result<(), DrainError> {
        if self.state == State::Streaming {
            self.source.close()?;
            tracing::debug!(buffered = self.buffer.len(), "source closed before drain");
        }
        self.wait()
    }

    /// Close the source and drop the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to close.
    pub fn close(mut self) -> io::Result<()> { self.source.close() }

    /// Returns true once no further frames will be produced.
    #[must_use]
    pub fn is_exhausted(&self) -> bool { self.state == State::Exhausted }

    /// Number of frames decoded so far.
    #[must_use]
    pub fn frames_decoded(&self) -> u64 { self.frames }

    /// Bytes read from the source but not yet part of a decoded frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Borrow the source.
    pub fn get_ref(&self) -> &S { &self.source }

    /// Mutably borrow the source.
    pub fn get_mut(&mut self) -> &mut S { &mut self.source }

    /// Borrow the frame reader.
    pub fn decoder(&self) -> &D { &self.decoder }

    /// Return the source, discarding buffered bytes and handlers.
    pub fn into_inner(self) -> S { self.source }

    fn fill(&mut self) -> Result<usize, CodecError> {
        let len = self.buffer.len();
        self.buffer.resize(len + self.read_chunk_size, 0);
        let read = match self.source.read(&mut self.buffer[len..]) {
            Ok(read) => read,
            Err(e) => {
                self.buffer.truncate(len);
                return Err(self.fail(e.into()));
            }
        };
        self.buffer.truncate(len + read);
        tracing::trace!(read.bytes = read, buffered = self.buffer.len(), "source read");
        Ok(read)
    }

    fn count(&mut self, frame: D::Item) -> D::Item {
        self.frames += 1;
        metrics::inc_frames();
        frame
    }

    fn fail(&mut self, e: CodecError) -> CodecError {
        metrics::inc_errors(e.error_type());
        tracing::debug!(
            error = %e,
            error_type = e.error_type(),
            buffered = self.buffer.len(),
            "frame stream error"
        );
        if !e.is_recoverable() {
            self.state = State::Exhausted;
        }
        e
    }

    fn finish(&mut self) {
        self.state = State::Exhausted;
        tracing::debug!(frames = self.frames, "frame stream drained");
    }
}

impl<S, D> FrameStream<S, D>
where
    S: ByteSource,
    D: FrameReader<Item = MultiplexFrame>,
{
    /// Subscribe a handler receiving the channel and payload of each frame.
    pub fn on_output<F>(&mut self, mut handler: F) -> &mut Self
    where
        F: FnMut(StreamType, &[u8]) + Send + 'static,
    {
        self.on_frame(move |frame: &MultiplexFrame| handler(frame.stream, &frame.payload))
    }
}

impl<S: ByteSource> FrameStream<S, MultiplexCodec> {
    /// Decode a multiplexed attach, exec or logs body.
    pub fn multiplexed(source: S, config: &DecoderConfig) -> Self {
        Self::with_config(source, MultiplexCodec::from_config(config), config)
    }
}

impl<S: ByteSource> FrameStream<S, WebSocketCodec> {
    /// Decode an upgraded websocket attach body.
    pub fn websocket(source: S, config: &DecoderConfig) -> Self {
        Self::with_config(source, WebSocketCodec::from_config(config), config)
    }

    /// Open a websocket attach stream with a fresh upgrade request.
    ///
    /// `connect` performs the upgrade with the given headers and returns the
    /// upgraded body. It is called exactly once.
    ///
    /// # Errors
    ///
    /// Returns the error from `connect`.
    pub fn open_websocket<F>(connect: F, config: &DecoderConfig) -> io::Result<Self>
    where
        F: FnOnce(&UpgradeRequest) -> io::Result<S>,
    {
        Self::open_websocket_with(UpgradeRequest::new(), connect, config)
    }

    /// As [`FrameStream::open_websocket`] with a caller-built request.
    ///
    /// # Errors
    ///
    /// Returns the error from `connect`.
    pub fn open_websocket_with<F>(
        request: UpgradeRequest,
        connect: F,
        config: &DecoderConfig,
    ) -> io::Result<Self>
    where
        F: FnOnce(&UpgradeRequest) -> io::Result<S>,
    {
        let source = connect(&request)?;
        tracing::debug!(host = request.headers()[0].1, "websocket attach opened");
        Ok(Self::websocket(source, config))
    }
}

impl<S: ByteSource, T: DeserializeOwned> FrameStream<S, JsonStreamCodec<T>> {
    /// Decode a JSON progress body into records of type `T`.
    pub fn json(source: S, config: &DecoderConfig) -> Self {
        Self::with_config(source, JsonStreamCodec::from_config(config), config)
    }
}

impl<S, D> Iterator for FrameStream<S, D>
where
    S: ByteSource,
    D: FrameReader,
{
    type Item = Result<D::Item, CodecError>;

    fn next(&mut self) -> Option<Self::Item> { self.next_frame().transpose() }
}

impl<S, D> std::fmt::Debug for FrameStream<S, D>
where
    D: Decoder + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("decoder", &self.decoder)
            .field("buffered", &self.buffer.len())
            .field("handlers", &self.handlers)
            .field("read_chunk_size", &self.read_chunk_size)
            .field("state", &self.state)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
