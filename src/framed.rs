//! Asynchronous drain over a [`tokio::io::AsyncRead`] body.
//!
//! [`AsyncFrameStream`] drives the same frame readers as
//! [`FrameStream`](crate::stream::FrameStream) through
//! [`tokio_util::codec::FramedRead`], dispatching to a
//! [`HandlerRegistry`] in the same order.

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::{
    codec::{Decoder, FramedRead},
    sync::CancellationToken,
};

use crate::{
    codec::{CodecError, FrameReader},
    config::DecoderConfig,
    handler::{HandlerError, HandlerRegistry},
    metrics,
    multiplex::{MultiplexFrame, StreamType},
    stream::DrainError,
};

/// Asynchronous twin of [`FrameStream`](crate::stream::FrameStream).
pub struct AsyncFrameStream<R, D: Decoder> {
    framed: FramedRead<R, D>,
    handlers: HandlerRegistry<D::Item>,
    frames: u64,
    done: bool,
}

impl<R, D> AsyncFrameStream<R, D>
where
    R: AsyncRead + Unpin,
    D: FrameReader,
{
    /// Wrap `reader` with `decoder` using default settings.
    pub fn new(reader: R, decoder: D) -> Self {
        Self::with_config(reader, decoder, &DecoderConfig::default())
    }

    /// Wrap `reader` with `decoder`, starting with a read buffer of
    /// `config.chunk_size()` bytes.
    pub fn with_config(reader: R, decoder: D, config: &DecoderConfig) -> Self {
        Self {
            framed: FramedRead::with_capacity(reader, decoder, config.chunk_size()),
            handlers: HandlerRegistry::new(),
            frames: 0,
            done: false,
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

    /// Decode the next frame without dispatching it.
    ///
    /// # Errors
    ///
    /// Returns decoding, truncation and transport errors.
    pub async fn next_frame(&mut self) -> Result<Option<D::Item>, CodecError> {
        if self.done {
            return Ok(None);
        }
        match self.framed.next().await.transpose() {
            Ok(Some(frame)) => Ok(Some(self.count(frame))),
            Ok(None) => {
                self.finish();
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Drain to end of data, dispatching every frame.
    ///
    /// # Errors
    ///
    /// Returns the first decoding, transport or handler error.
    pub async fn wait(&mut self) -> Result<(), DrainError> {
        while let Some(frame) = self.next_frame().await? {
            self.handlers.dispatch(&frame).map_err(DrainError::Handler)?;
        }
        Ok(())
    }

    /// Drain until end of data or until `token` is cancelled.
    ///
    /// On cancellation no further reads are made; complete frames already
    /// buffered are dispatched and a partial frame is a truncation error.
    ///
    /// # Errors
    ///
    /// As [`AsyncFrameStream::wait`].
    pub async fn wait_with_cancellation(
        &mut self,
        token: &CancellationToken,
    ) -> Result<(), DrainError> {
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                frame = self.next_frame() => Some(frame?),
            };
            match next {
                None => break,
                Some(None) => return Ok(()),
                Some(Some(frame)) => {
                    self.handlers.dispatch(&frame).map_err(DrainError::Handler)?;
                }
            }
        }

        if self.done {
            return Ok(());
        }
        tracing::debug!(
            buffered = self.framed.read_buffer().len(),
            "drain cancelled, flushing buffered frames"
        );
        let mut buffer = std::mem::take(self.framed.read_buffer_mut());
        loop {
            match self.framed.decoder_mut().decode_eof(&mut buffer) {
                Ok(Some(frame)) => {
                    let frame = self.count(frame);
                    self.handlers.dispatch(&frame).map_err(DrainError::Handler)?;
                }
                Ok(None) => break,
                Err(e) => return Err(self.fail(e).into()),
            }
        }
        self.finish();
        Ok(())
    }

    /// Number of frames decoded so far.
    #[must_use]
    pub fn frames_decoded(&self) -> u64 { self.frames }

    /// Return the reader, discarding buffered bytes and handlers.
    pub fn into_inner(self) -> R { self.framed.into_inner() }

    fn count(&mut self, frame: D::Item) -> D::Item {
        self.frames += 1;
        metrics::inc_frames();
        frame
    }

    fn fail(&mut self, e: CodecError) -> CodecError {
        metrics::inc_errors(e.error_type());
        tracing::debug!(error = %e, error_type = e.error_type(), "frame stream error");
        if !e.is_recoverable() {
            self.done = true;
        }
        e
    }

    fn finish(&mut self) {
        self.done = true;
        tracing::debug!(frames = self.frames, "frame stream drained");
    }
}

impl<R, D> AsyncFrameStream<R, D>
where
    R: AsyncRead + Unpin,
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
