//! Blocking byte sources feeding the drain loop.
//!
//! A [`ByteSource`] is the response body of one streaming endpoint. A read
//! returning `0` is the end-of-data signal; after [`ByteSource::close`] every
//! read returns `0`.

use std::{
    io::{self, Read},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// A blocking, closable source of response body bytes.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes. `Ok(0)` means end of data.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Stop producing data. Later reads return `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the transport fails.
    fn close(&mut self) -> io::Result<()>;
}

impl<B: ByteSource + ?Sized> ByteSource for &mut B {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> { (**self).read(buf) }

    fn close(&mut self) -> io::Result<()> { (**self).close() }
}

impl<B: ByteSource + ?Sized> ByteSource for Box<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> { (**self).read(buf) }

    fn close(&mut self) -> io::Result<()> { (**self).close() }
}

/// [`ByteSource`] over any blocking reader.
///
/// Closing drops the reader, releasing the underlying connection. The
/// [`CloseHandle`] returned by [`Body::close_handle`] lets another thread
/// close the body while a drain is running; the drain observes end of data
/// on its next read.
///
/// # Examples
///
/// ```
/// use dockerframe::source::{Body, ByteSource};
///
/// let mut body = Body::new(&b"abc"[..]);
/// let mut buf = [0u8; 8];
/// assert_eq!(body.read(&mut buf).expect("in-memory read"), 3);
/// assert_eq!(body.read(&mut buf).expect("in-memory read"), 0);
/// assert!(body.is_eof());
/// ```
#[derive(Debug)]
pub struct Body<R> {
    inner: Option<R>,
    closed: Arc<AtomicBool>,
    eof: bool,
}

impl<R: Read> Body<R> {
    /// Wrap a blocking reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(inner),
            closed: Arc::new(AtomicBool::new(false)),
            eof: false,
        }
    }

    /// Handle for closing this body from elsewhere.
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            closed: Arc::clone(&self.closed),
        }
    }

    /// Returns true once a read has reported end of data or the body has
    /// been closed.
    #[must_use]
    pub fn is_eof(&self) -> bool { self.eof || self.closed.load(Ordering::Acquire) }

    /// Return the reader, unless the body has been closed.
    pub fn into_inner(self) -> Option<R> { self.inner }
}

impl<R: Read> ByteSource for Body<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed.load(Ordering::Acquire) {
            self.inner = None;
        }
        let Some(reader) = self.inner.as_mut() else {
            self.eof = true;
            return Ok(0);
        };
        loop {
            match reader.read(buf) {
                Ok(0) if !buf.is_empty() => {
                    self.eof = true;
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);
        self.inner = None;
        Ok(())
    }
}

/// Cloneable handle closing a [`Body`] out of band.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    /// Close the body. Its next read returns end of data.
    pub fn close(&self) { self.closed.store(true, Ordering::Release); }

    /// Returns true if the body has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
