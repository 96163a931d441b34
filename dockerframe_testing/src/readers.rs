//! Blocking readers replaying scripted response bodies.

use std::{
    collections::VecDeque,
    io::{self, Read},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// One scripted outcome of a read.
#[derive(Debug)]
pub enum ReadStep {
    /// Deliver these bytes, across several reads if the caller's buffer is
    /// smaller.
    Data(Vec<u8>),
    /// Fail the read with this error kind.
    Fail(io::ErrorKind),
}

/// Reader delivering a body in scripted chunks, then end of data.
///
/// Each read returns bytes from at most one step, so chunk boundaries are
/// exactly those of the script unless the caller's buffer is smaller.
#[derive(Debug)]
pub struct ChunkedReader {
    steps: VecDeque<ReadStep>,
    reads: Arc<AtomicUsize>,
}

impl ChunkedReader {
    /// Replay `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = ReadStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deliver `chunks` one per read.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::new(chunks.into_iter().map(|chunk| ReadStep::Data(chunk.into())))
    }

    /// Deliver `body` in chunks of `chunk_size` bytes. A zero size is
    /// treated as one.
    pub fn with_chunk_size(body: impl AsRef<[u8]>, chunk_size: usize) -> Self {
        Self::from_chunks(body.as_ref().chunks(chunk_size.max(1)).map(<[u8]>::to_vec))
    }

    /// Append a failing read after the scripted data.
    #[must_use]
    pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push_back(ReadStep::Fail(kind));
        self
    }

    /// Shared count of read calls made so far.
    #[must_use]
    pub fn read_counter(&self) -> Arc<AtomicUsize> { Arc::clone(&self.reads) }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            None => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted read failure")),
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.steps.push_front(ReadStep::Data(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

/// Endless reader repeating one record, never crossing a record boundary
/// within a single read.
#[derive(Clone, Debug)]
pub struct RepeatingReader {
    record: Vec<u8>,
    position: usize,
}

impl RepeatingReader {
    /// Repeat `record` forever.
    ///
    /// # Panics
    ///
    /// Panics if `record` is empty.
    pub fn new(record: impl Into<Vec<u8>>) -> Self {
        let record = record.into();
        assert!(!record.is_empty(), "record must not be empty");
        Self {
            record,
            position: 0,
        }
    }
}

impl Read for RepeatingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.record[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position = (self.position + n) % self.record.len();
        Ok(n)
    }
}
