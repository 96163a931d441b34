//! Unit tests for the blocking drain loop.

use std::{collections::VecDeque, io};

use serde::Deserialize;

use super::*;
use crate::{codec::FramingError, source::Body};

/// Source replaying scripted reads and recording the requested sizes.
#[derive(Default)]
struct Scripted {
    reads: VecDeque<io::Result<Vec<u8>>>,
    requested: Vec<usize>,
    closed: bool,
}

impl Scripted {
    fn new(reads: impl IntoIterator<Item = io::Result<Vec<u8>>>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl ByteSource for Scripted {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.requested.push(buf.len());
        if self.closed {
            return Ok(0);
        }
        match self.reads.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.reads.push_front(Ok(chunk.split_off(n)));
                }
                Ok(n)
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Tick {
    n: u32,
}

#[test]
fn reads_are_bounded_by_chunk_size() {
    let source = Scripted::new([Ok(vec![1, 0, 0, 0, 0, 0, 0, 3, b'a', b'b', b'c'])]);
    let config = DecoderConfig::default().read_chunk_size(4);
    let mut stream = FrameStream::multiplexed(source, &config);

    let frames: Vec<_> = stream.by_ref().collect::<Result<_, _>>().expect("valid stream");

    assert_eq!(frames, vec![MultiplexFrame::new(StreamType::Stdout, &b"abc"[..])]);
    assert!(stream.get_ref().requested.iter().all(|&len| len == 4));
    assert_eq!(stream.frames_decoded(), 1);
    assert!(stream.is_exhausted());
}

#[test]
fn deserialize_error_does_not_exhaust_iterator() {
    let source = Body::new(&br#"{"n":1}{"n":"two"}{"n":3}"#[..]);
    let stream = FrameStream::<_, JsonStreamCodec<Tick>>::json(source, &DecoderConfig::default());

    let results: Vec<_> = stream.collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().ok(), Some(&Tick { n: 1 }));
    assert!(matches!(results[1], Err(CodecError::Deserialize { .. })));
    assert_eq!(results[2].as_ref().ok(), Some(&Tick { n: 3 }));
}

#[test]
fn framing_error_exhausts_iterator() {
    let source = Body::new(&[9, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0][..]);
    let mut stream = FrameStream::multiplexed(source, &DecoderConfig::default());

    let first = stream.next().expect("an error is yielded");

    assert!(matches!(
        first,
        Err(CodecError::Framing(FramingError::UnknownStreamType { tag: 9 }))
    ));
    assert!(stream.next().is_none());
    assert!(stream.is_exhausted());
}

#[test]
fn transport_error_is_returned_unchanged() {
    let source = Scripted::new([
        Ok(vec![1, 0, 0]),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
    ]);
    let mut stream = FrameStream::multiplexed(source, &DecoderConfig::default());

    let err = stream.wait().expect_err("transport failure");

    match err {
        DrainError::Codec(CodecError::Io(e)) => {
            assert_eq!(e.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stream.buffered(), 3);
}

#[test]
fn close_and_read_closes_source_before_draining() {
    let source = Scripted::new([Ok(vec![2, 0, 0, 0, 0, 0, 0, 1, b'!'])]);
    let mut stream = FrameStream::multiplexed(source, &DecoderConfig::default());

    stream.close_and_read().expect("nothing buffered");

    assert!(stream.get_ref().closed);
    assert_eq!(stream.frames_decoded(), 0);
}

#[test]
fn drain_error_converts_to_io_error() {
    let handler: DrainError = DrainError::Handler("stop".into());
    let truncated: DrainError = CodecError::from(crate::codec::EofError::MidHeader {
        bytes_received: 1,
        header_size: 8,
    })
    .into();

    assert_eq!(io::Error::from(handler).kind(), io::ErrorKind::Other);
    assert_eq!(io::Error::from(truncated).kind(), io::ErrorKind::UnexpectedEof);
}
