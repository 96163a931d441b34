//! Unit tests for the multiplex codec.
//!
//! Covers header parsing, partial buffers, the stdin policy and EOF
//! classification.

use bytes::{Bytes, BytesMut};
use rstest::{fixture, rstest};
use tokio_util::codec::{Decoder, Encoder};
use tracing_test::traced_test;

use super::*;

fn wire(tag: u8, payload: &[u8]) -> Vec<u8> {
    let length = u32::try_from(payload.len()).expect("test payload fits in u32");
    let mut bytes = vec![tag, 0, 0, 0];
    bytes.extend_from_slice(&write_network_u32(length));
    bytes.extend_from_slice(payload);
    bytes
}

#[fixture]
fn codec() -> MultiplexCodec { MultiplexCodec::default() }

#[rstest]
fn decodes_stdout_frame(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::from(&wire(1, b"hello")[..]);

    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("expected a frame");

    assert_eq!(frame, MultiplexFrame::new(StreamType::Stdout, &b"hello"[..]));
    assert!(buf.is_empty());
}

#[rstest]
fn partial_header_is_left_in_buffer(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::from(&wire(2, b"oops")[..5]);

    assert!(codec.decode(&mut buf).expect("decode should succeed").is_none());
    assert_eq!(buf.len(), 5, "buffer must not be consumed");
}

#[rstest]
fn partial_payload_is_left_in_buffer(mut codec: MultiplexCodec) {
    let bytes = wire(2, b"partial");
    let mut buf = BytesMut::from(&bytes[..10]);

    assert!(codec.decode(&mut buf).expect("decode should succeed").is_none());
    assert_eq!(&buf[..], &bytes[..10]);

    buf.extend_from_slice(&bytes[10..]);
    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(frame.stream, StreamType::Stderr);
    assert_eq!(&frame.payload[..], b"partial");
}

#[rstest]
fn extracts_every_frame_from_one_read(mut codec: MultiplexCodec) {
    let mut bytes = wire(1, b"one");
    bytes.extend(wire(2, b"two"));
    bytes.extend(wire(1, b"three"));
    let mut buf = BytesMut::from(&bytes[..]);

    let mut frames = Vec::new();
    while let Some(frame) = codec.decode(&mut buf).expect("decode should succeed") {
        frames.push((frame.stream, frame.payload));
    }

    assert_eq!(
        frames,
        vec![
            (StreamType::Stdout, Bytes::from_static(b"one")),
            (StreamType::Stderr, Bytes::from_static(b"two")),
            (StreamType::Stdout, Bytes::from_static(b"three")),
        ]
    );
}

#[rstest]
fn zero_length_payload_is_emitted(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::from(&wire(1, b"")[..]);

    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("empty frames are still frames");

    assert_eq!(frame.stream, StreamType::Stdout);
    assert!(frame.payload.is_empty());
}

#[rstest]
fn reserved_bytes_are_not_part_of_the_length(mut codec: MultiplexCodec) {
    let mut bytes = wire(1, b"abc");
    bytes[1..4].copy_from_slice(&[0xff, 0xff, 0xff]);
    let mut buf = BytesMut::from(&bytes[..]);

    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(&frame.payload[..], b"abc");
}

#[rstest]
#[case::three(3)]
#[case::high(0x80)]
#[case::max(0xff)]
fn unknown_tag_is_malformed(mut codec: MultiplexCodec, #[case] tag: u8) {
    let mut buf = BytesMut::from(&wire(tag, b"x")[..]);

    let err = codec.decode(&mut buf).expect_err("tag must be rejected");

    assert!(err.is_malformed());
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::UnknownStreamType { tag: t }) if t == tag
    ));
}

#[test]
fn oversized_length_is_rejected_before_buffering() {
    let mut codec = MultiplexCodec::new(64);
    let mut buf = BytesMut::from(&[1, 0, 0, 0, 0, 0, 0x10, 0x00][..]);

    let err = codec.decode(&mut buf).expect_err("length above limit");

    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { size: 4096, max: 64 })
    ));
}

#[test]
#[traced_test]
fn stdin_frames_are_dropped_by_default() {
    let mut codec = MultiplexCodec::default();
    let mut bytes = wire(0, b"typed input");
    bytes.extend(wire(1, b"output"));
    let mut buf = BytesMut::from(&bytes[..]);

    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("stdout frame follows the dropped stdin frame");

    assert_eq!(frame.stream, StreamType::Stdout);
    assert!(buf.is_empty());
    assert!(logs_contain("dropping stdin frame"));
}

#[test]
fn stdin_frames_pass_through_when_configured() {
    let mut codec = MultiplexCodec::default().with_stdin_policy(StdinPolicy::PassThrough);
    let mut buf = BytesMut::from(&wire(0, b"typed input")[..]);

    let frame = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("stdin frame should be surfaced");

    assert_eq!(frame.stream, StreamType::Stdin);
    assert_eq!(&frame.payload[..], b"typed input");
}

#[rstest]
fn dropped_stdin_frame_alone_needs_more_input(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::from(&wire(0, b"input")[..]);

    assert!(codec.decode(&mut buf).expect("decode should succeed").is_none());
    assert!(buf.is_empty(), "the stdin frame is consumed even when dropped");
}

#[rstest]
fn decode_eof_with_empty_buffer_is_clean(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::new();
    assert!(matches!(codec.decode_eof(&mut buf), Ok(None)));
}

#[rstest]
fn decode_eof_returns_final_complete_frame(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::from(&wire(2, b"last")[..]);

    let frame = codec
        .decode_eof(&mut buf)
        .expect("decode should succeed")
        .expect("expected a frame");

    assert_eq!(&frame.payload[..], b"last");
    assert!(matches!(codec.decode_eof(&mut buf), Ok(None)));
}

#[rstest]
#[case::mid_header(
    &[1, 0, 0, 0, 0][..],
    EofError::MidHeader { bytes_received: 5, header_size: HEADER_LEN }
)]
#[case::mid_payload(
    &[1, 0, 0, 0, 0, 0, 0, 5, b'h', b'e'][..],
    EofError::MidFrame { bytes_received: 2, expected: 5 }
)]
#[case::header_only(
    &[2, 0, 0, 0, 0, 0, 0, 1][..],
    EofError::MidFrame { bytes_received: 0, expected: 1 }
)]
fn decode_eof_reports_truncation(
    mut codec: MultiplexCodec,
    #[case] leftover: &[u8],
    #[case] expected: EofError,
) {
    let mut buf = BytesMut::from(leftover);

    let err = codec.decode_eof(&mut buf).expect_err("truncated stream");

    assert!(err.is_truncation());
    assert!(matches!(err, CodecError::Eof(e) if e == expected));
}

#[rstest]
fn encoder_writes_wire_format(mut codec: MultiplexCodec) {
    let mut buf = BytesMut::new();

    codec
        .encode(MultiplexFrame::new(StreamType::Stderr, &b"boom"[..]), &mut buf)
        .expect("encode should succeed");

    assert_eq!(&buf[..], &wire(2, b"boom")[..]);
}

#[test]
fn encoder_rejects_oversized_payloads() {
    let mut codec = MultiplexCodec::new(64);
    let mut buf = BytesMut::new();

    let err = codec
        .encode(MultiplexFrame::new(StreamType::Stdout, vec![0_u8; 65]), &mut buf)
        .expect_err("payload above limit");

    assert!(err.is_malformed());
    assert!(buf.is_empty());
}

#[test]
fn stream_type_display_and_tags() {
    assert_eq!(StreamType::Stdout.to_string(), "stdout");
    assert_eq!(StreamType::Stderr.as_u8(), 2);
    assert_eq!(StreamType::try_from(0), Ok(StreamType::Stdin));
}
