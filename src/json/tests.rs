//! Unit tests for the JSON stream codec.

use bytes::BytesMut;
use rstest::rstest;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::codec::Decoder;

use super::*;

#[derive(Debug, Deserialize, PartialEq)]
struct Line {
    stream: String,
}

fn decode_all<T: DeserializeOwned>(codec: &mut JsonStreamCodec<T>, input: &[u8]) -> Vec<T> {
    let mut buf = BytesMut::from(input);
    let mut records = Vec::new();
    while let Some(record) = codec.decode_eof(&mut buf).expect("decode should succeed") {
        records.push(record);
    }
    records
}

#[rstest]
#[case::no_delimiter(&br#"{"a":1}{"a":2}{"a":3}"#[..])]
#[case::newlines(&b"{\"a\":1}\n{\"a\":2}\r\n{\"a\":3}\n"[..])]
#[case::mixed_whitespace(&b"  \t{\"a\":1} {\"a\":2}\n\n {\"a\":3}  "[..])]
fn extracts_every_value(#[case] input: &[u8]) {
    let mut codec = JsonStreamCodec::<Value>::default();

    let records = decode_all(&mut codec, input);

    assert_eq!(records, vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
}

#[test]
fn braces_inside_strings_do_not_end_the_value() {
    let mut codec = JsonStreamCodec::<Line>::default();

    let records = decode_all(&mut codec, br#"{"stream":"a { b"}{"stream":"} ] [ {{"}"#);

    assert_eq!(
        records,
        vec![
            Line {
                stream: "a { b".to_owned()
            },
            Line {
                stream: "} ] [ {{".to_owned()
            },
        ]
    );
}

#[rstest]
#[case::escaped_quote(br#"{"stream":"say \"}\" please"}"#, "say \"}\" please")]
#[case::escaped_backslash(br#"{"stream":"C:\\"}"#, "C:\\")]
#[case::backslash_then_quote(br#"{"stream":"\\\"}"}"#, "\\\"}")]
fn escapes_are_respected(#[case] input: &[u8], #[case] expected: &str) {
    let mut codec = JsonStreamCodec::<Line>::default();

    let records = decode_all(&mut codec, input);

    assert_eq!(
        records,
        vec![Line {
            stream: expected.to_owned()
        }]
    );
}

#[test]
fn nested_values_and_arrays_are_tracked() {
    let mut codec = JsonStreamCodec::<Value>::default();

    let records = decode_all(
        &mut codec,
        br#"{"aux":{"ID":"sha256:1","List":[{"x":[1,2]}]}}[1,[2]]"#,
    );

    assert_eq!(
        records,
        vec![
            json!({"aux": {"ID": "sha256:1", "List": [{"x": [1, 2]}]}}),
            json!([1, [2]]),
        ]
    );
}

#[test]
fn incomplete_value_waits_for_more_input() {
    let mut codec = JsonStreamCodec::<Line>::default();
    let input = br#"{"stream":"a { b"}"#;
    let mut buf = BytesMut::from(&input[..9]);

    assert!(codec.decode(&mut buf).expect("decode should succeed").is_none());
    assert_eq!(buf.len(), 9, "partial value stays buffered");

    buf.extend_from_slice(&input[9..]);
    let record = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("complete value");
    assert_eq!(record.stream, "a { b");
    assert!(buf.is_empty());
}

#[test]
fn split_inside_escape_sequence_is_resumed() {
    let mut codec = JsonStreamCodec::<Line>::default();
    let input = br#"{"stream":"x\"}"}"#;
    let split = input
        .iter()
        .position(|b| *b == b'\\')
        .expect("input has a backslash")
        + 1;
    let mut buf = BytesMut::from(&input[..split]);

    assert!(codec.decode(&mut buf).expect("decode should succeed").is_none());
    buf.extend_from_slice(&input[split..]);

    let record = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("complete value");
    assert_eq!(record.stream, "x\"}");
}

#[test]
fn trailing_whitespace_is_consumed_with_the_value() {
    let mut codec = JsonStreamCodec::<Value>::default();
    let mut buf = BytesMut::from(&b"{\"a\":1}\r\n  "[..]);

    codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("complete value");

    assert!(buf.is_empty());
}

#[test]
fn schema_mismatch_is_reported_and_stream_continues() {
    let mut codec = JsonStreamCodec::<Line>::default();
    let mut buf = BytesMut::from(&br#"{"stream":42}{"stream":"ok"}"#[..]);

    let err = codec.decode(&mut buf).expect_err("42 is not a string");
    assert!(err.is_recoverable());
    assert!(matches!(err, CodecError::Deserialize { record: "Line", .. }));

    let next = codec
        .decode(&mut buf)
        .expect("decode should succeed")
        .expect("next value");
    assert_eq!(next.stream, "ok");
}

#[rstest]
#[case::scalar(&b"42"[..], FramingError::UnexpectedByte { byte: b'4', offset: 0 })]
#[case::top_level_string(&br#""text""#[..], FramingError::UnexpectedByte { byte: b'"', offset: 0 })]
#[case::garbage_between_values(
    &br#"{"a":1},{"a":2}"#[..],
    FramingError::UnexpectedByte { byte: b',', offset: 0 }
)]
#[case::stray_close(&b"}"[..], FramingError::UnbalancedDelimiter { byte: b'}', offset: 0 })]
fn malformed_input_is_rejected(#[case] input: &[u8], #[case] expected: FramingError) {
    let mut codec = JsonStreamCodec::<Value>::default();
    let mut buf = BytesMut::from(input);

    let result = (0..3).try_for_each(|_| codec.decode(&mut buf).map(drop));

    let err = result.expect_err("malformed input");
    assert!(matches!(err, CodecError::Framing(e) if e == expected));
}

#[test]
fn unterminated_value_at_eof_is_truncation() {
    let mut codec = JsonStreamCodec::<Value>::default();
    let mut buf = BytesMut::from(&br#"{"status":"Downloading","progressDetail":{"current":1"#[..]);

    let err = codec.decode_eof(&mut buf).expect_err("unterminated value");

    assert!(matches!(
        err,
        CodecError::Eof(EofError::UnterminatedValue { depth: 2, .. })
    ));
}

#[test]
fn whitespace_only_tail_is_a_clean_end() {
    let mut codec = JsonStreamCodec::<Value>::default();
    let mut buf = BytesMut::from(&b"\n\n  \n"[..]);

    assert!(matches!(codec.decode_eof(&mut buf), Ok(None)));
}

#[test]
fn oversized_partial_value_is_rejected() {
    let mut codec = JsonStreamCodec::<Value>::new(64);
    let mut buf = BytesMut::from(format!("{{\"stream\":\"{}", "x".repeat(80)).as_bytes());

    let err = codec.decode(&mut buf).expect_err("value above limit");

    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { max: 64, .. })
    ));
}

#[test]
fn record_names_drop_module_paths() {
    assert_eq!(record_name::<crate::models::BuildInfo>(), "BuildInfo");
    assert_eq!(record_name::<Vec<Value>>(), "Vec");
}
