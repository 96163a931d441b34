//! Draining JSON progress bodies into typed records.

use dockerframe::{
    Body,
    BuildInfo,
    BuildStream,
    CodecError,
    CreateImageInfo,
    DecoderConfig,
    DrainError,
    EofError,
    EventMessage,
    FrameStream,
    JsonStreamCodec,
    PushImageInfo,
};
use dockerframe_testing::{ChunkedReader, Recorder, json_stream};
use rstest::rstest;
use serde_json::Value;

#[test]
fn braces_inside_strings_do_not_split_records() {
    let body = br#"{"Stream":"a { b"}{"Stream":"c"}"#;
    let reader = ChunkedReader::from_chunks([&body[..10], &body[10..]]);
    let recorder = Recorder::new();
    let mut stream: BuildStream<_> = FrameStream::json(Body::new(reader), &DecoderConfig::default());
    stream.on_frame(recorder.handler());

    stream.wait().expect("valid stream");

    let streams: Vec<_> = recorder
        .frames()
        .into_iter()
        .map(|info: BuildInfo| info.stream)
        .collect();
    assert_eq!(streams, vec![Some("a { b".to_owned()), Some("c".to_owned())]);
}

#[rstest]
#[case::concatenated("")]
#[case::newline("\n")]
#[case::crlf_and_spaces(" \r\n  ")]
fn record_count_is_independent_of_separators_and_reads(
    #[case] separator: &str,
    #[values(1, 3, 17, 4096)] chunk_size: usize,
) {
    let body = json_stream(
        &[
            r#"{"status":"Pulling from library/alpine","id":"latest"}"#,
            r#"{"status":"Downloading","progressDetail":{"current":512,"total":2048},"id":"a0d0"}"#,
            r#"{"status":"Pull complete","progressDetail":{},"id":"a0d0"}"#,
            r#"{"status":"Status: Downloaded newer image for alpine:latest"}"#,
        ],
        separator,
    );
    let stream = FrameStream::<_, JsonStreamCodec<CreateImageInfo>>::json(
        Body::new(ChunkedReader::with_chunk_size(&body, chunk_size)),
        &DecoderConfig::default(),
    );

    let records: Vec<_> = stream.collect::<Result<_, _>>().expect("valid stream");

    assert_eq!(records.len(), 4);
    assert_eq!(records[1].progress_detail.as_ref().and_then(|p| p.total), Some(2048));
    assert_eq!(records[3].id, None);
}

#[test]
fn push_error_record_is_delivered() {
    let body = br#"{"status":"The push refers to repository [localhost:5000/app]"}
{"errorDetail":{"message":"unauthorized: authentication required"},"error":"unauthorized: authentication required"}
"#;
    let recorder = Recorder::new();
    let mut stream =
        FrameStream::<_, JsonStreamCodec<PushImageInfo>>::json(Body::new(&body[..]), &DecoderConfig::default());
    stream.on_frame(recorder.handler());

    stream.wait().expect("valid stream");

    let records = recorder.frames();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].error.as_deref(),
        Some("unauthorized: authentication required")
    );
}

#[test]
fn events_are_decoded_as_they_arrive() {
    let first = r#"{"Type":"container","Action":"create","Actor":{"ID":"c1","Attributes":{"name":"web"}},"scope":"local","time":1700000000,"timeNano":1700000000000000000}"#;
    let second = r#"{"Type":"network","Action":"connect","Actor":{"ID":"n1"},"scope":"local","time":1700000001}"#;
    let body = format!("{first}\n{second}\n");
    let reader = ChunkedReader::with_chunk_size(body.as_bytes(), first.len() + 1);
    let mut stream = FrameStream::<_, JsonStreamCodec<EventMessage>>::json(Body::new(reader), &DecoderConfig::default());

    let event = stream
        .next_frame()
        .expect("valid stream")
        .expect("first event");
    assert_eq!(event.action.as_deref(), Some("create"));
    assert_eq!(stream.buffered(), 0, "first event arrived in its own read");

    let event = stream
        .next_frame()
        .expect("valid stream")
        .expect("second event");
    assert_eq!(event.kind.as_deref(), Some("network"));
    assert!(stream.next_frame().expect("clean end").is_none());
}

#[test]
fn schema_mismatch_aborts_the_drain() {
    let body = br#"{"stream":"ok"}{"stream":["not","a","string"]}{"stream":"never seen"}"#;
    let recorder = Recorder::new();
    let mut stream: BuildStream<_> = FrameStream::json(Body::new(&body[..]), &DecoderConfig::default());
    stream.on_frame(recorder.handler());

    let err = stream.wait().expect_err("second record does not match");

    assert!(matches!(
        err,
        DrainError::Codec(CodecError::Deserialize { record: "BuildInfo", .. })
    ));
    assert_eq!(recorder.len(), 1);
}

#[test]
fn unterminated_record_at_end_of_data_is_truncation() {
    let body = br#"{"stream":"Step 1/2"}{"stream":"Step 2"#;
    let mut stream = FrameStream::<_, JsonStreamCodec<Value>>::json(Body::new(&body[..]), &DecoderConfig::default());

    let err = stream.wait().expect_err("truncated value");

    assert!(matches!(
        err,
        DrainError::Codec(CodecError::Eof(EofError::UnterminatedValue { depth: 1, .. }))
    ));
    assert_eq!(stream.frames_decoded(), 1);
}

#[test]
fn source_can_be_reclaimed_after_draining() {
    let body = br#"{"aux":{"ID":"sha256:abc"}}"#;
    let mut stream: BuildStream<_> = FrameStream::json(Body::new(&body[..]), &DecoderConfig::default());

    let image = stream
        .by_ref()
        .filter_map(Result::ok)
        .filter_map(|info| info.aux.and_then(|aux| aux.id))
        .last();

    assert_eq!(image.as_deref(), Some("sha256:abc"));
    let body = stream.into_inner();
    assert!(body.is_eof());
}
