//! `StreamDecoder` framing, accumulation, and chunk-boundary invariance.

use bytes::Bytes;
use futures_util::stream;

use copydesk::stream::{decode_text_stream, StreamDecoder};

const HELLO_WORLD: &[u8] = b"data: {\"type\":\"text-delta\",\"textDelta\":\"Hello\"}\n\
data: {\"type\":\"text-delta\",\"textDelta\":\" world\"}\n\
data: [DONE]\n";

#[test]
fn accumulates_deltas_and_emits_full_snapshots() {
    let mut decoder = StreamDecoder::new();
    let snapshots = decoder.feed(HELLO_WORLD);

    assert_eq!(snapshots, ["Hello", "Hello world"]);
    assert_eq!(decoder.accumulated(), "Hello world");
}

#[test]
fn chunking_at_every_boundary_yields_identical_text() {
    let mut unchunked = StreamDecoder::new();
    unchunked.feed(HELLO_WORLD);
    let expected = unchunked.into_text();

    for split in 0..HELLO_WORLD.len() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&HELLO_WORLD[..split]);
        decoder.feed(&HELLO_WORLD[split..]);
        assert_eq!(decoder.accumulated(), expected, "split at byte {split}");
    }
}

#[test]
fn byte_at_a_time_feeding_matches_unchunked() {
    let mut unchunked = StreamDecoder::new();
    unchunked.feed(HELLO_WORLD);

    let mut decoder = StreamDecoder::new();
    for byte in HELLO_WORLD {
        decoder.feed(std::slice::from_ref(byte));
    }
    assert_eq!(decoder.accumulated(), unchunked.accumulated());
}

#[test]
fn partial_multi_byte_sequences_survive_chunk_boundaries() {
    let frame = "data: {\"type\":\"text-delta\",\"textDelta\":\"héllo\"}\n".as_bytes();
    // Split inside the two-byte encoding of 'é'.
    let split = frame.iter().position(|&b| b == 0xC3).expect("é start") + 1;

    let mut decoder = StreamDecoder::new();
    decoder.feed(&frame[..split]);
    assert_eq!(decoder.accumulated(), "", "no complete line yet");
    decoder.feed(&frame[split..]);
    assert_eq!(decoder.accumulated(), "héllo");
}

#[test]
fn non_event_lines_are_ignored() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(b"event: ping\n\ndata: {\"type\":\"text-delta\",\"textDelta\":\"a\"}\nnoise\n");
    assert_eq!(decoder.accumulated(), "a");
}

#[test]
fn malformed_json_frames_are_dropped_silently() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(b"data: {not json}\ndata: {\"type\":\"text-delta\",\"textDelta\":\"ok\"}\n");
    assert_eq!(decoder.accumulated(), "ok");
}

#[test]
fn non_text_control_events_are_ignored() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(
        b"data: {\"type\":\"tool-call\",\"toolName\":\"x\"}\n\
          data: {\"type\":\"text-delta\",\"textDelta\":\"kept\"}\n",
    );
    assert_eq!(decoder.accumulated(), "kept");
}

#[test]
fn done_sentinel_does_not_stop_later_frames() {
    // The read loop only ends at end-of-stream; trailing frames after
    // [DONE] are still decoded.
    let mut decoder = StreamDecoder::new();
    decoder.feed(b"data: [DONE]\ndata: {\"type\":\"text-delta\",\"textDelta\":\"late\"}\n");
    assert_eq!(decoder.accumulated(), "late");
}

#[test]
fn incomplete_trailing_line_is_not_processed() {
    let mut decoder = StreamDecoder::new();
    decoder.feed(b"data: {\"type\":\"text-delta\",\"textDelta\":\"partial\"}");
    assert_eq!(decoder.accumulated(), "", "line lacks its newline");
    decoder.feed(b"\n");
    assert_eq!(decoder.accumulated(), "partial");
}

#[tokio::test]
async fn decode_text_stream_drives_byte_chunks_to_completion() {
    let chunks: Vec<Result<Bytes, std::convert::Infallible>> = vec![
        Ok(Bytes::from_static(b"data: {\"type\":\"text-delta\",\"te")),
        Ok(Bytes::from_static(b"xtDelta\":\"Hel\"}\ndata: {\"type\":\"text-delta\"")),
        Ok(Bytes::from_static(b",\"textDelta\":\"lo\"}\ndata: [DONE]\n")),
    ];

    let mut snapshots = Vec::new();
    let text = decode_text_stream(stream::iter(chunks), |snapshot| {
        snapshots.push(snapshot.to_owned());
    })
    .await
    .expect("decode");

    assert_eq!(text, "Hello");
    assert_eq!(snapshots, ["Hel", "Hello"]);
}

#[tokio::test]
async fn decode_text_stream_propagates_read_errors() {
    let chunks: Vec<Result<Bytes, String>> = vec![
        Ok(Bytes::from_static(b"data: {\"type\":\"text-delta\",\"textDelta\":\"x\"}\n")),
        Err("connection reset".to_owned()),
    ];

    let result = decode_text_stream(stream::iter(chunks), |_| {}).await;
    assert!(result.is_err());
}
