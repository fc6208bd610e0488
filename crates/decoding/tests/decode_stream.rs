use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use futures::{StreamExt, stream};
use http::{HeaderMap, HeaderValue, Response};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use micro_decoding::{DecodeError, DecoderConfig, GzipBody, GzipCodec, decode_response};
use std::convert::Infallible;
use std::io::{self, Write};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

fn gzip(payload: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

fn gzip_with_name(payload: &[u8]) -> Vec<u8> {
    let mut encoder = GzBuilder::new()
        .filename("a.txt")
        .comment("served by a test")
        .extra(vec![1, 2, 3, 4])
        .write(Vec::new(), Compression::fast());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

fn text(len: usize) -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".iter().copied().cycle().take(len).collect()
}

fn split(data: &[u8], chunk_size: usize) -> Vec<Bytes> {
    data.chunks(chunk_size).map(Bytes::copy_from_slice).collect()
}

async fn read_framed(data: &[u8], chunk_size: usize) -> Result<Vec<u8>, DecodeError> {
    let chunks = split(data, chunk_size).into_iter().map(Ok::<_, io::Error>);
    let reader = StreamReader::new(stream::iter(chunks));
    let mut framed = FramedRead::new(reader, GzipCodec::new());

    let mut decoded = Vec::new();
    while let Some(item) = framed.next().await {
        decoded.extend_from_slice(&item?);
    }
    assert!(framed.decoder().is_finished());
    Ok(decoded)
}

#[tokio::test]
async fn test_framed_read() {
    let payload = text(100_000);
    let encoded = gzip(&payload);

    for chunk_size in [1, 5, 512, encoded.len()] {
        assert_eq!(read_framed(&encoded, chunk_size).await.unwrap(), payload, "chunk size {chunk_size}");
    }
}

#[tokio::test]
async fn test_framed_read_concatenated() {
    let mut encoded = gzip(b"one, ");
    encoded.extend(gzip_with_name(b"two, "));
    encoded.extend(gzip(b"three"));

    assert_eq!(read_framed(&encoded, 3).await.unwrap(), b"one, two, three");
}

#[tokio::test]
async fn test_framed_read_truncated() {
    let encoded = gzip(&text(10_000));
    let err = read_framed(&encoded[..encoded.len() / 3], 64).await.unwrap_err();
    assert!(err.is_truncated());
}

#[tokio::test]
async fn test_body_with_optional_fields() {
    let payload = text(30_000);
    let encoded = gzip_with_name(&payload);
    let frames = split(&encoded, 7).into_iter().map(|bytes| Ok::<_, Infallible>(Frame::data(bytes)));

    let body = GzipBody::with_config(StreamBody::new(stream::iter(frames)), DecoderConfig::default().buffer_size(256));
    let decoded = body.collect().await.unwrap().to_bytes();
    assert_eq!(decoded, payload);
}

#[tokio::test]
async fn test_body_forwards_trailers() {
    let mut trailers = HeaderMap::new();
    trailers.insert("x-checksum", HeaderValue::from_static("ok"));

    let mut frames: Vec<Result<Frame<Bytes>, Infallible>> =
        split(&gzip(b"with trailers"), 4).into_iter().map(|bytes| Ok(Frame::data(bytes))).collect();
    frames.push(Ok(Frame::trailers(trailers)));

    let mut body = GzipBody::new(StreamBody::new(stream::iter(frames)));
    let mut decoded = Vec::new();
    let mut received_trailers = None;

    while let Some(frame) = body.frame().await {
        let frame = frame.unwrap();
        assert!(received_trailers.is_none(), "data after trailers");
        match frame.into_data() {
            Ok(data) => decoded.extend_from_slice(&data),
            Err(frame) => received_trailers = frame.into_trailers().ok(),
        }
    }

    assert_eq!(decoded, b"with trailers");
    assert_eq!(received_trailers.unwrap()["x-checksum"], "ok");
}

#[tokio::test]
async fn test_body_upstream_error() {
    let encoded = gzip(&text(1_000));
    let frames = vec![
        Ok(Frame::data(Bytes::copy_from_slice(&encoded[..20]))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
    ];

    let mut body = GzipBody::new(StreamBody::new(stream::iter(frames)));
    let err = loop {
        match body.frame().await {
            Some(Ok(_)) => (),
            Some(Err(e)) => break e,
            None => panic!("body ended without error"),
        }
    };

    assert!(matches!(err, DecodeError::Upstream { .. }));
    assert!(!err.is_corrupt());
    assert!(body.frame().await.is_none());
}

#[tokio::test]
async fn test_body_corrupt() {
    let mut encoded = gzip(&text(1_000));
    let crc_offset = encoded.len() - 8;
    encoded[crc_offset] ^= 0x01;

    let frames = split(&encoded, 100).into_iter().map(|bytes| Ok::<_, Infallible>(Frame::data(bytes)));
    let err = GzipBody::new(StreamBody::new(stream::iter(frames))).collect().await.unwrap_err();

    assert!(err.is_corrupt());
    let io_err: io::Error = err.into();
    assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn test_decode_response() {
    let payload = text(4_096);
    let encoded = gzip(&payload);
    let frames = split(&encoded, 33).into_iter().map(|bytes| Ok::<_, Infallible>(Frame::data(bytes)));

    let response = Response::builder()
        .header(http::header::CONTENT_ENCODING, "gzip")
        .header(http::header::CONTENT_LENGTH, encoded.len())
        .body(StreamBody::new(stream::iter(frames)))
        .unwrap();

    let response = decode_response(response);
    assert!(response.headers().get(http::header::CONTENT_LENGTH).is_none());

    let decoded = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(decoded, payload);
}

#[tokio::test]
async fn test_decode_response_identity() {
    let frames = vec![Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"not compressed")))];
    let response = Response::builder().body(StreamBody::new(stream::iter(frames))).unwrap();

    let decoded = decode_response(response).into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&decoded[..], b"not compressed");
}
