//! [`Decoder`] implementation that gunzips a byte stream.
//!
//! Lets a gzip encoded `AsyncRead` be decoded through a
//! [`FramedRead`](tokio_util::codec::FramedRead), each item being a batch of
//! at most [`DecoderConfig::buffer_size`] decompressed bytes.

use crate::config::DecoderConfig;
use crate::decoder::GzipDecoder;
use crate::error::DecodeError;
use crate::source::Input;
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

#[derive(Debug)]
pub struct GzipCodec {
    decoder: GzipDecoder,
    out: BytesMut,
    max_item_size: usize,
}

impl GzipCodec {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            decoder: GzipDecoder::with_config(config),
            out: BytesMut::new(),
            max_item_size: config.get_buffer_size(),
        }
    }

    /// Returns true once the whole gzip stream has been decoded.
    pub fn is_finished(&self) -> bool {
        self.decoder.is_finished()
    }

    fn decode_input(&mut self, src: &mut BytesMut, is_final: bool) -> Result<Option<Bytes>, DecodeError> {
        let mut sink = (&mut self.out).limit(self.max_item_size);
        let mut input = if is_final { Input::last(src) } else { Input::partial(src) };
        self.decoder.decode(&mut input, &mut sink)?;
        Ok(self.take_output())
    }

    fn take_output(&mut self) -> Option<Bytes> {
        if self.out.is_empty() {
            return None;
        }
        let bytes = self.out.split().freeze();
        trace!(len = bytes.len(), "gunzipped bytes");
        Some(bytes)
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for GzipCodec {
    type Item = Bytes;
    type Error = DecodeError;

    /// Decodes the compressed bytes buffered so far.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` with the bytes decompressed by this call, input
    ///   that would decompress past `buffer_size` is left in `src`
    /// - `Ok(None)` when more data is needed
    /// - `Err(DecodeError)` if the stream is not valid gzip
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_input(src, false)
    }

    /// Decodes the last buffered bytes, failing if the gzip stream is incomplete.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_input(src, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(payload: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_basic() {
        let mut buffer = BytesMut::from(&gzip(b"hello codec")[..]);
        let mut codec = GzipCodec::new();

        let item = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item[..], b"hello codec");
        assert!(buffer.is_empty());
        assert!(!codec.is_finished());

        assert!(codec.decode_eof(&mut buffer).unwrap().is_none());
        assert!(codec.is_finished());
    }

    #[test]
    fn test_partial_input() {
        let encoded = gzip(b"partial input");
        let mut buffer = BytesMut::from(&encoded[..5]);
        let mut codec = GzipCodec::new();

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        // the header is incomplete, nothing is consumed
        assert_eq!(buffer.len(), 5);

        buffer.extend_from_slice(&encoded[5..]);
        let item = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item[..], b"partial input");
    }

    #[test]
    fn test_truncated_at_eof() {
        let encoded = gzip(b"truncated stream");
        let mut buffer = BytesMut::from(&encoded[..encoded.len() - 3]);
        let mut codec = GzipCodec::new();

        let item = codec.decode(&mut buffer).unwrap();
        assert_eq!(&item.unwrap()[..], b"truncated stream");

        let err = codec.decode_eof(&mut buffer).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_items_are_bounded() {
        let payload = vec![b'z'; 100_000];
        let mut buffer = BytesMut::from(&gzip(&payload)[..]);
        let mut codec = GzipCodec::with_config(DecoderConfig::new().buffer_size(4096));

        let mut decoded = Vec::new();
        while let Some(item) = codec.decode(&mut buffer).unwrap() {
            assert!(item.len() <= 4096);
            decoded.extend_from_slice(&item);
        }
        while let Some(item) = codec.decode_eof(&mut buffer).unwrap() {
            assert!(item.len() <= 4096);
            decoded.extend_from_slice(&item);
        }

        assert_eq!(decoded, payload);
        assert!(codec.is_finished());
    }

    #[test]
    fn test_not_gzip() {
        let mut buffer = BytesMut::from(&b"<html>definitely not gzip</html>"[..]);
        let mut codec = GzipCodec::new();

        let err = codec.decode(&mut buffer).unwrap_err();
        assert!(err.is_corrupt());
    }
}
