//! Incremental gzip content decoding for async HTTP clients
//!
//! This crate decodes `Content-Encoding: gzip` response bodies as they
//! stream in. The decoder is a resumable state machine: input may be split
//! at any byte, and every call consumes what it can and returns as soon as
//! it needs more, so it fits any async delivery mechanism without blocking.
//!
//! # Features
//!
//! - Input split at arbitrary byte boundaries
//! - Concatenated gzip members
//! - Validation of magic, method, flags, header checksum, CRC32 and ISIZE
//! - Truncation detection, distinct from format violations
//! - Bounded memory, whatever the decompressed size
//! - Adapters for `tokio_util::codec` and `http_body::Body`
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use flate2::Compression;
//! use flate2::write::GzEncoder;
//! use http::Response;
//! use http_body_util::{BodyExt, Full};
//! use micro_decoding::decode_response;
//! use std::io::Write;
//!
//! # futures::executor::block_on(async {
//! let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
//! encoder.write_all(b"Hello World!").unwrap();
//! let body = Full::new(Bytes::from(encoder.finish().unwrap()));
//!
//! let response = Response::builder()
//!     .header(http::header::CONTENT_ENCODING, "gzip")
//!     .body(body)
//!     .unwrap();
//!
//! let response = decode_response(response);
//! assert!(!response.headers().contains_key(http::header::CONTENT_ENCODING));
//!
//! let bytes = response.into_body().collect().await.unwrap().to_bytes();
//! assert_eq!(&bytes[..], b"Hello World!");
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`GzipDecoder`]: the gzip state machine, reading from a [`ByteSource`]
//!   and writing to any `BufMut`
//! - [`ByteSource`], [`ChunkedSource`], [`Input`]: compressed input with an
//!   end-of-input signal
//! - [`Inflate`], [`RawInflater`]: the raw DEFLATE engine behind the decoder
//! - [`GzipCodec`]: a `tokio_util::codec::Decoder`
//! - [`GzipBody`], [`decode_response`]: `http_body::Body` integration
//!
//! # Error Handling
//!
//! [`DecodeError`] separates invalid gzip data ([`DecodeError::is_corrupt`])
//! from input that ended too early ([`DecodeError::is_truncated`]) and from
//! failures of the underlying body or transport.

mod body;
mod checksum;
mod codec;
mod config;
mod decoder;
mod error;
mod inflate;
mod response;
mod source;

mod utils;
pub(crate) use utils::ensure;

pub use body::GzipBody;
pub use checksum::Crc32;
pub use codec::GzipCodec;
pub use config::{DEFAULT_BUFFER_SIZE, DecoderConfig};
pub use decoder::{GzipDecoder, GzipState};
pub use error::{BoxError, DecodeError, FormatError};
pub use inflate::{Inflate, Progress, RawInflater};
pub use response::{decode_response, decode_response_with_config, is_gzip_encoded};
pub use source::{ByteSource, ChunkedSource, Input};
