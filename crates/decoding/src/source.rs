//! Byte sources the gzip decoder reads compressed input from.
//!
//! A source is a [`Buf`] over every byte received so far that has not been
//! consumed yet, plus a final signal telling the decoder whether more bytes
//! may still arrive. The decoder reads fixed size fields with
//! [`Buf::copy_to_slice`] only after checking [`Buf::remaining`], and skips
//! variable length fields by advancing over [`Buf::chunk`] directly.
//!
//! Decompressed output goes to any [`BufMut`](bytes::BufMut).

use bytes::{Buf, Bytes};
use std::collections::VecDeque;

/// Compressed input handed to [`GzipDecoder::decode`](crate::GzipDecoder::decode).
pub trait ByteSource: Buf {
    /// Returns true once no further bytes will ever be appended.
    ///
    /// This is distinct from `!has_remaining()`, which only says that nothing
    /// is available right now.
    fn is_final(&self) -> bool;
}

/// An ordered queue of received buffers.
///
/// Used where input arrives as separate frames, e.g. from an
/// [`http_body::Body`].
#[derive(Debug, Default)]
pub struct ChunkedSource {
    buffers: VecDeque<Bytes>,
    remaining: usize,
    finished: bool,
}

impl ChunkedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a buffer behind the ones already queued.
    ///
    /// # Panics
    ///
    /// Panics if [`finish`](Self::finish) has already been called.
    pub fn push(&mut self, bytes: Bytes) {
        assert!(!self.finished, "push to a finished source");
        if bytes.is_empty() {
            return;
        }
        self.remaining += bytes.len();
        self.buffers.push_back(bytes);
    }

    /// Signals that no more buffers will be pushed.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Number of buffers not yet fully consumed.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

impl Buf for ChunkedSource {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.buffers.front() {
            Some(bytes) => &bytes[..],
            None => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.remaining, "cannot advance past `remaining`: {cnt} <= {}", self.remaining);
        self.remaining -= cnt;

        while cnt > 0 {
            let Some(front) = self.buffers.front_mut() else {
                break;
            };

            if cnt < front.len() {
                front.advance(cnt);
                break;
            }

            cnt -= front.len();
            self.buffers.pop_front();
        }
    }
}

impl ByteSource for ChunkedSource {
    fn is_final(&self) -> bool {
        self.finished
    }
}

/// Borrows an existing buffer as a [`ByteSource`] with an explicit final flag.
///
/// Lets a framing buffer (such as the `BytesMut` of a
/// [`FramedRead`](tokio_util::codec::FramedRead)) be decoded in place.
#[derive(Debug)]
pub struct Input<'a, B: Buf> {
    buf: &'a mut B,
    is_final: bool,
}

impl<'a, B: Buf> Input<'a, B> {
    /// More bytes may follow.
    pub fn partial(buf: &'a mut B) -> Self {
        Self { buf, is_final: false }
    }

    /// `buf` holds every byte that is left.
    pub fn last(buf: &'a mut B) -> Self {
        Self { buf, is_final: true }
    }
}

impl<B: Buf> Buf for Input<'_, B> {
    #[inline]
    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    fn chunk(&self) -> &[u8] {
        self.buf.chunk()
    }

    #[inline]
    fn advance(&mut self, cnt: usize) {
        self.buf.advance(cnt);
    }
}

impl<B: Buf> ByteSource for Input<'_, B> {
    fn is_final(&self) -> bool {
        self.is_final
    }
}
