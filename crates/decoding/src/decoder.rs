//! Incremental decoder for the gzip file format.
//!
//! This module decodes gzip streams as specified in
//! [RFC 1952](https://www.rfc-editor.org/rfc/rfc1952), one or more
//! concatenated members, from input that may arrive split at any byte.
//!
//! Each member is laid out as:
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+
//! |ID1|ID2|CM |FLG|     MTIME     |XFL|OS |  header
//! +---+---+---+---+---+---+---+---+---+---+
//! [ XLEN, extra ] [ name\0 ] [ comment\0 ] [ CRC16 ]  optional fields
//! +=======================+
//! |...compressed blocks...|
//! +=======================+
//! +---+---+---+---+---+---+---+---+
//! |     CRC32     |     ISIZE     |  trailer
//! +---+---+---+---+---+---+---+---+
//! ```

use crate::checksum::Crc32;
use crate::config::DecoderConfig;
use crate::error::{DecodeError, FormatError};
use crate::inflate::{Inflate, RawInflater};
use crate::source::ByteSource;
use crate::ensure;
use bytes::{Buf, BufMut};
use std::cmp;
use std::task::Poll;
use tracing::trace;
use GzipState::*;

/// ID1 and ID2 as a little-endian u16
const GZIP_MAGIC: u16 = 0x8B1F;
const CM_DEFLATE: u8 = 8;
const HEADER_SIZE: usize = 10;
const TRAILER_SIZE: usize = 8;
/// Header, an empty deflate block and the trailer
const MIN_MEMBER_SIZE: usize = 20;

/// Position of a [`GzipDecoder`] within the current member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GzipState {
    /// Start of a member
    Begin,
    /// Read the fixed 10 byte header
    Header,
    /// Read XLEN
    ExtraFieldLength,
    /// Skip XLEN bytes of extra field
    ExtraFieldData,
    /// Skip the file name or comment up to and including its zero byte
    ZeroTerminatedField,
    /// Verify the 16 bit header checksum
    HeaderChecksum,
    /// Inflate the compressed blocks
    Compressed,
    /// Verify CRC32 and ISIZE
    Trailer,
    /// Look for another member or the end of the stream
    ConcatenationCheck,
    /// Final state after the last member
    End,
}

/// The FLG byte of a member header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flags(u8);

impl Flags {
    /// Only a marker, doesn't have a dedicated state
    #[allow(dead_code, reason = "documents the full FLG layout")]
    const TEXT: u8 = 0x01;
    const HCRC: u8 = 0x02;
    const EXTRA: u8 = 0x04;
    const NAME: u8 = 0x08;
    const COMMENT: u8 = 0x10;
    const RESERVED: u8 = 0xE0;

    #[inline]
    fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Clears `flag`, returning whether it was set.
    #[inline]
    fn take(&mut self, flag: u8) -> bool {
        let set = self.contains(flag);
        self.0 &= !flag;
        set
    }
}

/// Decodes a gzip stream incrementally.
///
/// [`decode`](Self::decode) is called every time new input is available. It
/// consumes as much as it can, writes decompressed bytes to the sink and
/// returns once it needs more input, leaving partially read fields to be
/// resumed by the next call. A multi-byte field is never consumed until all
/// of its bytes are available.
///
/// Errors are fatal: the decoder must not be used again after `decode`
/// returned one.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use flate2::Compression;
/// use flate2::write::GzEncoder;
/// use micro_decoding::{ChunkedSource, GzipDecoder};
/// use std::io::Write;
///
/// let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"hello gzip").unwrap();
/// let encoded = encoder.finish().unwrap();
///
/// let mut decoder = GzipDecoder::new();
/// let mut source = ChunkedSource::new();
/// let mut decoded = Vec::new();
///
/// for piece in encoded.chunks(3) {
///     source.push(Bytes::copy_from_slice(piece));
///     decoder.decode(&mut source, &mut decoded).unwrap();
/// }
/// source.finish();
/// decoder.decode(&mut source, &mut decoded).unwrap();
///
/// assert!(decoder.is_finished());
/// assert_eq!(decoded, b"hello gzip");
/// ```
#[derive(Debug)]
pub struct GzipDecoder<I = RawInflater> {
    state: GzipState,
    flags: Flags,
    // extra field cursor
    field_length: usize,
    field_position: usize,
    crc: Crc32,
    /// Whether header bytes are folded into `crc` (until FHCRC is known to be absent)
    compute_crc: bool,
    inflater: I,
    out: Box<[u8]>,
}

impl GzipDecoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self::with_inflater(RawInflater::new(), config)
    }
}

impl Default for GzipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Inflate> GzipDecoder<I> {
    /// Creates a decoder that drives `inflater` for the compressed blocks.
    pub fn with_inflater(inflater: I, config: DecoderConfig) -> Self {
        Self {
            state: Begin,
            flags: Flags::default(),
            field_length: 0,
            field_position: 0,
            crc: Crc32::new(),
            compute_crc: true,
            inflater,
            out: vec![0; config.get_buffer_size()].into_boxed_slice(),
        }
    }

    pub fn state(&self) -> GzipState {
        self.state
    }

    /// Returns true once the end of the gzip stream has been reached.
    pub fn is_finished(&self) -> bool {
        self.state == End
    }

    /// Consumes available bytes of `src`, writing decompressed bytes to `sink`.
    ///
    /// Returns `Ok(())` when the stream ended, when more input is needed or
    /// when `sink` is full. A full sink must be drained and `decode` called
    /// again to resume. If `src` is final, `sink` still has room and the
    /// stream has not ended, the input was truncated and
    /// [`DecodeError::UnexpectedEof`] is returned.
    pub fn decode<S, W>(&mut self, src: &mut S, sink: &mut W) -> Result<(), DecodeError>
    where
        S: ByteSource,
        W: BufMut,
    {
        while self.state != End {
            let next = match self.step(src, sink) {
                Poll::Pending => break,
                Poll::Ready(Ok(next)) => next,
                Poll::Ready(Err(e)) => {
                    trace!(state = ?self.state, cause = %e, "gzip decoding failed");
                    return Err(e);
                }
            };

            if next != self.state {
                trace!(from = ?self.state, to = ?next, "gzip decoder state changed");
            }
            self.state = next;
        }

        if self.state != End && src.is_final() && sink.has_remaining_mut() {
            trace!(state = ?self.state, "gzip input ended early");
            return Err(DecodeError::UnexpectedEof);
        }

        Ok(())
    }

    /// Processes the current state.
    ///
    /// # Returns
    /// - `Poll::Pending` if the state needs more bytes than `src` holds
    /// - `Poll::Ready(Ok(state))` with the next state
    /// - `Poll::Ready(Err(_))` on a format violation
    fn step<S, W>(&mut self, src: &mut S, sink: &mut W) -> Poll<Result<GzipState, DecodeError>>
    where
        S: ByteSource,
        W: BufMut,
    {
        match self.state {
            Begin => {
                self.begin_member();
                Poll::Ready(Ok(Header))
            }

            Header => {
                if src.remaining() < HEADER_SIZE {
                    return Poll::Pending;
                }
                self.read_header(src)?;
                Poll::Ready(Ok(self.next_from_flags()))
            }

            ExtraFieldLength => {
                if src.remaining() < size_of::<u16>() {
                    return Poll::Pending;
                }
                self.field_length = usize::from(self.read_u16(src));
                self.field_position = 0;
                Poll::Ready(Ok(ExtraFieldData))
            }

            ExtraFieldData => {
                if !self.skip_extra_field(src) {
                    return Poll::Pending;
                }
                Poll::Ready(Ok(self.next_from_flags()))
            }

            ZeroTerminatedField => {
                if !self.consume_to_zero_byte(src) {
                    return Poll::Pending;
                }
                Poll::Ready(Ok(self.next_from_flags()))
            }

            HeaderChecksum => {
                if src.remaining() < size_of::<u16>() {
                    return Poll::Pending;
                }
                self.check_header_crc(src)?;
                self.enter_compressed();
                Poll::Ready(Ok(Compressed))
            }

            Compressed => {
                self.inflate_source(src, sink)?;
                if !self.inflater.is_finished() {
                    return Poll::Pending;
                }
                Poll::Ready(Ok(Trailer))
            }

            Trailer => {
                if src.remaining() < TRAILER_SIZE {
                    return Poll::Pending;
                }
                self.read_trailer(src)?;
                trace!(size = self.inflater.total_out(), "finished gzip member");
                Poll::Ready(Ok(ConcatenationCheck))
            }

            ConcatenationCheck => self.inspect_concatenation(src),

            End => Poll::Ready(Ok(End)),
        }
    }

    fn begin_member(&mut self) {
        self.crc.reset();
        // assume FHCRC is enabled until the FLG byte is read
        self.compute_crc = true;
    }

    fn enter_compressed(&mut self) {
        self.inflater.reset();
        self.crc.reset();
    }

    /// Returns the state for the next optional field announced by FLG,
    /// clearing its bit.
    fn next_from_flags(&mut self) -> GzipState {
        if self.flags.take(Flags::EXTRA) {
            self.field_length = 0;
            ExtraFieldLength
        } else if self.flags.take(Flags::NAME) || self.flags.take(Flags::COMMENT) {
            ZeroTerminatedField
        } else if self.flags.take(Flags::HCRC) {
            // the checksum does not cover itself
            self.compute_crc = false;
            HeaderChecksum
        } else {
            self.enter_compressed();
            Compressed
        }
    }

    /// Copies the next `N` bytes out of `src`, which must hold them.
    fn pull<const N: usize, S: Buf>(&mut self, src: &mut S) -> [u8; N] {
        let mut field = [0u8; N];
        src.copy_to_slice(&mut field);
        if self.compute_crc {
            self.crc.update(&field);
        }
        field
    }

    fn read_u16<S: Buf>(&mut self, src: &mut S) -> u16 {
        u16::from_le_bytes(self.pull(src))
    }

    fn read_u32<S: Buf>(&mut self, src: &mut S) -> u32 {
        u32::from_le_bytes(self.pull(src))
    }

    fn read_header<S: Buf>(&mut self, src: &mut S) -> Result<(), FormatError> {
        let header: [u8; HEADER_SIZE] = self.pull(src);

        let magic = u16::from_le_bytes([header[0], header[1]]);
        ensure!(magic == GZIP_MAGIC, FormatError::BadMagic { expected: GZIP_MAGIC, found: magic });

        let method = header[2];
        ensure!(method == CM_DEFLATE, FormatError::UnsupportedMethod { expected: CM_DEFLATE, found: method });

        let flags = Flags(header[3]);
        ensure!(!flags.contains(Flags::RESERVED), FormatError::ReservedFlags { flags: flags.0 });

        if !flags.contains(Flags::HCRC) {
            self.compute_crc = false;
        }
        // MTIME, XFL and OS are ignored
        self.flags = flags;
        Ok(())
    }

    fn skip_extra_field<S: Buf>(&mut self, src: &mut S) -> bool {
        while src.has_remaining() && self.field_position < self.field_length {
            let chunk = src.chunk();
            let skipped = cmp::min(chunk.len(), self.field_length - self.field_position);
            if self.compute_crc {
                self.crc.update(&chunk[..skipped]);
            }
            src.advance(skipped);
            self.field_position += skipped;
        }
        self.field_position >= self.field_length
    }

    fn consume_to_zero_byte<S: Buf>(&mut self, src: &mut S) -> bool {
        while src.has_remaining() {
            let chunk = src.chunk();
            let (consumed, found) = match chunk.iter().position(|&b| b == 0) {
                Some(index) => (index + 1, true),
                None => (chunk.len(), false),
            };
            if self.compute_crc {
                self.crc.update(&chunk[..consumed]);
            }
            src.advance(consumed);
            if found {
                return true;
            }
        }
        false
    }

    fn check_header_crc<S: Buf>(&mut self, src: &mut S) -> Result<(), FormatError> {
        let expected = self.crc.low16();
        let found = self.read_u16(src);
        ensure!(expected == found, FormatError::HeaderChecksum { expected, found });
        Ok(())
    }

    /// Feeds the compressed bytes of `src` to the inflater until it finishes
    /// the member, stalls for input or fills `sink`.
    ///
    /// Output is checksummed one buffer at a time as it is produced.
    fn inflate_source<S: Buf, W: BufMut>(&mut self, src: &mut S, sink: &mut W) -> Result<(), DecodeError> {
        while !self.inflater.is_finished() && sink.has_remaining_mut() {
            let room = cmp::min(self.out.len(), sink.remaining_mut());
            let progress = self.inflater.inflate(src.chunk(), &mut self.out[..room])?;
            src.advance(progress.consumed);

            if progress.produced > 0 {
                let produced = &self.out[..progress.produced];
                self.crc.update(produced);
                sink.put_slice(produced);
            }

            if progress.is_stalled() {
                break;
            }
        }
        Ok(())
    }

    fn read_trailer<S: Buf>(&mut self, src: &mut S) -> Result<(), FormatError> {
        let expected = self.crc.value();
        let found = self.read_u32(src);
        ensure!(expected == found, FormatError::Checksum { expected, found });

        #[allow(clippy::cast_possible_truncation, reason = "ISIZE is the size modulo 2^32")]
        let expected = self.inflater.total_out() as u32;
        let found = self.read_u32(src);
        ensure!(expected == found, FormatError::Size { expected, found });
        Ok(())
    }

    /// Decides whether the bytes after a trailer start another member.
    ///
    /// Anything that does not parse as a member header ends the stream, and
    /// an ended stream must not be followed by more bytes.
    fn inspect_concatenation<S: ByteSource>(&mut self, src: &mut S) -> Poll<Result<GzipState, DecodeError>> {
        let next = if src.remaining() < MIN_MEMBER_SIZE {
            if !src.is_final() {
                // expect more bytes to come
                return Poll::Pending;
            }
            End
        } else {
            self.begin_member();
            match self.read_header(src) {
                Ok(()) => {
                    trace!("found concatenated gzip member");
                    self.next_from_flags()
                }
                Err(e) => {
                    trace!(cause = %e, "bytes after gzip member are not a gzip header");
                    End
                }
            }
        };

        if next == End && src.has_remaining() {
            return Poll::Ready(Err(FormatError::TrailingData { remaining: src.remaining() }.into()));
        }
        Poll::Ready(Ok(next))
    }
}
