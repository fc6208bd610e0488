use std::error::Error;
use std::io;
use thiserror::Error;

/// Boxed error raised by the body a decoder reads from.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Top level error of a gzip decode session.
///
/// Every variant is fatal: once returned, the session is finished and any
/// output already handed out must be treated as unreliable.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("corrupt gzip stream: {source}")]
    Corrupt {
        #[from]
        source: FormatError,
    },

    #[error("unexpected end of gzip stream")]
    UnexpectedEof,

    #[error("upstream body error: {source}")]
    Upstream { source: BoxError },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl DecodeError {
    pub fn upstream<E: Into<BoxError>>(e: E) -> Self {
        Self::Upstream { source: e.into() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the received bytes are not valid gzip.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, DecodeError::Corrupt { .. })
    }

    /// Returns true if the input ended before the gzip stream did.
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::UnexpectedEof)
    }

    /// Returns the format violation, if this error is one.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            DecodeError::Corrupt { source } => Some(source),
            _ => None,
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Io { source } => source,
            DecodeError::Corrupt { .. } => io::Error::new(io::ErrorKind::InvalidData, e),
            DecodeError::UnexpectedEof => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            DecodeError::Upstream { .. } => io::Error::other(e),
        }
    }
}

/// Violations of the gzip container format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("not in gzip format; expected: {expected:#x}, found: {found:#x}")]
    BadMagic { expected: u16, found: u16 },

    #[error("unsupported compression method; expected: {expected:#x}, found: {found:#x}")]
    UnsupportedMethod { expected: u8, found: u8 },

    #[error("unsupported flags: {flags:#x}")]
    ReservedFlags { flags: u8 },

    #[error("corrupt gzip header; expected: {expected:#x}, found: {found:#x}")]
    HeaderChecksum { expected: u16, found: u16 },

    #[error("corrupt gzip stream (CRC32); expected: {expected:#x}, found: {found:#x}")]
    Checksum { expected: u32, found: u32 },

    #[error("corrupt gzip stream (ISIZE); expected: {expected:#x}, found: {found:#x}")]
    Size { expected: u32, found: u32 },

    #[error("gzip stream finished prematurely, {remaining} trailing bytes")]
    TrailingData { remaining: usize },

    #[error("invalid deflate data: {reason}")]
    Deflate { reason: String },
}

impl FormatError {
    pub fn deflate<S: ToString>(str: S) -> Self {
        Self::Deflate { reason: str.to_string() }
    }
}
