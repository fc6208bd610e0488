//! Decoder configuration.

/// Default size of the scratch buffer each inflate step writes into.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Settings shared by [`GzipDecoder`](crate::GzipDecoder),
/// [`GzipCodec`](crate::GzipCodec) and [`GzipBody`](crate::GzipBody).
///
/// ```
/// use micro_decoding::DecoderConfig;
///
/// let config = DecoderConfig::default().buffer_size(16 * 1024);
/// assert_eq!(config.get_buffer_size(), 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    buffer_size: usize,
}

impl DecoderConfig {
    pub const fn new() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE }
    }

    /// Sets the size of the inflate output buffer.
    ///
    /// Decompressed bytes are produced and checksummed in pieces of at most
    /// this size, which bounds the memory a session holds. Zero is raised to one.
    #[must_use]
    pub const fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = if buffer_size == 0 { 1 } else { buffer_size };
        self
    }

    pub const fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}
