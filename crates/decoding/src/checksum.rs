//! Running CRC-32 over the bytes of one gzip member.

use flate2::Crc;

/// A resettable CRC-32 accumulator.
///
/// The gzip decoder folds header bytes into it while the header checksum
/// option is active, and every decompressed byte of the current member.
#[derive(Debug)]
pub struct Crc32 {
    crc: Crc,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { crc: Crc::new() }
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.crc.update(bytes);
    }

    /// The checksum of every byte folded in since the last reset.
    #[inline]
    pub fn value(&self) -> u32 {
        self.crc.sum()
    }

    /// Lower 16 bits, as stored in the optional header checksum field.
    #[inline]
    pub fn low16(&self) -> u16 {
        (self.crc.sum() & 0xFFFF) as u16
    }

    pub fn reset(&mut self) {
        self.crc.reset();
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
