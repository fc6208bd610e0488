//! The raw DEFLATE engine the gzip decoder drives.
//!
//! The gzip state machine only needs four operations from its engine, captured
//! by the [`Inflate`] trait. [`RawInflater`] implements them over
//! [`flate2::Decompress`] without a zlib wrapper.

use crate::error::{DecodeError, FormatError};
use flate2::{Decompress, FlushDecompress, Status};

/// Byte counts of a single inflate step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Compressed bytes taken from the input
    pub consumed: usize,
    /// Decompressed bytes written to the output
    pub produced: usize,
}

impl Progress {
    #[inline]
    pub fn is_stalled(&self) -> bool {
        self.consumed == 0 && self.produced == 0
    }
}

/// A stateful raw DEFLATE decompressor, reset once per gzip member.
pub trait Inflate {
    /// Forgets all state, including [`total_out`](Inflate::total_out).
    fn reset(&mut self);

    /// Decompresses from `input` into `output`.
    ///
    /// May consume and produce any number of bytes, including zero. Never
    /// consumes past the end of the DEFLATE stream.
    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, DecodeError>;

    /// Returns true once the final DEFLATE block has been decoded.
    fn is_finished(&self) -> bool;

    /// Decompressed bytes produced since the last reset.
    fn total_out(&self) -> u64;
}

#[derive(Debug)]
pub struct RawInflater {
    decompress: Decompress,
    finished: bool,
}

impl RawInflater {
    pub fn new() -> Self {
        Self { decompress: Decompress::new(false), finished: false }
    }
}

impl Default for RawInflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflate for RawInflater {
    fn reset(&mut self) {
        self.decompress.reset(false);
        self.finished = false;
    }

    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, DecodeError> {
        if self.finished {
            return Ok(Progress::default());
        }

        let before_in = self.decompress.total_in();
        let before_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| FormatError::deflate(e.message().unwrap_or("invalid input data")))?;

        #[allow(clippy::cast_possible_truncation, reason = "bounded by the input and output slice lengths")]
        let progress = Progress {
            consumed: (self.decompress.total_in() - before_in) as usize,
            produced: (self.decompress.total_out() - before_out) as usize,
        };

        if status == Status::StreamEnd {
            self.finished = true;
        }

        Ok(progress)
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    fn total_out(&self) -> u64 {
        self.decompress.total_out()
    }
}
