//! Line-delimited distance frames.
//!
//! Wire format: one ASCII decimal number per line, `\n` terminated
//! (`\r\n` tolerated).  The assembler accumulates whatever the serial
//! driver hands back and yields complete lines; a single read may carry
//! part of a line, one line, or several.

use heapless::Vec as FixedVec;

use super::Reading;
use crate::error::{ParseError, ReadError};

/// Longest frame (terminator included) the assembler will buffer.
pub const MAX_FRAME_LEN: usize = 64;

/// Parse one frame into a distance reading.
///
/// Valid iff the trimmed text is a finite decimal number.
pub fn parse(line: &str) -> Result<Reading, ParseError> {
    let text = line.trim();
    if text.is_empty() {
        return Err(ParseError::Malformed);
    }
    let distance_cm: f32 = text.parse().map_err(|_| ParseError::Malformed)?;
    if !distance_cm.is_finite() {
        return Err(ParseError::Malformed);
    }
    Ok(Reading { distance_cm })
}

/// Parse a raw frame as received from the link.
pub fn parse_bytes(frame: &[u8]) -> Result<Reading, ParseError> {
    let text = core::str::from_utf8(frame).map_err(|_| ParseError::Malformed)?;
    parse(text)
}

/// Streaming line assembler backed by a fixed-capacity buffer.
///
/// A line that outgrows the buffer is dropped as a whole: once it
/// overflows, every byte up to and including its terminator is ignored.
pub struct FrameAssembler {
    pending: FixedVec<u8, MAX_FRAME_LEN>,
    /// Skipping the tail of an overlong line.
    discarding: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            pending: FixedVec::new(),
            discarding: false,
        }
    }

    /// Free space left in the buffer.  Callers size their reads to this so
    /// that [`extend`](Self::extend) never overflows mid-chunk.
    pub fn room(&self) -> usize {
        MAX_FRAME_LEN - self.pending.len()
    }

    /// Append raw bytes.
    ///
    /// On overflow everything buffered is dropped along with the rest of
    /// the overlong line, and `FrameTooLong` is returned.  Bytes after that
    /// line's terminator are kept.
    pub fn extend(&mut self, mut bytes: &[u8]) -> Result<(), ReadError> {
        let mut overflowed = false;
        loop {
            if self.discarding {
                let Some(end) = bytes.iter().position(|&b| b == b'\n') else {
                    break;
                };
                self.discarding = false;
                bytes = &bytes[end + 1..];
            }
            if self.pending.extend_from_slice(bytes).is_ok() {
                break;
            }
            self.discard_line();
            overflowed = true;
        }
        if overflowed {
            return Err(ReadError::FrameTooLong);
        }
        Ok(())
    }

    /// Abandon the line being assembled, including bytes of it that have
    /// not arrived yet.
    pub fn discard_line(&mut self) {
        self.pending.clear();
        self.discarding = true;
    }

    /// True while the tail of an overlong line is being skipped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// True if a complete line is buffered.
    pub fn has_line(&self) -> bool {
        self.pending.contains(&b'\n')
    }

    /// True if the buffer is full and holds no terminator, i.e. the
    /// current line can never complete.
    pub fn is_stalled(&self) -> bool {
        self.room() == 0 && !self.has_line()
    }

    /// Pop the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line = self.pending[..end].to_vec();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        // The remainder is strictly shorter than the buffer, so it fits.
        let rest = FixedVec::from_slice(&self.pending[end + 1..]).unwrap_or_default();
        self.pending = rest;
        Some(line)
    }

    /// Drop any partial line (e.g. after reopening a link).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }
}
