//! Line assembly for the host protocol.
//!
//! Bytes arrive from the UART in arbitrary chunks. [`LineBuffer`] collects
//! them until a `\n` terminator and hands back the completed line. A line
//! that has not been terminated yet is never returned, so a partial
//! command can never be acted on.

use heapless::{String, Vec};

/// Line terminator
pub const LINE_END: u8 = b'\n';

/// Maximum accepted line length in bytes (terminator excluded)
pub const MAX_LINE_LEN: usize = 64;

/// Errors that can occur while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded the buffer; the rest of it is discarded
    Overflow,
    /// Completed line is not valid UTF-8
    InvalidUtf8,
}

/// Byte-at-a-time line assembler
#[derive(Debug, Clone)]
pub struct LineBuffer<const N: usize = MAX_LINE_LEN> {
    buffer: Vec<u8, N>,
    /// Dropping bytes until the next terminator after an overflow
    discarding: bool,
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineBuffer<N> {
    /// Create an empty line buffer
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
        }
    }

    /// Drop any partially received line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Number of bytes of the pending (unterminated) line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when `byte` terminates a line, `Ok(None)`
    /// when more bytes are needed, or `Err` when the current line had to
    /// be dropped. An overflow is reported once per line.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<N>>, LineError> {
        if byte == LINE_END {
            if self.discarding {
                self.discarding = false;
                return Ok(None);
            }
            let bytes = core::mem::take(&mut self.buffer);
            return String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| LineError::InvalidUtf8);
        }

        if self.discarding {
            return Ok(None);
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(LineError::Overflow);
        }

        Ok(None)
    }
}
