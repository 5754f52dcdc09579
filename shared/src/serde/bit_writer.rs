use super::integer::{check_range, ranged_bit_width, RangedIntegerError};

/// A saved position in a [`BitWriter`], used to roll back a partially
/// written region when a payload encoder fails mid-write.
#[derive(Debug, Clone, Copy)]
pub struct WriteMark {
    buffer_len: usize,
    scratch: u8,
    scratch_index: u8,
    bits_written: u32,
}

/// Append-only bit stream writer. Bits accumulate LSB-first in a scratch
/// byte and flush to the growable buffer every 8 bits.
pub struct BitWriter {
    scratch: u8,
    scratch_index: u8,
    buffer: Vec<u8>,
    bits_written: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            scratch: 0,
            scratch_index: 0,
            buffer: Vec::with_capacity(1024),
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.scratch |= 1 << self.scratch_index;
        }
        self.scratch_index += 1;
        self.bits_written += 1;

        if self.scratch_index == 8 {
            self.buffer.push(self.scratch);
            self.scratch = 0;
            self.scratch_index = 0;
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_byte((value & 0xFF) as u8);
        self.write_byte((value >> 8) as u8);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_byte(*byte);
        }
    }

    /// Writes `value` using exactly the bits its declared range requires.
    pub fn write_ranged(&mut self, value: u32, min: u32, max: u32) -> Result<(), RangedIntegerError> {
        check_range(value, min, max)?;
        let width = ranged_bit_width(min, max);
        let mut offset = value - min;
        for _ in 0..width {
            self.write_bit(offset & 1 != 0);
            offset >>= 1;
        }
        Ok(())
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }

    /// Saves the current position so a later [`rewind_to`](Self::rewind_to)
    /// can discard everything written after it.
    pub fn mark(&self) -> WriteMark {
        WriteMark {
            buffer_len: self.buffer.len(),
            scratch: self.scratch,
            scratch_index: self.scratch_index,
            bits_written: self.bits_written,
        }
    }

    /// Discards all bits written since `mark` was taken. `mark` must come
    /// from this writer; rewinding to a foreign or stale mark corrupts the
    /// stream.
    pub fn rewind_to(&mut self, mark: &WriteMark) {
        debug_assert!(mark.buffer_len <= self.buffer.len());
        self.buffer.truncate(mark.buffer_len);
        self.scratch = mark.scratch;
        self.scratch_index = mark.scratch_index;
        self.bits_written = mark.bits_written;
    }

    /// Flushes the scratch byte (zero-padding the tail) and returns the
    /// finished frame.
    pub fn to_bytes(mut self) -> Vec<u8> {
        if self.scratch_index > 0 {
            self.buffer.push(self.scratch);
            self.scratch = 0;
            self.scratch_index = 0;
        }
        self.buffer
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
