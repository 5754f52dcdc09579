use super::{
    error::SerdeErr,
    integer::ranged_bit_width,
};

/// Reads bits back out of a frame produced by
/// [`BitWriter`](super::BitWriter). Bit order mirrors the writer: LSB-first
/// within each byte.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    byte_index: usize,
    bit_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            byte_index: 0,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let byte = self
            .buffer
            .get(self.byte_index)
            .ok_or(SerdeErr::EndOfStream)?;
        let bit = (byte >> self.bit_index) & 1 != 0;

        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        let lo = self.read_byte()? as u16;
        let hi = self.read_byte()? as u16;
        Ok(lo | (hi << 8))
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, SerdeErr> {
        let mut out = Vec::with_capacity(length);
        for _ in 0..length {
            out.push(self.read_byte()?);
        }
        Ok(out)
    }

    /// Reads a value written with
    /// [`BitWriter::write_ranged`](super::BitWriter::write_ranged) using the
    /// same `min..=max` declaration.
    pub fn read_ranged(&mut self, min: u32, max: u32) -> Result<u32, SerdeErr> {
        let width = ranged_bit_width(min, max);
        let mut offset = 0u32;
        for i in 0..width {
            if self.read_bit()? {
                offset |= 1 << i;
            }
        }
        let value = min.wrapping_add(offset);
        if value < min || value > max {
            return Err(SerdeErr::OutOfRange { value, min, max });
        }
        Ok(value)
    }
}
