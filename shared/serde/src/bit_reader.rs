use crate::SerdeErr;

/// Reads bits back out of a buffer produced by a [`StreamWriter`](crate::StreamWriter)
pub struct BitReader<'b> {
    buffer: &'b [u8],
    state: BitReaderState,
}

#[derive(Copy, Clone)]
struct BitReaderState {
    bit_index: usize,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            state: BitReaderState { bit_index: 0 },
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let byte_index = self.state.bit_index / 8;
        let byte = *self.buffer.get(byte_index).ok_or(SerdeErr)?;
        let bit = (byte >> (self.state.bit_index % 8)) & 1 != 0;
        self.state.bit_index += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        if self.state.bit_index % 8 == 0 {
            let byte = *self.buffer.get(self.state.bit_index / 8).ok_or(SerdeErr)?;
            self.state.bit_index += 8;
            return Ok(byte);
        }

        let mut output: u8 = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    /// Number of whole bits left in the buffer
    pub fn bits_remaining(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.state.bit_index)
    }
}
