use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

/// An unsigned integer written in chunks of `BITS` bits, each chunk preceded
/// by a "proceed" bit. Small values (lengths, young transaction ids) stay
/// small on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedVariableInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedVariableInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        if BITS == 0 || BITS > 63 {
            panic!("a variable integer chunk must hold between 1 and 63 bits");
        }
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

impl<const BITS: u8> Serde for UnsignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let mut value = self.value;
        loop {
            let proceed = (value >> BITS) != 0;
            writer.write_bit(proceed);
            for _ in 0..BITS {
                writer.write_bit(value & 1 != 0);
                value >>= 1;
            }
            if !proceed {
                return;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let proceed = reader.read_bit()?;

            for _ in 0..BITS {
                if reader.read_bit()? {
                    // a chunk spilling past 64 bits can only come from a corrupt stream
                    if shift >= 64 {
                        return Err(SerdeErr);
                    }
                    output |= 1 << shift;
                }
                shift += 1;
            }

            if !proceed {
                return Ok(Self { value: output });
            }
            if shift >= 64 + u32::from(BITS) {
                return Err(SerdeErr);
            }
        }
    }

    fn bit_length(&self) -> u32 {
        let mut output: u32 = 0;
        let mut value = self.value;
        loop {
            output += 1 + u32::from(BITS);
            value >>= BITS;
            if value == 0 {
                return output;
            }
        }
    }
}

impl<const BITS: u8> From<u64> for UnsignedVariableInteger<BITS> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}
