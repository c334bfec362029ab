use std::sync::Arc;

use crate::error::BocError;

use super::cell::{Cell, MAX_BITS, MAX_REFS};

/// Accumulates bits and references for a new [`Cell`].
#[derive(Debug, Default, Clone)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    fn reserve_bits(&self, bits: usize) -> Result<(), BocError> {
        if self.bit_len + bits > MAX_BITS {
            return Err(BocError::Overflow(format!(
                "storing {bits} bits on top of {}",
                self.bit_len
            )));
        }
        Ok(())
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, BocError> {
        self.reserve_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store `value` as a big-endian unsigned integer of `bits` width.
    pub fn store_u128(&mut self, value: u128, bits: usize) -> Result<&mut Self, BocError> {
        if bits < 128 && value >> bits != 0 {
            return Err(BocError::Overflow(format!("{value} does not fit in {bits} bits")));
        }
        if bits > 128 {
            return Err(BocError::Overflow(format!("{bits}-bit integer")));
        }
        self.reserve_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, BocError> {
        self.store_u128(u128::from(value), bits)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, BocError> {
        self.reserve_bits(bytes.len() * 8)?;
        for &byte in bytes {
            self.store_uint(u64::from(byte), 8)?;
        }
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, BocError> {
        if self.refs.len() == MAX_REFS {
            return Err(BocError::Overflow("more than 4 references".to_owned()));
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self, BocError> {
        match cell {
            None => self.store_bit(false),
            Some(cell) => {
                if self.refs.len() == MAX_REFS {
                    return Err(BocError::Overflow("more than 4 references".to_owned()));
                }
                self.store_bit(true)?;
                self.store_ref(cell)
            }
        }
    }

    /// `VarUInteger 16`: 4-bit byte length, then the minimal big-endian bytes.
    pub fn store_coins(&mut self, value: u128) -> Result<&mut Self, BocError> {
        let len = (128 - value.leading_zeros() as usize).div_ceil(8);
        if len > 15 {
            return Err(BocError::Overflow(format!("{value} exceeds VarUInteger 16")));
        }
        self.reserve_bits(4 + len * 8)?;
        self.store_uint(len as u64, 4)?;
        self.store_u128(value, len * 8)
    }

    pub fn build(self) -> Result<Arc<Cell>, BocError> {
        Cell::new(self.data, self.bit_len, self.refs).map(Arc::new)
    }
}
