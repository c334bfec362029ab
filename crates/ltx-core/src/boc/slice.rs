use std::sync::Arc;

use crate::error::SliceError;

use super::cell::Cell;

/// Read position inside one cell. Loads either succeed entirely or leave the
/// position unchanged.
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    fn ensure_bits(&self, needed: usize) -> Result<(), SliceError> {
        let remaining = self.remaining_bits();
        if needed > remaining {
            return Err(SliceError::NotEnoughBits { needed, remaining });
        }
        Ok(())
    }

    fn bit_at(&self, index: usize) -> bool {
        (self.cell.data()[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    pub fn load_bit(&mut self) -> Result<bool, SliceError> {
        self.ensure_bits(1)?;
        let bit = self.bit_at(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Load an unsigned big-endian integer of up to 128 bits.
    pub fn load_u128(&mut self, bits: usize) -> Result<u128, SliceError> {
        debug_assert!(bits <= 128);
        self.ensure_bits(bits)?;
        let mut value = 0u128;
        for i in 0..bits {
            value = (value << 1) | u128::from(self.bit_at(self.bit_pos + i));
        }
        self.bit_pos += bits;
        Ok(value)
    }

    /// Load an unsigned big-endian integer of up to 64 bits.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, SliceError> {
        debug_assert!(bits <= 64);
        self.load_u128(bits).map(|v| v as u64)
    }

    pub fn load_array<const N: usize>(&mut self) -> Result<[u8; N], SliceError> {
        self.ensure_bits(N * 8)?;
        let mut out = [0u8; N];
        for byte in &mut out {
            *byte = self.load_uint(8)? as u8;
        }
        Ok(out)
    }

    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>, SliceError> {
        let cell: &'a Cell = self.cell;
        let child = cell.refs().get(self.ref_pos).ok_or(SliceError::NotEnoughRefs)?;
        self.ref_pos += 1;
        Ok(child)
    }

    /// `Maybe ^X`: a presence bit followed, when set, by a reference.
    pub fn load_maybe_ref(&mut self) -> Result<Option<&'a Arc<Cell>>, SliceError> {
        let saved = (self.bit_pos, self.ref_pos);
        if !self.load_bit()? {
            return Ok(None);
        }
        match self.load_ref() {
            Ok(child) => Ok(Some(child)),
            Err(err) => {
                (self.bit_pos, self.ref_pos) = saved;
                Err(err)
            }
        }
    }

    /// `VarUInteger 16`: 4-bit byte length then the value.
    pub fn load_coins(&mut self) -> Result<u128, SliceError> {
        let saved = self.bit_pos;
        let len = self.load_uint(4)? as usize;
        self.load_u128(len * 8).inspect_err(|_| self.bit_pos = saved)
    }
}
