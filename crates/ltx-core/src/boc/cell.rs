use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::BocError;
use crate::types::HashBytes;

use super::slice::CellSlice;

pub const MAX_BITS: usize = 1023;
pub const MAX_REFS: usize = 4;
pub const MAX_DEPTH: u16 = 1024;

// ==============================================================================
// Cell
// ==============================================================================

/// An ordinary (level 0) cell: up to 1023 data bits and four children.
///
/// Hash and depth are computed once at construction and never change, since
/// a cell's children are immutable `Arc`s.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: HashBytes,
    depth: u16,
}

impl Cell {
    /// Build a cell from MSB-first `data` holding `bit_len` bits.
    /// Bits of the last byte past `bit_len` are cleared.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, BocError> {
        if bit_len > MAX_BITS {
            return Err(BocError::Overflow(format!("{bit_len} data bits")));
        }
        if refs.len() > MAX_REFS {
            return Err(BocError::Overflow(format!("{} references", refs.len())));
        }
        if data.len() != bit_len.div_ceil(8) {
            return Err(BocError::Overflow(format!(
                "{} data bytes for {bit_len} bits",
                data.len()
            )));
        }
        if bit_len % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - bit_len % 8);
            }
        }

        let depth = match refs.iter().map(|r| r.depth).max() {
            None => 0,
            Some(d) if d < MAX_DEPTH => d + 1,
            Some(_) => return Err(BocError::Overflow("cell depth".to_owned())),
        };

        let mut cell = Self {
            data,
            bit_len,
            refs,
            hash: HashBytes::ZERO,
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Representation hash over this cell and, transitively, its children.
    pub fn hash(&self) -> HashBytes {
        self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn begin_parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// `d1` (reference count) and `d2` (data length) descriptor bytes.
    pub(crate) fn descriptors(&self) -> [u8; 2] {
        let d1 = self.refs.len() as u8;
        let d2 = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;
        [d1, d2]
    }

    /// Data bytes with the completion tag appended when not byte aligned.
    pub(crate) fn tagged_data(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = data.last_mut() {
                *last |= 0x80 >> rem;
            }
        }
        data
    }

    fn compute_hash(&self) -> HashBytes {
        let mut hasher = Sha256::new();
        hasher.update(self.descriptors());
        hasher.update(self.tagged_data());
        for child in &self.refs {
            hasher.update(child.depth.to_be_bytes());
        }
        for child in &self.refs {
            hasher.update(child.hash.as_bytes());
        }
        HashBytes(hasher.finalize().into())
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("refs", &self.refs.len())
            .field("hash", &self.hash)
            .finish()
    }
}
