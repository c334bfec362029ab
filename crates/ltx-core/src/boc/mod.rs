//! Bag-of-cells: the content-addressed tree format transactions travel in.
//!
//! [`decode_roots`] turns a serialized bag into its root cells, preserving
//! root order. [`encode_roots`] is the inverse, used for fixtures and tools.
//! Only ordinary (non-exotic, level 0) cells are supported.

mod builder;
mod cell;
mod crc;
mod slice;

pub use builder::CellBuilder;
pub use cell::{Cell, MAX_BITS, MAX_REFS};
pub use crc::crc32c;
pub use slice::CellSlice;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::BocError;
use crate::types::HashBytes;

const GENERIC_MAGIC: u32 = 0xb5ee_9c72;
const INDEXED_MAGIC: u32 = 0x68ff_65f3;
const INDEXED_CRC_MAGIC: u32 = 0xacc3_a728;

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;
const REF_SIZE_MASK: u8 = 0x07;

const D1_REFS_MASK: u8 = 0x07;
const D1_EXOTIC: u8 = 0x08;
const D1_WITH_HASHES: u8 = 0x10;
const D1_LEVEL_SHIFT: u8 = 5;

// ==============================================================================
// Decoding
// ==============================================================================

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], BocError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(BocError::Truncated(what))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn byte(&mut self, what: &'static str) -> Result<u8, BocError> {
        Ok(self.take(1, what)?[0])
    }

    fn uint(&mut self, n: usize, what: &'static str) -> Result<usize, BocError> {
        let raw = self.take(n, what)?;
        let value = raw.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        usize::try_from(value).map_err(|_| BocError::InvalidHeader(format!("{what} too large")))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

/// Deserialize a bag of cells into its roots, in the order the root list
/// declares them.
pub fn decode_roots(bytes: &[u8]) -> Result<Vec<Arc<Cell>>, BocError> {
    let mut r = Reader { buf: bytes, pos: 0 };

    let magic = u32::from_be_bytes(
        r.take(4, "magic")?
            .try_into()
            .map_err(|_| BocError::Truncated("magic"))?,
    );
    let flags = r.byte("flags")?;
    let (has_index, has_crc) = match magic {
        GENERIC_MAGIC => (flags & FLAG_HAS_INDEX != 0, flags & FLAG_HAS_CRC != 0),
        INDEXED_MAGIC => (true, false),
        INDEXED_CRC_MAGIC => (true, true),
        other => return Err(BocError::UnknownMagic(other)),
    };

    let ref_size = (flags & REF_SIZE_MASK) as usize;
    if !(1..=4).contains(&ref_size) {
        return Err(BocError::InvalidHeader(format!("reference size {ref_size}")));
    }
    let off_size = r.byte("offset size")? as usize;
    if !(1..=8).contains(&off_size) {
        return Err(BocError::InvalidHeader(format!("offset size {off_size}")));
    }

    if has_crc {
        let Some(body_len) = bytes.len().checked_sub(4) else {
            return Err(BocError::Truncated("crc32c"));
        };
        let (body, trailer) = bytes.split_at(body_len);
        let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = crc32c(body);
        if stored != computed {
            return Err(BocError::ChecksumMismatch { stored, computed });
        }
        r.buf = body;
        if r.pos > r.buf.len() {
            return Err(BocError::Truncated("header"));
        }
    }

    let cell_count = r.uint(ref_size, "cell count")?;
    let root_count = r.uint(ref_size, "root count")?;
    let _absent = r.uint(ref_size, "absent count")?;
    let total_size = r.uint(off_size, "total cells size")?;

    let mut root_indices = Vec::new();
    for _ in 0..root_count {
        let index = r.uint(ref_size, "root index")?;
        if index >= cell_count {
            return Err(BocError::InvalidHeader(format!(
                "root index {index} out of {cell_count} cells"
            )));
        }
        root_indices.push(index);
    }

    if has_index {
        let index_len = cell_count
            .checked_mul(off_size)
            .ok_or_else(|| BocError::InvalidHeader("index size overflows".to_owned()))?;
        r.take(index_len, "cell index")?;
    }

    let cell_bytes = r.take(total_size, "cell data")?;
    // Every cell needs at least its two descriptor bytes.
    if cell_count > total_size / 2 {
        return Err(BocError::InvalidHeader(format!(
            "{cell_count} cells cannot fit in {total_size} bytes"
        )));
    }
    if r.remaining() != 0 {
        return Err(BocError::InvalidHeader(format!(
            "{} trailing bytes after cell data",
            r.remaining()
        )));
    }

    let mut cr = Reader {
        buf: cell_bytes,
        pos: 0,
    };
    let mut raw_cells = Vec::with_capacity(cell_count);
    for index in 0..cell_count {
        raw_cells.push(read_raw_cell(&mut cr, index, cell_count, ref_size)?);
    }
    if cr.remaining() != 0 {
        return Err(BocError::InvalidHeader(format!(
            "{} unused bytes in cell data",
            cr.remaining()
        )));
    }

    // References only point forward, so building from the back guarantees
    // every child exists before its parent.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for (index, raw) in raw_cells.into_iter().enumerate().rev() {
        let mut refs = Vec::with_capacity(raw.refs.len());
        for target in raw.refs {
            let child = built
                .get(target)
                .cloned()
                .flatten()
                .ok_or(BocError::InvalidReference { index, target })?;
            refs.push(child);
        }
        let cell = Cell::new(raw.data, raw.bit_len, refs).map_err(|e| BocError::InvalidCell {
            index,
            reason: e.to_string(),
        })?;
        built[index] = Some(Arc::new(cell));
    }

    let roots = root_indices
        .into_iter()
        .map(|index| {
            built[index].clone().ok_or_else(|| {
                BocError::InvalidHeader(format!("root index {index} was not built"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        cells = cell_count,
        roots = roots.len(),
        bytes = bytes.len(),
        "decoded bag of cells"
    );
    Ok(roots)
}

fn read_raw_cell(
    r: &mut Reader<'_>,
    index: usize,
    cell_count: usize,
    ref_size: usize,
) -> Result<RawCell, BocError> {
    let d1 = r.byte("cell descriptor")?;
    let d2 = r.byte("cell descriptor")?;

    let ref_count = (d1 & D1_REFS_MASK) as usize;
    if ref_count > MAX_REFS {
        return Err(BocError::InvalidCell {
            index,
            reason: format!("{ref_count} references"),
        });
    }
    if d1 & D1_EXOTIC != 0 {
        return Err(BocError::ExoticCell { index });
    }
    let level = d1 >> D1_LEVEL_SHIFT;
    if level != 0 {
        return Err(BocError::InvalidCell {
            index,
            reason: format!("ordinary cell with level {level}"),
        });
    }
    if d1 & D1_WITH_HASHES != 0 {
        // Stored hash and depth; recomputed from content instead.
        r.take(32 + 2, "stored cell hash")?;
    }

    let data_len = (d2 as usize).div_ceil(2);
    let mut data = r.take(data_len, "cell data")?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data.len() - 1;
        let tail = data[last];
        if tail == 0 {
            return Err(BocError::InvalidCell {
                index,
                reason: "missing completion tag".to_owned(),
            });
        }
        let tag_pos = tail.trailing_zeros() as usize;
        data[last] &= !(1u8 << tag_pos);
        last * 8 + (7 - tag_pos)
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = r.uint(ref_size, "cell reference")?;
        if target <= index || target >= cell_count {
            return Err(BocError::InvalidReference { index, target });
        }
        refs.push(target);
    }

    Ok(RawCell {
        data,
        bit_len,
        refs,
    })
}

// ==============================================================================
// Encoding
// ==============================================================================

/// Serialize `roots` in the generic format. Identical subtrees are stored
/// once; parents always precede their children.
pub fn encode_roots(roots: &[Arc<Cell>], with_crc: bool) -> Vec<u8> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for root in roots.iter().rev() {
        post_order(root, &mut seen, &mut order);
    }
    order.reverse();

    let index: HashMap<HashBytes, usize> = order
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.hash(), i))
        .collect();
    let ref_size = bytes_needed(order.len().max(roots.len()));

    let mut cells = Vec::new();
    for cell in &order {
        cells.extend_from_slice(&cell.descriptors());
        cells.extend_from_slice(&cell.tagged_data());
        for child in cell.refs() {
            put_uint(&mut cells, index[&child.hash()], ref_size);
        }
    }
    let off_size = bytes_needed(cells.len());

    let mut out = Vec::with_capacity(cells.len() + 32);
    out.extend_from_slice(&GENERIC_MAGIC.to_be_bytes());
    out.push(if with_crc { FLAG_HAS_CRC } else { 0 } | ref_size as u8);
    out.push(off_size as u8);
    put_uint(&mut out, order.len(), ref_size);
    put_uint(&mut out, roots.len(), ref_size);
    put_uint(&mut out, 0, ref_size);
    put_uint(&mut out, cells.len(), off_size);
    for root in roots {
        put_uint(&mut out, index[&root.hash()], ref_size);
    }
    out.extend_from_slice(&cells);
    if with_crc {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }
    out
}

fn post_order(cell: &Arc<Cell>, seen: &mut HashSet<HashBytes>, order: &mut Vec<Arc<Cell>>) {
    if !seen.insert(cell.hash()) {
        return;
    }
    for child in cell.refs() {
        post_order(child, seen, order);
    }
    order.push(cell.clone());
}

fn bytes_needed(value: usize) -> usize {
    let bits = usize::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

fn put_uint(out: &mut Vec<u8>, value: usize, size: usize) {
    let be = (value as u64).to_be_bytes();
    out.extend_from_slice(&be[8 - size..]);
}
