//! Read-only walker for `HashmapE n ^X` dictionaries.

use std::sync::Arc;

use crate::boc::{Cell, CellSlice};
use crate::error::LoadError;

/// Load a dictionary whose values are single references and return its
/// entries in ascending key order. `key_bits` must be at most 64.
pub fn load_ref_dict<'a>(
    slice: &mut CellSlice<'a>,
    key_bits: usize,
) -> Result<Vec<(u64, &'a Arc<Cell>)>, LoadError> {
    debug_assert!(key_bits <= 64);
    let root = slice
        .load_maybe_ref()
        .map_err(LoadError::slice("dictionary root"))?;
    let mut entries = Vec::new();
    if let Some(root) = root {
        walk(root, key_bits, 0, &mut entries)?;
    }
    Ok(entries)
}

fn walk<'a>(
    node: &'a Arc<Cell>,
    remaining: usize,
    prefix: u64,
    entries: &mut Vec<(u64, &'a Arc<Cell>)>,
) -> Result<(), LoadError> {
    let cell: &'a Cell = node;
    let mut s = cell.begin_parse();
    let (label, len) = load_label(&mut s, remaining)?;
    let key = append_bits(prefix, label, len);
    let rest = remaining - len;

    if rest == 0 {
        let value = s.load_ref().map_err(LoadError::slice("dictionary value"))?;
        entries.push((key, value));
        return Ok(());
    }

    let left = s.load_ref().map_err(LoadError::slice("dictionary fork"))?;
    let right = s.load_ref().map_err(LoadError::slice("dictionary fork"))?;
    walk(left, rest - 1, append_bits(key, 0, 1), entries)?;
    walk(right, rest - 1, append_bits(key, 1, 1), entries)
}

/// `HmLabel ~l m`: short (unary length), long (explicit length) or same
/// (repeated bit) form. Returns the label bits and their count.
fn load_label(s: &mut CellSlice<'_>, max: usize) -> Result<(u64, usize), LoadError> {
    let field = LoadError::slice;
    if !s.load_bit().map_err(field("label kind"))? {
        let mut len = 0;
        while s.load_bit().map_err(field("label length"))? {
            len += 1;
            if len > max {
                return Err(LoadError::InvalidLabel { len, max });
            }
        }
        let bits = s.load_uint(len).map_err(field("label bits"))?;
        return Ok((bits, len));
    }

    let same = s.load_bit().map_err(field("label kind"))?;
    let width = (usize::BITS - max.leading_zeros()) as usize;
    if !same {
        let len = s.load_uint(width).map_err(field("label length"))? as usize;
        if len > max {
            return Err(LoadError::InvalidLabel { len, max });
        }
        let bits = s.load_uint(len).map_err(field("label bits"))?;
        Ok((bits, len))
    } else {
        let bit = s.load_bit().map_err(field("label bit"))?;
        let len = s.load_uint(width).map_err(field("label length"))? as usize;
        if len > max {
            return Err(LoadError::InvalidLabel { len, max });
        }
        let bits = if bit { low_ones(len) } else { 0 };
        Ok((bits, len))
    }
}

fn append_bits(prefix: u64, bits: u64, len: usize) -> u64 {
    if len >= 64 {
        bits
    } else {
        (prefix << len) | bits
    }
}

fn low_ones(len: usize) -> u64 {
    if len >= 64 {
        u64::MAX
    } else {
        (1u64 << len) - 1
    }
}
