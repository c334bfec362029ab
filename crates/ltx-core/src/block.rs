//! `tonNode.blockIdExt` on the wire, and skipping runs of them.

use tracing::trace;

use crate::error::{CoreError, WireError};
use crate::types::{BlockRef, HashBytes};
use crate::wire::{Cursor, Discard, WireWriter};

/// Encoded size of a block id: workchain, shard, seqno, two hashes.
pub const BLOCK_REF_LEN: usize = 4 + 8 + 4 + 32 + 32;

pub fn read_block_ref(cur: Cursor<'_>) -> Result<(BlockRef, Cursor<'_>), WireError> {
    // Check the whole record up front so a short buffer reports the full
    // record size rather than whichever sub-field ran out first.
    if cur.len() < BLOCK_REF_LEN {
        return Err(WireError::Truncated {
            field: "block id",
            needed: BLOCK_REF_LEN,
            remaining: cur.len(),
        });
    }
    let (workchain, cur) = cur.read_i32("block workchain")?;
    let (shard, cur) = cur.read_i64("block shard")?;
    let (seqno, cur) = cur.read_i32("block seqno")?;
    let (root_hash, cur) = cur.read_int256("block root hash")?;
    let (file_hash, cur) = cur.read_int256("block file hash")?;
    Ok((
        BlockRef {
            workchain,
            shard,
            seqno,
            root_hash: HashBytes(root_hash),
            file_hash: HashBytes(file_hash),
        },
        cur,
    ))
}

pub fn write_block_ref(w: &mut WireWriter, block: &BlockRef) {
    w.put_i32(block.workchain)
        .put_i64(block.shard)
        .put_i32(block.seqno)
        .put_int256(block.root_hash.as_bytes())
        .put_int256(block.file_hash.as_bytes());
}

/// Advance past `count` block ids, dropping their values.
///
/// Stops at the first failure and reports its index.
pub fn skip_block_refs(cur: Cursor<'_>, count: u32, why: Discard) -> Result<Cursor<'_>, CoreError> {
    let mut cur = cur;
    for index in 0..count as usize {
        let (block, rest) = read_block_ref(cur)
            .map_err(|source| CoreError::FailedHeaderDecode { index, source })?;
        trace!(index, seqno = block.seqno, reason = ?why, "skipped block id");
        cur = rest;
    }
    Ok(cur)
}
