//! Shared test helpers for `ltx-core` unit tests.
//!
//! Builders for block ids, transaction cells and lite-server answer
//! payloads, so every module decodes the same fixtures.

use std::sync::Arc;

use crate::block::write_block_ref;
use crate::boc::{encode_roots, Cell, CellBuilder};
use crate::error::BocError;
use crate::types::{BlockRef, HashBytes};
use crate::wire::WireWriter;

// ==============================================================================
// Identifiers
// ==============================================================================

/// Deterministic masterchain block id distinguished by `seqno`.
pub fn block_ref(seqno: i32) -> BlockRef {
    BlockRef {
        workchain: -1,
        shard: i64::MIN,
        seqno,
        root_hash: HashBytes([seqno as u8; 32]),
        file_hash: HashBytes([!(seqno as u8); 32]),
    }
}

// ==============================================================================
// Cells
// ==============================================================================

/// An 8-bit leaf cell, unique per `byte`.
pub fn leaf_cell(byte: u8) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(byte), 8).expect("8 bits fit");
    b.build().expect("leaf cell")
}

/// Store a `HashmapE key_bits ^X`, using long labels throughout.
pub fn store_ref_dict(
    b: &mut CellBuilder,
    key_bits: usize,
    entries: &[(u64, Arc<Cell>)],
) -> Result<(), BocError> {
    if entries.is_empty() {
        b.store_bit(false)?;
        return Ok(());
    }
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let root = dict_node(key_bits, &sorted)?;
    b.store_maybe_ref(Some(root))?;
    Ok(())
}

fn dict_node(key_bits: usize, entries: &[(u64, Arc<Cell>)]) -> Result<Arc<Cell>, BocError> {
    let first = entries[0].0;
    let diff = entries.iter().fold(0u64, |acc, (k, _)| acc | (k ^ first));
    let prefix_len = if diff == 0 {
        key_bits
    } else {
        key_bits - (64 - diff.leading_zeros() as usize)
    };
    let label = if prefix_len == 0 {
        0
    } else {
        first >> (key_bits - prefix_len)
    };
    let width = (usize::BITS - key_bits.leading_zeros()) as usize;

    let mut b = CellBuilder::new();
    b.store_uint(0b10, 2)?;
    b.store_uint(prefix_len as u64, width)?;
    b.store_uint(label, prefix_len)?;

    let rest = key_bits - prefix_len;
    if rest == 0 {
        b.store_ref(entries[0].1.clone())?;
    } else {
        let child_bits = rest - 1;
        let mask = (1u64 << child_bits) - 1;
        let (left, right): (Vec<_>, Vec<_>) = entries
            .iter()
            .map(|(k, v)| ((k >> child_bits) & 1, (k & mask, v.clone())))
            .partition(|(side, _)| *side == 0);
        let strip = |side: Vec<(u64, (u64, Arc<Cell>))>| -> Vec<(u64, Arc<Cell>)> {
            side.into_iter().map(|(_, entry)| entry).collect()
        };
        b.store_ref(dict_node(child_bits, &strip(left))?)?;
        b.store_ref(dict_node(child_bits, &strip(right))?)?;
    }
    b.build()
}

/// Knobs for a synthetic `transaction$0111` cell.
#[derive(Debug, Clone)]
pub struct TxParams {
    pub account: HashBytes,
    pub lt: u64,
    pub prev_tx_hash: HashBytes,
    pub prev_tx_lt: u64,
    pub now: u32,
    pub fees: u128,
    pub with_in_msg: bool,
    pub out_msgs: u16,
    /// Overrides `outmsg_cnt` when set, to build inconsistent transactions.
    pub declared_out_msgs: Option<u16>,
}

impl Default for TxParams {
    fn default() -> Self {
        Self {
            account: HashBytes([0x11; 32]),
            lt: 1_000,
            prev_tx_hash: HashBytes([0x22; 32]),
            prev_tx_lt: 900,
            now: 1_650_000_000,
            fees: 0,
            with_in_msg: true,
            out_msgs: 0,
            declared_out_msgs: None,
        }
    }
}

impl TxParams {
    pub fn with_lt(lt: u64) -> Self {
        Self {
            lt,
            ..Self::default()
        }
    }
}

fn message_cell(prefix: u64, prefix_bits: usize, id: u64) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_uint(prefix, prefix_bits)
        .and_then(|b| b.store_uint(id, 64))
        .expect("message bits fit");
    b.build().expect("message cell")
}

pub fn transaction_cell(params: &TxParams) -> Arc<Cell> {
    let in_msg = params
        .with_in_msg
        .then(|| message_cell(0b10, 2, params.lt));
    let outs: Vec<(u64, Arc<Cell>)> = (0..params.out_msgs)
        .map(|i| (u64::from(i), message_cell(0, 1, params.lt + u64::from(i) + 1)))
        .collect();

    let mut msgs = CellBuilder::new();
    msgs.store_maybe_ref(in_msg).expect("in_msg");
    store_ref_dict(&mut msgs, 15, &outs).expect("out_msgs");
    let msgs = msgs.build().expect("messages cell");

    let mut update = CellBuilder::new();
    update
        .store_uint(0x72, 8)
        .and_then(|b| b.store_bytes(&[0x0a; 32]))
        .and_then(|b| b.store_bytes(&[0x0b; 32]))
        .expect("hash update");
    let update = update.build().expect("hash update cell");

    let mut descr = CellBuilder::new();
    descr.store_uint(0b0000, 4).expect("ordinary tag");
    let descr = descr.build().expect("description cell");

    let declared = params.declared_out_msgs.unwrap_or(params.out_msgs);
    let mut b = CellBuilder::new();
    b.store_uint(0b0111, 4)
        .and_then(|b| b.store_bytes(params.account.as_bytes()))
        .and_then(|b| b.store_uint(params.lt, 64))
        .and_then(|b| b.store_bytes(params.prev_tx_hash.as_bytes()))
        .and_then(|b| b.store_uint(params.prev_tx_lt, 64))
        .and_then(|b| b.store_uint(u64::from(params.now), 32))
        .and_then(|b| b.store_uint(u64::from(declared), 15))
        .and_then(|b| b.store_uint(0b10, 2))
        .and_then(|b| b.store_uint(0b10, 2))
        .and_then(|b| b.store_ref(msgs))
        .and_then(|b| b.store_coins(params.fees))
        .and_then(|b| b.store_bit(false))
        .and_then(|b| b.store_ref(update))
        .and_then(|b| b.store_ref(descr))
        .expect("transaction fields fit");
    b.build().expect("transaction cell")
}

// ==============================================================================
// Lite-server Answer Payloads
// ==============================================================================

/// Body of `liteServer.transactionInfo`.
pub fn transaction_info_payload(block: &BlockRef, proof: &[u8], roots: &[Arc<Cell>]) -> Vec<u8> {
    let mut w = WireWriter::new();
    write_block_ref(&mut w, block);
    w.put_bytes(proof).put_bytes(&encode_roots(roots, true));
    w.into_inner()
}

/// Body of `liteServer.transactionList`.
pub fn transaction_list_payload(blocks: &[BlockRef], roots: &[Arc<Cell>]) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.put_u32(blocks.len() as u32);
    for block in blocks {
        write_block_ref(&mut w, block);
    }
    w.put_bytes(&encode_roots(roots, true));
    w.into_inner()
}

/// Body of `liteServer.error`.
pub fn error_payload(code: i32, message: &str) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.put_i32(code).put_bytes(message.as_bytes());
    w.into_inner()
}
