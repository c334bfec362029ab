//! Lite-server answer decoding.
//!
//! Pure functions from `(type_id, payload)` to transaction records. Nothing
//! here performs I/O; the client feeds transport answers through these and
//! tests feed captured bytes.

use tracing::{debug, trace, warn};

use crate::block::{read_block_ref, skip_block_refs};
use crate::boc::{decode_roots, Cell};
use crate::error::{CoreError, LiteServerFailure, TreeError, WireError};
use crate::rpc::{tag, RawResponse};
use crate::tlb::TransactionLoader;
use crate::types::TransactionRecord;
use crate::wire::{Cursor, Discard};

/// Minimum success payload for a transaction list: anything up to and
/// including a bare vector count is rejected before parsing.
const MIN_LIST_PAYLOAD: usize = 4;

// ==============================================================================
// Dispatch
// ==============================================================================

/// Decode the answer to `liteServer.getOneTransaction`.
pub fn decode_one_response(
    response: &RawResponse,
    loader: &dyn TransactionLoader,
) -> Result<TransactionRecord, CoreError> {
    debug!(ls.type_id = response.type_id, data_len = response.data.len(), "decode one");
    match response.type_id {
        tag::TRANSACTION_INFO => decode_transaction_info(&response.data, loader),
        tag::ERROR => Err(decode_server_error(&response.data)?.into()),
        other => Err(CoreError::UnknownResponseType(other)),
    }
}

/// Decode the answer to `liteServer.getTransactions`. Records come back in
/// the order the server packed their roots.
pub fn decode_list_response(
    response: &RawResponse,
    loader: &dyn TransactionLoader,
) -> Result<Vec<TransactionRecord>, CoreError> {
    debug!(ls.type_id = response.type_id, data_len = response.data.len(), "decode list");
    match response.type_id {
        tag::TRANSACTION_LIST => decode_transaction_list(&response.data, loader),
        tag::ERROR => Err(decode_server_error(&response.data)?.into()),
        other => Err(CoreError::UnknownResponseType(other)),
    }
}

/// A decoded answer of either success shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    One(TransactionRecord),
    List(Vec<TransactionRecord>),
}

impl Decoded {
    pub fn into_records(self) -> Vec<TransactionRecord> {
        match self {
            Self::One(record) => vec![record],
            Self::List(records) => records,
        }
    }
}

/// Decode a captured answer without knowing which request produced it.
pub fn decode_any_response(
    response: &RawResponse,
    loader: &dyn TransactionLoader,
) -> Result<Decoded, CoreError> {
    match response.type_id {
        tag::TRANSACTION_INFO => decode_one_response(response, loader).map(Decoded::One),
        _ => decode_list_response(response, loader).map(Decoded::List),
    }
}

// ==============================================================================
// Success Payloads
// ==============================================================================

/// `liteServer.transactionInfo id:tonNode.blockIdExt proof:bytes transaction:bytes`
pub fn decode_transaction_info(
    data: &[u8],
    loader: &dyn TransactionLoader,
) -> Result<TransactionRecord, CoreError> {
    let cur = Cursor::new(data);
    let (block, cur) = read_block_ref(cur)?;
    trace!(seqno = block.seqno, reason = ?Discard::EchoedBlockId, "skipped block id");
    let cur = cur.skip_bytes("proof", Discard::UnverifiedProof)?;
    let (blob, cur) = cur.read_bytes("transaction")?;
    warn_trailing("transactionInfo", cur);

    let roots = decode_roots(blob).map_err(TreeError::from)?;
    if roots.len() != 1 {
        return Err(TreeError::RootCount {
            expected: 1,
            found: roots.len(),
        }
        .into());
    }
    Ok(materialize(&roots[0], 0, loader)?)
}

/// `liteServer.transactionList ids:(vector tonNode.blockIdExt) transactions:bytes`
pub fn decode_transaction_list(
    data: &[u8],
    loader: &dyn TransactionLoader,
) -> Result<Vec<TransactionRecord>, CoreError> {
    if data.len() <= MIN_LIST_PAYLOAD {
        return Err(WireError::TooShortResponse { len: data.len() }.into());
    }
    let (count, cur) = Cursor::new(data).read_u32("block id count")?;
    let cur = skip_block_refs(cur, count, Discard::BlockHeader)?;
    let (blob, cur) = cur.read_bytes("transactions")?;
    warn_trailing("transactionList", cur);

    let roots = decode_roots(blob).map_err(TreeError::from)?;
    debug!(headers = count, roots = roots.len(), "transaction list decoded");
    let records = roots
        .iter()
        .enumerate()
        .map(|(index, root)| materialize(root, index, loader))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn warn_trailing(what: &'static str, cur: Cursor<'_>) {
    if !cur.is_empty() {
        warn!(what, trailing = cur.len(), "unexpected bytes after answer");
    }
}

// ==============================================================================
// Materializer
// ==============================================================================

/// Load the transaction rooted at `root` and stamp it with the root hash.
///
/// Whatever hash the loader produced is replaced: the cell hash is the
/// transaction's identity.
pub fn materialize(
    root: &Cell,
    index: usize,
    loader: &dyn TransactionLoader,
) -> Result<TransactionRecord, TreeError> {
    let mut slice = root.begin_parse();
    let mut record = loader
        .load(&mut slice)
        .map_err(|source| TreeError::Load { index, source })?;
    record.hash = root.hash();
    Ok(record)
}

// ==============================================================================
// Server Errors
// ==============================================================================

/// `liteServer.error code:int message:string`
pub fn decode_server_error(data: &[u8]) -> Result<LiteServerFailure, WireError> {
    let (code, cur) = Cursor::new(data).read_i32("error code")?;
    let (message, _) = cur.read_string("error message")?;
    debug!(code, %message, "lite server error");
    Ok(LiteServerFailure::from_code(code, message))
}
