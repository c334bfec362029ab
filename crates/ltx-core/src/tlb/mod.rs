//! Structured loading of transaction cells.
//!
//! [`TransactionLoader`] is the seam between a parsed cell tree and a
//! [`TransactionRecord`]. [`TlbTransactionLoader`] implements the block
//! schema's `Transaction` layout.

mod dict;

pub use dict::load_ref_dict;

use crate::boc::{Cell, CellSlice};
use crate::error::LoadError;
use crate::types::{
    AccountStatus, Grams, HashBytes, HashUpdate, MessageKind, MessageRef, TransactionKind,
    TransactionRecord,
};

const TRANSACTION_TAG: u64 = 0b0111;
const HASH_UPDATE_TAG: u64 = 0x72;
const OUT_MSG_KEY_BITS: usize = 15;

/// Populates a transaction record from a cell positioned at its root.
///
/// Implementations leave `hash` at [`HashBytes::ZERO`] or any other value;
/// the caller replaces it with the root cell hash.
pub trait TransactionLoader: Send + Sync {
    fn load(&self, slice: &mut CellSlice<'_>) -> Result<TransactionRecord, LoadError>;
}

/// Loader for the `transaction$0111` layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TlbTransactionLoader;

impl TransactionLoader for TlbTransactionLoader {
    fn load(&self, s: &mut CellSlice<'_>) -> Result<TransactionRecord, LoadError> {
        let field = LoadError::slice;

        let tag = s.load_uint(4).map_err(field("transaction tag"))?;
        if tag != TRANSACTION_TAG {
            return Err(LoadError::UnexpectedTag {
                what: "transaction",
                found: tag,
            });
        }

        let account = s.load_array::<32>().map_err(field("account_addr"))?;
        let lt = s.load_uint(64).map_err(field("lt"))?;
        let prev_tx_hash = s.load_array::<32>().map_err(field("prev_trans_hash"))?;
        let prev_tx_lt = s.load_uint(64).map_err(field("prev_trans_lt"))?;
        let now = s.load_uint(32).map_err(field("now"))? as u32;
        let out_msg_count = s.load_uint(15).map_err(field("outmsg_cnt"))? as u16;
        let orig_status = AccountStatus::from_bits(s.load_uint(2).map_err(field("orig_status"))?);
        let end_status = AccountStatus::from_bits(s.load_uint(2).map_err(field("end_status"))?);

        let messages = s.load_ref().map_err(field("messages"))?;
        let mut ms = messages.begin_parse();
        let in_msg = ms
            .load_maybe_ref()
            .map_err(field("in_msg"))?
            .map(|cell| message_ref(cell))
            .transpose()?;
        let out_msgs = load_ref_dict(&mut ms, OUT_MSG_KEY_BITS)?
            .into_iter()
            .map(|(_, cell)| message_ref(cell))
            .collect::<Result<Vec<_>, _>>()?;
        if out_msgs.len() != usize::from(out_msg_count) {
            return Err(LoadError::OutMessageCountMismatch {
                declared: out_msg_count,
                found: out_msgs.len(),
            });
        }

        let total_fees = s.load_coins().map_err(field("total_fees"))?;
        let has_extra_currencies = s
            .load_maybe_ref()
            .map_err(field("total_fees extra"))?
            .is_some();
        let state_update = load_hash_update(s.load_ref().map_err(field("state_update"))?)?;
        let kind = load_kind(s.load_ref().map_err(field("description"))?)?;

        Ok(TransactionRecord {
            hash: HashBytes::ZERO,
            account: HashBytes(account),
            lt,
            prev_tx_hash: HashBytes(prev_tx_hash),
            prev_tx_lt,
            now,
            out_msg_count,
            orig_status,
            end_status,
            in_msg,
            out_msgs,
            total_fees: Grams(total_fees),
            has_extra_currencies,
            state_update,
            kind,
        })
    }
}

fn message_ref(cell: &Cell) -> Result<MessageRef, LoadError> {
    let mut s = cell.begin_parse();
    let field = LoadError::slice("message info");
    let kind = match s.load_bit() {
        Ok(false) => MessageKind::Internal,
        Ok(true) => match s.load_bit() {
            Ok(false) => MessageKind::ExternalIn,
            Ok(true) => MessageKind::ExternalOut,
            Err(e) => return Err(field(e)),
        },
        Err(e) => return Err(field(e)),
    };
    Ok(MessageRef {
        kind,
        hash: cell.hash(),
    })
}

fn load_hash_update(cell: &Cell) -> Result<HashUpdate, LoadError> {
    let field = LoadError::slice;
    let mut s = cell.begin_parse();
    let tag = s.load_uint(8).map_err(field("hash update tag"))?;
    if tag != HASH_UPDATE_TAG {
        return Err(LoadError::UnexpectedTag {
            what: "hash update",
            found: tag,
        });
    }
    let old_hash = s.load_array::<32>().map_err(field("old_hash"))?;
    let new_hash = s.load_array::<32>().map_err(field("new_hash"))?;
    Ok(HashUpdate {
        old_hash: HashBytes(old_hash),
        new_hash: HashBytes(new_hash),
    })
}

fn load_kind(cell: &Cell) -> Result<TransactionKind, LoadError> {
    let field = LoadError::slice;
    let mut s = cell.begin_parse();
    let head = s.load_uint(3).map_err(field("description tag"))?;
    if head == 0b001 {
        return Ok(TransactionKind::TickTock);
    }
    let last = s.load_bit().map_err(field("description tag"))?;
    match (head, last) {
        (0b000, false) => Ok(TransactionKind::Ordinary),
        (0b000, true) => Ok(TransactionKind::Storage),
        (0b010, false) => Ok(TransactionKind::SplitPrepare),
        (0b010, true) => Ok(TransactionKind::SplitInstall),
        (0b011, false) => Ok(TransactionKind::MergePrepare),
        (0b011, true) => Ok(TransactionKind::MergeInstall),
        _ => Err(LoadError::UnexpectedTag {
            what: "transaction description",
            found: (head << 1) | u64::from(last),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{transaction_cell, TxParams};

    fn load(params: &TxParams) -> Result<TransactionRecord, LoadError> {
        let cell = transaction_cell(params);
        TlbTransactionLoader.load(&mut cell.begin_parse())
    }

    #[test]
    fn loads_all_header_fields() {
        let params = TxParams {
            lt: 47_000_001,
            now: 1_700_000_000,
            fees: 1_234_567,
            out_msgs: 2,
            ..TxParams::default()
        };
        let tx = load(&params).expect("load");
        assert_eq!(tx.hash, HashBytes::ZERO);
        assert_eq!(tx.account, params.account);
        assert_eq!(tx.lt, 47_000_001);
        assert_eq!(tx.prev_tx_hash, params.prev_tx_hash);
        assert_eq!(tx.prev_tx_lt, params.prev_tx_lt);
        assert_eq!(tx.now, 1_700_000_000);
        assert_eq!(tx.orig_status, AccountStatus::Active);
        assert_eq!(tx.end_status, AccountStatus::Active);
        assert_eq!(tx.total_fees, Grams(1_234_567));
        assert!(!tx.has_extra_currencies);
        assert_eq!(tx.kind, TransactionKind::Ordinary);
        assert_eq!(tx.state_update.old_hash, HashBytes([0x0a; 32]));
        assert_eq!(tx.state_update.new_hash, HashBytes([0x0b; 32]));

        let in_msg = tx.in_msg.expect("fixture carries an inbound message");
        assert_eq!(in_msg.kind, MessageKind::ExternalIn);
        assert_eq!(tx.out_msg_count, 2);
        assert_eq!(tx.out_msgs.len(), 2);
        assert!(tx.out_msgs.iter().all(|m| m.kind == MessageKind::Internal));
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let mut b = crate::boc::CellBuilder::new();
        b.store_uint(0b0110, 4).expect("store");
        let cell = b.build().expect("cell");
        assert_eq!(
            TlbTransactionLoader
                .load(&mut cell.begin_parse())
                .expect_err("not a transaction"),
            LoadError::UnexpectedTag {
                what: "transaction",
                found: 0b0110
            }
        );
    }

    #[test]
    fn truncated_cell_names_the_field() {
        let mut b = crate::boc::CellBuilder::new();
        b.store_uint(TRANSACTION_TAG, 4)
            .and_then(|b| b.store_bytes(&[0; 32]))
            .and_then(|b| b.store_uint(5, 32))
            .expect("store");
        let cell = b.build().expect("cell");
        let err = TlbTransactionLoader
            .load(&mut cell.begin_parse())
            .expect_err("lt is cut short");
        assert!(matches!(err, LoadError::Slice { field: "lt", .. }));
    }

    #[test]
    fn out_message_count_must_match_dictionary() {
        let params = TxParams {
            out_msgs: 3,
            declared_out_msgs: Some(1),
            ..TxParams::default()
        };
        assert_eq!(
            load(&params).expect_err("count mismatch"),
            LoadError::OutMessageCountMismatch {
                declared: 1,
                found: 3
            }
        );
    }

    #[test]
    fn description_variants() {
        for (bits, width, kind) in [
            (0b0001u64, 4usize, TransactionKind::Storage),
            (0b001, 3, TransactionKind::TickTock),
            (0b0101, 4, TransactionKind::SplitInstall),
            (0b0110, 4, TransactionKind::MergePrepare),
        ] {
            let mut b = crate::boc::CellBuilder::new();
            b.store_uint(bits, width).expect("store");
            let cell = b.build().expect("cell");
            assert_eq!(load_kind(&cell).expect("kind"), kind);
        }
        let mut b = crate::boc::CellBuilder::new();
        b.store_uint(0b1000, 4).expect("store");
        let cell = b.build().expect("cell");
        assert!(load_kind(&cell).is_err());
    }
}
