//! Domain types for transaction lookups.
//!
//! Identifiers supplied by the caller (`AccountId`, `BlockRef`,
//! `PaginationAnchor`) and the materialized `TransactionRecord` with the
//! small enums it is built from.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ParseIdError;

// ==============================================================================
// Hash Bytes
// ==============================================================================

/// A 256-bit value (cell hash, account id, block hash), shown as lowercase hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashBytes(pub [u8; 32]);

impl HashBytes {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for HashBytes {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for HashBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for HashBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashBytes({self})")
    }
}

impl FromStr for HashBytes {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim())?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ParseIdError::Length(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for HashBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ==============================================================================
// Request Identifiers
// ==============================================================================

/// The account whose history is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AccountId {
    pub workchain: i32,
    pub id: HashBytes,
}

impl AccountId {
    pub fn new(workchain: i32, id: [u8; 32]) -> Self {
        Self {
            workchain,
            id: HashBytes(id),
        }
    }
}

/// Parses the raw `workchain:hex` form, e.g. `0:83df…`.
impl FromStr for AccountId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, id) = s.split_once(':').ok_or_else(|| ParseIdError::Format {
            what: "account id",
            value: s.to_owned(),
        })?;
        let workchain = wc.parse().map_err(|_| ParseIdError::Format {
            what: "workchain",
            value: wc.to_owned(),
        })?;
        Ok(Self {
            workchain,
            id: id.parse()?,
        })
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, self.id)
    }
}

/// Full block identifier (`tonNode.blockIdExt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockRef {
    pub workchain: i32,
    pub shard: i64,
    pub seqno: i32,
    pub root_hash: HashBytes,
    pub file_hash: HashBytes,
}

/// Parses `workchain:shard_hex:seqno:root_hash:file_hash`.
impl FromStr for BlockRef {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |what: &'static str, value: &str| ParseIdError::Format {
            what,
            value: value.to_owned(),
        };
        let parts: Vec<&str> = s.split(':').collect();
        let [wc, shard, seqno, root_hash, file_hash] = parts.as_slice() else {
            return Err(bad("block id", s));
        };
        let shard = u64::from_str_radix(shard.trim_start_matches("0x"), 16)
            .map_err(|_| bad("shard", shard))?;
        Ok(Self {
            workchain: wc.parse().map_err(|_| bad("workchain", wc))?,
            shard: shard as i64,
            seqno: seqno.parse().map_err(|_| bad("seqno", seqno))?,
            root_hash: root_hash.parse()?,
            file_hash: file_hash.parse()?,
        })
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:016x}:{}:{}:{}",
            self.workchain, self.shard as u64, self.seqno, self.root_hash, self.file_hash
        )
    }
}

/// Starting point for "before or including" history retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationAnchor {
    pub lt: u64,
    pub hash: HashBytes,
}

// ==============================================================================
// Transaction Record
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Uninit,
    Frozen,
    Active,
    NonExist,
}

impl AccountStatus {
    pub(crate) fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0b00 => Self::Uninit,
            0b01 => Self::Frozen,
            0b10 => Self::Active,
            _ => Self::NonExist,
        }
    }
}

/// Variant of the transaction description; its body is not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Ordinary,
    Storage,
    TickTock,
    SplitPrepare,
    SplitInstall,
    MergePrepare,
    MergeInstall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Internal,
    ExternalIn,
    ExternalOut,
}

/// A message attached to a transaction, identified by its cell hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageRef {
    pub kind: MessageKind,
    pub hash: HashBytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HashUpdate {
    pub old_hash: HashBytes,
    pub new_hash: HashBytes,
}

/// An amount in nanograms. Serialized as a decimal string, since values can
/// exceed what JSON numbers carry safely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grams(pub u128);

impl fmt::Display for Grams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Grams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One materialized transaction.
///
/// `hash` is always the content hash of the cell the record was loaded
/// from; it is set after loading and never derived from the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub hash: HashBytes,
    pub account: HashBytes,
    pub lt: u64,
    pub prev_tx_hash: HashBytes,
    pub prev_tx_lt: u64,
    pub now: u32,
    pub out_msg_count: u16,
    pub orig_status: AccountStatus,
    pub end_status: AccountStatus,
    pub in_msg: Option<MessageRef>,
    pub out_msgs: Vec<MessageRef>,
    pub total_fees: Grams,
    pub has_extra_currencies: bool,
    pub state_update: HashUpdate,
    pub kind: TransactionKind,
}
