//! Lite-server request and answer shapes.
//!
//! Requests know how to pack themselves into TL bytes; the transport decides
//! how those bytes reach the node. Answers come back as a constructor tag
//! plus the remaining payload.

use crate::block::write_block_ref;
use crate::error::WireError;
use crate::types::{AccountId, BlockRef, HashBytes};
use crate::wire::{Cursor, WireWriter};

// ==============================================================================
// Constructor Tags
// ==============================================================================

/// TL constructor tags for the schemas used here.
pub mod tag {
    /// `liteServer.getOneTransaction id:tonNode.blockIdExt account:liteServer.accountId lt:long`
    pub const GET_ONE_TRANSACTION: u32 = 0xd40f_24ea;
    /// `liteServer.getTransactions count:# account:liteServer.accountId lt:long hash:int256`
    pub const GET_TRANSACTIONS: u32 = 0x1c40_e7a1;
    /// `liteServer.transactionInfo id:tonNode.blockIdExt proof:bytes transaction:bytes`
    pub const TRANSACTION_INFO: u32 = 0x0ede_ed47;
    /// `liteServer.transactionList ids:(vector tonNode.blockIdExt) transactions:bytes`
    pub const TRANSACTION_LIST: u32 = 0x6f26_c60b;
    /// `liteServer.error code:int message:string`
    pub const ERROR: u32 = 0xbba9_e148;
}

// ==============================================================================
// Requests
// ==============================================================================

/// Fetch one transaction of `account` at `lt` inside `block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOneTransaction {
    pub block: BlockRef,
    pub account: AccountId,
    pub lt: u64,
}

/// Fetch up to `limit` transactions of `account`, walking back from the one
/// identified by (`lt`, `hash`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTransactions {
    pub limit: u32,
    pub account: AccountId,
    pub lt: u64,
    pub hash: HashBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteRequest {
    GetOneTransaction(GetOneTransaction),
    GetTransactions(GetTransactions),
}

impl LiteRequest {
    pub fn tag(&self) -> u32 {
        match self {
            Self::GetOneTransaction(_) => tag::GET_ONE_TRANSACTION,
            Self::GetTransactions(_) => tag::GET_TRANSACTIONS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetOneTransaction(_) => "liteServer.getOneTransaction",
            Self::GetTransactions(_) => "liteServer.getTransactions",
        }
    }

    /// TL encoding: constructor tag followed by the fields.
    ///
    /// `lt` and `limit` are written with the bit pattern of the signed TL
    /// fields they occupy; callers keep them within the signed range.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_u32(self.tag());
        match self {
            Self::GetOneTransaction(req) => {
                write_block_ref(&mut w, &req.block);
                write_account(&mut w, &req.account);
                w.put_u64(req.lt);
            }
            Self::GetTransactions(req) => {
                w.put_u32(req.limit);
                write_account(&mut w, &req.account);
                w.put_u64(req.lt).put_int256(req.hash.as_bytes());
            }
        }
        w.into_inner()
    }
}

fn write_account(w: &mut WireWriter, account: &AccountId) {
    w.put_i32(account.workchain).put_int256(account.id.as_bytes());
}

// ==============================================================================
// Answers
// ==============================================================================

/// An undecoded answer: the constructor tag and the bytes that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub type_id: u32,
    pub data: Vec<u8>,
}

impl RawResponse {
    pub fn new(type_id: u32, data: Vec<u8>) -> Self {
        Self { type_id, data }
    }

    /// Split a full TL answer into tag and payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let (type_id, rest) = Cursor::new(bytes).read_u32("constructor tag")?;
        Ok(Self {
            type_id,
            data: rest.remaining().to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.extend_from_slice(&self.type_id.to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}
