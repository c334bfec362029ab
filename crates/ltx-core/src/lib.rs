pub mod block;
pub mod boc;
pub mod client;
pub mod decode;
pub mod error;
pub mod rpc;
pub mod tlb;
pub mod types;
pub mod wire;

#[cfg(test)]
mod test_util;

pub use client::{ClientConfig, LiteClient};
pub use error::CoreError;
pub use types::{AccountId, BlockRef, HashBytes, PaginationAnchor, TransactionRecord};
