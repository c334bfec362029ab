//! Lite-server transport abstraction.
//!
//! Defines the [`LiteTransport`] trait the client sends requests through,
//! the request/answer types, and a test mock (`mock::MockTransport`).

#[cfg(test)]
pub mod mock;
pub mod types;

pub use types::{tag, GetOneTransaction, GetTransactions, LiteRequest, RawResponse};

use async_trait::async_trait;

use crate::error::RpcError;

/// One request/answer exchange with a lite server.
///
/// Implementations own connection selection, session encryption, retries
/// and query wrapping. They return the answer's constructor tag and payload
/// untouched; decoding happens above this trait.
#[async_trait]
pub trait LiteTransport: Send + Sync {
    async fn do_request(&self, request: &LiteRequest) -> Result<RawResponse, RpcError>;
}
