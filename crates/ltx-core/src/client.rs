use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::decode::{decode_list_response, decode_one_response};
use crate::error::{CoreError, RpcError};
use crate::rpc::{GetOneTransaction, GetTransactions, LiteRequest, LiteTransport, RawResponse};
use crate::tlb::{TlbTransactionLoader, TransactionLoader};
use crate::types::{AccountId, BlockRef, PaginationAnchor, TransactionRecord};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deadline for one transport exchange. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

// ==============================================================================
// LiteClient
// ==============================================================================

/// Transaction history lookups against a lite server.
///
/// The client holds no per-call state beyond a request counter used to
/// correlate log lines, so one instance can serve concurrent callers.
/// Dropping a returned future cancels the outstanding exchange.
pub struct LiteClient {
    transport: Arc<dyn LiteTransport>,
    loader: Arc<dyn TransactionLoader>,
    config: ClientConfig,
    next_id: AtomicU64,
}

impl LiteClient {
    pub fn new(transport: Arc<dyn LiteTransport>) -> Self {
        Self {
            transport,
            loader: Arc::new(TlbTransactionLoader),
            config: ClientConfig::default(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn TransactionLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the transaction of `account` at logical time `lt` inside `block`.
    pub async fn get_transaction(
        &self,
        block: &BlockRef,
        account: &AccountId,
        lt: u64,
    ) -> Result<TransactionRecord, CoreError> {
        let request = LiteRequest::GetOneTransaction(GetOneTransaction {
            block: *block,
            account: *account,
            lt,
        });
        let response = self.exchange(&request).await?;
        decode_one_response(&response, self.loader.as_ref())
    }

    /// Fetch up to `limit` transactions of `account`, starting at `anchor`
    /// and walking back in time.
    ///
    /// Records are returned in the order the server sent them, which the
    /// lite-server protocol defines as oldest first. `limit` must fit in a
    /// signed 32-bit integer.
    pub async fn list_transactions(
        &self,
        account: &AccountId,
        limit: u32,
        anchor: &PaginationAnchor,
    ) -> Result<Vec<TransactionRecord>, CoreError> {
        let request = LiteRequest::GetTransactions(GetTransactions {
            limit,
            account: *account,
            lt: anchor.lt,
            hash: anchor.hash,
        });
        let response = self.exchange(&request).await?;
        decode_list_response(&response, self.loader.as_ref())
    }

    async fn exchange(&self, request: &LiteRequest) -> Result<RawResponse, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(ls.id = id, ls.method = request.name(), "lite server request");

        let call = self.transport.do_request(request);
        let response = match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RpcError::Timeout(limit))??,
            None => call.await?,
        };

        debug!(
            ls.id = id,
            ls.method = request.name(),
            ls.type_id = response.type_id,
            data_len = response.data.len(),
            "lite server response"
        );
        Ok(response)
    }
}
