use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RpcError;

use super::types::{LiteRequest, RawResponse};
use super::LiteTransport;

enum Canned {
    Answer(RawResponse),
    Fail(String),
    Hang,
}

/// A mock lite-server transport for testing. Answers each request kind
/// (keyed by constructor tag) with a canned response and records every
/// request it sees.
pub struct MockTransport {
    answers: HashMap<u32, Canned>,
    seen: Mutex<Vec<LiteRequest>>,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder {
            answers: HashMap::new(),
        }
    }

    pub fn requests(&self) -> Vec<LiteRequest> {
        self.seen.lock().expect("mock lock poisoned").clone()
    }
}

pub struct MockTransportBuilder {
    answers: HashMap<u32, Canned>,
}

impl MockTransportBuilder {
    pub fn with_answer(mut self, request_tag: u32, response: RawResponse) -> Self {
        self.answers.insert(request_tag, Canned::Answer(response));
        self
    }

    pub fn with_failure(mut self, request_tag: u32, message: &str) -> Self {
        self.answers
            .insert(request_tag, Canned::Fail(message.to_owned()));
        self
    }

    /// Never answer, to exercise deadlines and cancellation.
    pub fn with_stall(mut self, request_tag: u32) -> Self {
        self.answers.insert(request_tag, Canned::Hang);
        self
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            answers: self.answers,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LiteTransport for MockTransport {
    async fn do_request(&self, request: &LiteRequest) -> Result<RawResponse, RpcError> {
        self.seen
            .lock()
            .expect("mock lock poisoned")
            .push(request.clone());
        match self.answers.get(&request.tag()) {
            Some(Canned::Answer(response)) => Ok(response.clone()),
            Some(Canned::Fail(message)) => Err(RpcError::Transport(message.clone().into())),
            Some(Canned::Hang) => std::future::pending().await,
            None => Err(RpcError::Transport(
                format!("no canned answer for {}", request.name()).into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::types::{tag, GetTransactions};
    use crate::types::{AccountId, HashBytes};

    fn list_request() -> LiteRequest {
        LiteRequest::GetTransactions(GetTransactions {
            limit: 1,
            account: AccountId::new(0, [0; 32]),
            lt: 1,
            hash: HashBytes::ZERO,
        })
    }

    #[tokio::test]
    async fn answers_by_request_tag_and_records_requests() {
        let answer = RawResponse::new(tag::TRANSACTION_LIST, vec![9]);
        let mock = MockTransport::builder()
            .with_answer(tag::GET_TRANSACTIONS, answer.clone())
            .build();

        let got = mock.do_request(&list_request()).await.expect("canned answer");
        assert_eq!(got, answer);
        assert_eq!(mock.requests(), vec![list_request()]);
    }

    #[tokio::test]
    async fn unknown_request_is_a_transport_error() {
        let mock = MockTransport::builder().build();
        let err = mock.do_request(&list_request()).await.expect_err("nothing canned");
        assert!(matches!(err, RpcError::Transport(_)));
    }
}
