use std::time::Duration;

// ==============================================================================
// Top-level Error
// ==============================================================================

/// Every way a transaction lookup can fail.
///
/// Each variant carries its immediate cause so the full decode path can be
/// reconstructed by walking `std::error::Error::source`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("truncated input: {0}")]
    TruncatedInput(#[from] WireError),

    #[error("failed to decode block header #{index}")]
    FailedHeaderDecode {
        index: usize,
        #[source]
        source: WireError,
    },

    #[error("malformed transaction tree: {0}")]
    MalformedTransactionTree(#[from] TreeError),

    #[error("unknown response type 0x{0:08x}")]
    UnknownResponseType(u32),

    #[error("lite server error {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("message was not accepted by the lite server")]
    MessageNotAccepted,

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

// ==============================================================================
// Wire Errors
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("{field} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid length prefix byte 0x{0:02x}")]
    InvalidLengthPrefix(u8),

    #[error("too short response: {len} bytes")]
    TooShortResponse { len: usize },
}

// ==============================================================================
// Tree Errors
// ==============================================================================

/// Failures between the extracted transaction blob and a finished record.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("failed to parse cells from transaction bytes: {0}")]
    Boc(#[from] BocError),

    #[error("expected exactly {expected} root cell(s), found {found}")]
    RootCount { expected: usize, found: usize },

    #[error("failed to load transaction from root #{index}: {source}")]
    Load {
        index: usize,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BocError {
    #[error("bag of cells is truncated: {0}")]
    Truncated(&'static str),

    #[error("unknown bag of cells magic 0x{0:08x}")]
    UnknownMagic(u32),

    #[error("invalid bag of cells header: {0}")]
    InvalidHeader(String),

    #[error("crc32c mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("cell #{index}: {reason}")]
    InvalidCell { index: usize, reason: String },

    #[error("cell #{index} references #{target}, which is not a later cell")]
    InvalidReference { index: usize, target: usize },

    #[error("cell #{index} is exotic; only ordinary cells are supported")]
    ExoticCell { index: usize },

    #[error("cell overflow: {0}")]
    Overflow(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceError {
    #[error("need {needed} bits, {remaining} remaining")]
    NotEnoughBits { needed: usize, remaining: usize },

    #[error("no references left in cell")]
    NotEnoughRefs,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("{field}: {source}")]
    Slice {
        field: &'static str,
        #[source]
        source: SliceError,
    },

    #[error("unexpected {what} tag 0b{found:b}")]
    UnexpectedTag { what: &'static str, found: u64 },

    #[error("outmsg_cnt is {declared} but dictionary holds {found} messages")]
    OutMessageCountMismatch { declared: u16, found: usize },

    #[error("dictionary label length {len} exceeds remaining key width {max}")]
    InvalidLabel { len: usize, max: usize },
}

impl LoadError {
    pub(crate) fn slice(field: &'static str) -> impl FnOnce(SliceError) -> Self {
        move |source| Self::Slice { field, source }
    }
}

// ==============================================================================
// Identifier Parsing
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseIdError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),

    #[error("invalid {what} `{value}`")]
    Format { what: &'static str, value: String },
}

// ==============================================================================
// RPC Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// The server-reported failure, decided once at the boundary.
///
/// Code `0` means the node executed the query but did not accept its effect;
/// every other code is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteServerFailure {
    NotAccepted,
    Failure { code: i32, message: String },
}

impl LiteServerFailure {
    pub fn from_code(code: i32, message: String) -> Self {
        if code == 0 {
            Self::NotAccepted
        } else {
            Self::Failure { code, message }
        }
    }
}

impl From<LiteServerFailure> for CoreError {
    fn from(failure: LiteServerFailure) -> Self {
        match failure {
            LiteServerFailure::NotAccepted => CoreError::MessageNotAccepted,
            LiteServerFailure::Failure { code, message } => CoreError::ServerError { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn code_zero_maps_to_not_accepted() {
        let err: CoreError = LiteServerFailure::from_code(0, "ignored".into()).into();
        assert!(matches!(err, CoreError::MessageNotAccepted));
    }

    #[test]
    fn nonzero_code_keeps_message() {
        let err: CoreError = LiteServerFailure::from_code(7, "x".into()).into();
        assert!(matches!(
            err,
            CoreError::ServerError { code: 7, ref message } if message == "x"
        ));
        assert_eq!(err.to_string(), "lite server error 7: x");
    }

    #[test]
    fn header_failure_exposes_wire_cause() {
        let err = CoreError::FailedHeaderDecode {
            index: 3,
            source: WireError::Truncated {
                field: "block id",
                needed: 80,
                remaining: 12,
            },
        };
        let source = err.source().expect("header error must wrap its cause");
        assert!(source.to_string().contains("80 bytes"));
    }

    #[test]
    fn transport_cause_survives_into_core_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer hung up");
        let err = CoreError::from(RpcError::Transport(Box::new(io)));
        assert_eq!(err.to_string(), "transport error: peer hung up");

        let cause = err.source().expect("transport error must wrap its cause");
        let io = cause
            .downcast_ref::<std::io::Error>()
            .expect("cause keeps its concrete type");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);
    }
}
