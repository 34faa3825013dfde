//! Error types for building, resolving and encoding transactions.

use thiserror::Error;

/// Errors returned by the library.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid move call target `{0}`: expected `package::module::function`")]
    InvalidTarget(String),

    #[error("invalid address `{0}`: {1}")]
    InvalidAddress(String, String),

    #[error("invalid type tag `{0}`: {1}")]
    InvalidTypeTag(String, String),

    #[error("invalid argument in command {command}: {reason}")]
    InvalidArgument { command: usize, reason: String },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("intent resolver for `{0}` already exists")]
    DuplicateIntentResolver(String),

    #[error("next() was not called in build step `{0}`")]
    NextNotCalled(String),

    #[error("next() was called multiple times in build step `{0}`")]
    NextCalledMultipleTimes(String),

    #[error("next() was not awaited in build step `{0}`")]
    NextNotAwaited(String),

    #[error("no client configured: {0}")]
    MissingClient(&'static str),

    #[error("client error: {0}")]
    Client(#[source] anyhow::Error),

    #[error("failed to resolve object {id}: {reason}")]
    ObjectResolution { id: String, reason: String },

    #[error("dry run failed, could not automatically determine a budget: {0}")]
    DryRunFailed(String),

    #[error("no valid gas coins found for owner {0}")]
    NoGasCoins(String),

    #[error(
        "insufficient balance of {coin_type} for owner {owner}: \
         need {required}, have {available}"
    )]
    InsufficientBalance {
        coin_type: String,
        owner: String,
        required: u64,
        available: u128,
    },

    #[error("missing intent resolver for `{0}`")]
    MissingIntentResolver(String),

    #[error("intent `{0}` was not resolved before serialization")]
    UnresolvedIntent(String),

    #[error("input {0} is unresolved")]
    UnresolvedInput(usize),

    #[error("cannot resolve pure input {index}: {reason}")]
    PureResolution { index: usize, reason: String },

    #[error("{limit} exceeded: {size} bytes (max {max})")]
    SizeLimitExceeded {
        limit: &'static str,
        size: usize,
        max: u64,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] anyhow::Error),
}

/// Encoding and decoding errors (BCS, JSON, text formats).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bcs error: {0}")]
    Bcs(#[from] bcs::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("base58 error: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("invalid digest length: expected 32 bytes, got {0}")]
    DigestLength(usize),

    #[error("unsupported serialized transaction version {0}")]
    UnsupportedVersion(u64),

    #[error("cannot express state in v1 format: {0}")]
    V1Incompatible(String),

    #[error("invalid pure value: {0}")]
    PureValue(String),
}

impl From<bcs::Error> for TxError {
    fn from(e: bcs::Error) -> Self {
        Self::Codec(CodecError::Bcs(e))
    }
}

impl From<serde_json::Error> for TxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(CodecError::Json(e))
    }
}

impl TxError {
    /// Whether retrying `build()` against fresh chain state could succeed.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::Client(_)
                | Self::ObjectResolution { .. }
                | Self::DryRunFailed(_)
                | Self::NoGasCoins(_)
                | Self::InsufficientBalance { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message() {
        let err = TxError::MissingField("gas budget");
        assert_eq!(err.to_string(), "missing gas budget");
    }

    #[test]
    fn size_limit_names_limit() {
        let err = TxError::SizeLimitExceeded {
            limit: "max_pure_argument_size",
            size: 20_000,
            max: 16_384,
        };
        assert!(err.to_string().starts_with("max_pure_argument_size exceeded"));
    }

    #[test]
    fn bcs_error_nests_into_codec() {
        let err: TxError = bcs::from_bytes::<u64>(&[1, 2]).unwrap_err().into();
        assert!(matches!(err, TxError::Codec(CodecError::Bcs(_))));
    }

    #[test]
    fn resolution_errors_are_classified() {
        assert!(TxError::DryRunFailed("abort".into()).is_resolution_error());
        assert!(!TxError::MissingField("sender").is_resolution_error());
        assert!(!TxError::NextNotCalled("x".into()).is_resolution_error());
    }
}
