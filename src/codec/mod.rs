//! Canonical binary (BCS) encoding of transactions.
//!
//! [`schema`] mirrors the wire layout the execution engine deserializes;
//! variant order in those enums is part of the wire contract. [`pure`]
//! encodes loosely-typed values against a Move type for pure inputs.

pub mod pure;
pub mod schema;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TxError;
use crate::types::Digest;

type Blake2b256 = Blake2b<U32>;

/// Offline default for the encoded size of a whole transaction.
pub const DEFAULT_MAX_TX_SIZE_BYTES: u64 = 128 * 1024;

/// Domain tag hashed in front of transaction bytes to form the digest.
pub const TRANSACTION_DATA_TAG: &str = "TransactionData";

/// BCS-encode `value`, failing instead of truncating when the result is
/// larger than `max_size` bytes.
pub fn encode<T: Serialize>(value: &T, max_size: u64) -> Result<Vec<u8>, TxError> {
    let bytes = bcs::to_bytes(value)?;
    if bytes.len() as u64 > max_size {
        return Err(TxError::SizeLimitExceeded {
            limit: "max_tx_size_bytes",
            size: bytes.len(),
            max: max_size,
        });
    }
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TxError> {
    Ok(bcs::from_bytes(bytes)?)
}

pub(crate) fn blake2b256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Digest of `type_tag::` followed by `bytes`.
pub fn hash_typed_data(type_tag: &str, bytes: &[u8]) -> Digest {
    let prefix = format!("{type_tag}::");
    Digest(blake2b256(&[prefix.as_bytes(), bytes]))
}

/// Digest of fully built transaction bytes.
pub fn transaction_digest(tx_bytes: &[u8]) -> Digest {
    hash_typed_data(TRANSACTION_DATA_TAG, tx_bytes)
}
