//! Signing seam used by [`crate::Transaction::sign`].

use async_trait::async_trait;

use crate::codec;
use crate::types::Address;

/// Intent prefix for transaction data: version 0, scope 0, app id 0.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Sign built transaction bytes and return the serialized signature
    /// (base64, scheme flag first).
    async fn sign_transaction(&self, tx_bytes: &[u8]) -> anyhow::Result<String>;
}

/// Blake2b-256 of the intent message `[0, 0, 0] || tx_bytes`, the value a
/// key actually signs.
pub fn signing_digest(tx_bytes: &[u8]) -> [u8; 32] {
    codec::blake2b256(&[TRANSACTION_INTENT.as_slice(), tx_bytes])
}

/// Output of [`crate::Transaction::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Base64 of the built transaction bytes.
    pub bytes: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_covers_intent_prefix() {
        let bytes = [9u8; 4];
        let mut message = TRANSACTION_INTENT.to_vec();
        message.extend_from_slice(&bytes);
        assert_eq!(signing_digest(&bytes), codec::blake2b256(&[message.as_slice()]));
        assert_ne!(signing_digest(&bytes), codec::blake2b256(&[bytes.as_slice()]));
    }
}
