//! Protocol size limits checked before encoding.

use async_trait::async_trait;

use crate::data::TransactionDataBuilder;
use crate::error::TxError;
use crate::model::CallArg;
use crate::options::BuildOptions;
use crate::pipeline::{BuildStep, Next};

/// Rejects pure inputs larger than `max_pure_argument_size`. The total size
/// is checked when the transaction is encoded.
pub struct ValidateLimits;

#[async_trait]
impl BuildStep for ValidateLimits {
    fn name(&self) -> &str {
        "ValidateLimits"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        let max = options.limits().await?.max_pure_argument_size;
        for input in &tx.inputs {
            if let CallArg::Pure { bytes } = input {
                if bytes.len() as u64 > max {
                    return Err(TxError::SizeLimitExceeded {
                        limit: "max_pure_argument_size",
                        size: bytes.len(),
                        max,
                    });
                }
            }
        }
        next.run(tx).await
    }
}
