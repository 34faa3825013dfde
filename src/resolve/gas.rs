//! Gas price, budget and payment resolution.

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::client::ExecutionStatus;
use crate::data::{DataBuildOptions, TransactionDataBuilder};
use crate::error::TxError;
use crate::model::GasData;
use crate::objects::SUI_COIN_TYPE;
use crate::options::{BuildOptions, GAS_SAFE_OVERHEAD};
use crate::pipeline::{BuildStep, Next};

pub struct SetGasPrice;

pub struct SetGasBudget;

pub struct SetGasPayment;

/// Whether a gas step should leave the transaction alone.
fn skip(options: &BuildOptions, field: &str, already_set: bool) -> bool {
    if options.only_transaction_kind || already_set {
        return true;
    }
    if options.client.is_none() {
        warn!("no client configured, leaving {field} unset");
        return true;
    }
    false
}

#[async_trait]
impl BuildStep for SetGasPrice {
    fn name(&self) -> &str {
        "SetGasPrice"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        if !skip(options, "gas price", tx.gas_data.price.is_some()) {
            let client = options.client("gas price")?;
            let price = client
                .get_reference_gas_price()
                .await
                .map_err(TxError::Client)?;
            info!("using reference gas price {price}");
            tx.gas_data.price = Some(price);
        }
        next.run(tx).await
    }
}

/// Budget from a dry run: computation cost plus a safety overhead, raised
/// to cover net storage when storage outweighs the rebate.
pub fn budget_from_dry_run(
    computation_cost: u64,
    storage_cost: u64,
    storage_rebate: u64,
    gas_price: u64,
) -> u64 {
    let overhead = i128::from(GAS_SAFE_OVERHEAD) * i128::from(gas_price);
    let base = i128::from(computation_cost) + overhead;
    let with_storage = base + i128::from(storage_cost) - i128::from(storage_rebate);
    u64::try_from(base.max(with_storage)).unwrap_or(u64::MAX)
}

#[async_trait]
impl BuildStep for SetGasBudget {
    fn name(&self) -> &str {
        "SetGasBudget"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        if !skip(options, "gas budget", tx.gas_data.budget.is_some()) {
            let client = options.client("gas budget")?;
            let limits = options.limits().await?;
            let price = tx.gas_data.price.ok_or(TxError::MissingField("gas price"))?;

            let dry_run_bytes = tx.build(&DataBuildOptions {
                only_transaction_kind: false,
                max_size_bytes: Some(limits.max_tx_size_bytes),
                overrides: GasData {
                    budget: Some(limits.max_tx_gas),
                    payment: Some(Vec::new()),
                    ..GasData::default()
                },
            })?;
            debug!("dry running {} bytes to estimate budget", dry_run_bytes.len());

            let result = client
                .dry_run_transaction(&dry_run_bytes)
                .await
                .map_err(TxError::Client)?;
            if let ExecutionStatus::Failure { error } = result.status {
                return Err(TxError::DryRunFailed(error));
            }

            let gas = result.gas_used;
            let budget = budget_from_dry_run(
                gas.computation_cost,
                gas.storage_cost,
                gas.storage_rebate,
                price,
            );
            info!("estimated gas budget {budget}");
            tx.gas_data.budget = Some(budget);
        }
        next.run(tx).await
    }
}

#[async_trait]
impl BuildStep for SetGasPayment {
    fn name(&self) -> &str {
        "SetGasPayment"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        if !skip(options, "gas payment", tx.gas_data.payment.is_some()) {
            let client = options.client("gas payment")?;
            let limits = options.limits().await?;
            let owner = tx.gas_owner().ok_or(TxError::MissingField("sender"))?;

            let used = tx.input_object_ids();
            let coins = client
                .get_coins(owner, SUI_COIN_TYPE)
                .await
                .map_err(TxError::Client)?;
            let payment: Vec<_> = coins
                .iter()
                .filter(|coin| !used.contains(&coin.object_id))
                .take(limits.max_gas_objects as usize)
                .map(|coin| coin.object_ref())
                .collect();

            if payment.is_empty() {
                return Err(TxError::NoGasCoins(owner.to_string()));
            }
            info!("paying gas with {} coin(s) owned by {owner}", payment.len());
            tx.gas_data.payment = Some(payment);
        }
        next.run(tx).await
    }
}
