//! Built-in intents.
//!
//! `CoinWithBalance` stands for "a coin of type T holding exactly N". It is
//! expanded before the build: SUI is split off the gas coin, other coin
//! types are merged from the sender's coins and split.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use crate::data::TransactionDataBuilder;
use crate::error::TxError;
use crate::model::{Argument, CallArg, Command, InputKind, ObjectArg};
use crate::objects::CoinRef;
use crate::options::BuildOptions;
use crate::pipeline::{BuildStep, Next};
use crate::type_tag::{StructTag, TypeTag};

pub const COIN_WITH_BALANCE: &str = "CoinWithBalance";

/// Intent payload: `{"type": "<coin type>", "balance": "<u64>"}`.
pub fn coin_with_balance_data(coin_type: &TypeTag, balance: u64) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    data.insert("type".to_string(), json!(coin_type.to_string()));
    data.insert("balance".to_string(), json!(balance.to_string()));
    data
}

struct CoinRequest {
    coin_type: TypeTag,
    balance: u64,
}

fn parse_request(data: &BTreeMap<String, Value>) -> Result<CoinRequest, TxError> {
    let invalid = |reason: &str| TxError::InvalidArgument {
        command: 0,
        reason: format!("{COIN_WITH_BALANCE}: {reason}"),
    };
    let coin_type = data
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing coin type"))?;
    let balance = match data.get("balance") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid("balance must be a u64"))?;
    Ok(CoinRequest {
        coin_type: TypeTag::parse(coin_type)?,
        balance,
    })
}

fn is_sui(tag: &TypeTag) -> bool {
    matches!(tag, TypeTag::Struct(s) if **s == StructTag::sui())
}

fn next_intent(tx: &TransactionDataBuilder) -> Option<(usize, &BTreeMap<String, Value>)> {
    tx.commands.iter().enumerate().find_map(|(i, command)| match command {
        Command::Intent(intent) if intent.name == COIN_WITH_BALANCE => Some((i, &intent.data)),
        _ => None,
    })
}

pub struct CoinWithBalanceResolver;

impl CoinWithBalanceResolver {
    /// Owned coins of each non-SUI type, checked against the total requested.
    async fn gather_coins(
        tx: &TransactionDataBuilder,
        options: &BuildOptions,
        requests: &[CoinRequest],
    ) -> Result<BTreeMap<String, Vec<CoinRef>>, TxError> {
        let mut required: BTreeMap<String, u64> = BTreeMap::new();
        for request in requests.iter().filter(|r| !is_sui(&r.coin_type) && r.balance > 0) {
            let total = required.entry(request.coin_type.to_string()).or_default();
            *total = total.saturating_add(request.balance);
        }
        if required.is_empty() {
            return Ok(BTreeMap::new());
        }

        let client = options.client("coin selection")?;
        let owner = tx.sender.ok_or(TxError::MissingField("sender"))?;
        let used = tx.input_object_ids();
        let mut gathered = BTreeMap::new();
        for (coin_type, needed) in required {
            let coins: Vec<CoinRef> = client
                .get_coins(owner, &coin_type)
                .await
                .map_err(TxError::Client)?
                .into_iter()
                .filter(|coin| !used.contains(&coin.object_id))
                .collect();
            let available: u128 = coins.iter().map(|c| u128::from(c.balance)).sum();
            if available < u128::from(needed) {
                return Err(TxError::InsufficientBalance {
                    coin_type,
                    owner: owner.to_string(),
                    required: needed,
                    available,
                });
            }
            debug!("using {} coin(s) of {coin_type}", coins.len());
            gathered.insert(coin_type, coins);
        }
        Ok(gathered)
    }
}

#[async_trait]
impl BuildStep for CoinWithBalanceResolver {
    fn name(&self) -> &str {
        COIN_WITH_BALANCE
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        let requests = tx
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::Intent(intent) if intent.name == COIN_WITH_BALANCE => {
                    Some(parse_request(&intent.data))
                }
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut coins = Self::gather_coins(tx, options, &requests).await?;
        // Merged coin per type, shared by every intent of that type.
        let mut primaries: BTreeMap<String, Argument> = BTreeMap::new();

        while let Some((index, data)) = next_intent(tx) {
            let request = parse_request(data)?;
            let position = u16::try_from(index).map_err(|_| TxError::InvalidArgument {
                command: index,
                reason: "too many commands".into(),
            })?;

            if request.balance == 0 {
                let zero = Command::move_call(
                    "0x2::coin::zero",
                    &[request.coin_type.to_string().as_str()],
                    vec![],
                )?;
                tx.replace_command(index, vec![zero])?;
                continue;
            }

            let balance = bcs::to_bytes(&request.balance)?;
            let amount = tx.add_input(InputKind::Pure, CallArg::pure(balance));
            let mut replacement = Vec::new();
            let source = if is_sui(&request.coin_type) {
                Argument::GasCoin
            } else {
                let key = request.coin_type.to_string();
                match primaries.get(&key) {
                    Some(primary) => *primary,
                    None => {
                        let owned = coins.remove(&key).unwrap_or_default();
                        let args: Vec<Argument> = owned
                            .iter()
                            .map(|coin| {
                                tx.add_input(
                                    InputKind::Object,
                                    CallArg::Object(ObjectArg::ImmOrOwnedObject(coin.object_ref())),
                                )
                            })
                            .collect();
                        let Some((&primary, rest)) = args.split_first() else {
                            return Err(TxError::InsufficientBalance {
                                coin_type: key,
                                owner: tx.sender.map(|s| s.to_string()).unwrap_or_default(),
                                required: request.balance,
                                available: 0,
                            });
                        };
                        if !rest.is_empty() {
                            replacement.push(Command::merge_coins(primary, rest.to_vec()));
                        }
                        primaries.insert(key, primary);
                        primary
                    }
                }
            };

            let split_at = position + replacement.len() as u16;
            replacement.push(Command::split_coins(source, vec![amount]));
            let coin = Argument::NestedResult(split_at, 0);
            tx.replace_command_with_result(index, replacement, coin)?;
        }

        next.run(tx).await
    }
}

/// Shared resolver instance; registering it twice is a no-op.
pub fn coin_with_balance_resolver() -> Arc<dyn BuildStep> {
    static RESOLVER: OnceLock<Arc<dyn BuildStep>> = OnceLock::new();
    RESOLVER
        .get_or_init(|| Arc::new(CoinWithBalanceResolver))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip() {
        let tag = TypeTag::parse("0x2::sui::SUI").unwrap();
        let data = coin_with_balance_data(&tag, 42);
        let request = parse_request(&data).unwrap();
        assert!(is_sui(&request.coin_type));
        assert_eq!(request.balance, 42);
    }

    #[test]
    fn numeric_balance_accepted() {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), json!("0x3::usdc::USDC"));
        data.insert("balance".to_string(), json!(7));
        let request = parse_request(&data).unwrap();
        assert!(!is_sui(&request.coin_type));
        assert_eq!(request.balance, 7);

        data.insert("balance".to_string(), json!(-1));
        assert!(parse_request(&data).is_err());
    }

    #[test]
    fn resolver_is_shared() {
        let a = coin_with_balance_resolver();
        let b = coin_with_balance_resolver();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
