mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use sui_ptb::model::IntentArgument;
use sui_ptb::{
    Argument, BuildOptions, BuildStep, Command, Digest, Next, ObjectRef, Transaction,
    TransactionDataBuilder, TxError,
};

use common::addr;

fn ready_tx() -> Transaction {
    let mut tx = Transaction::new();
    tx.set_sender(addr("0xa11ce"));
    tx.set_gas_price(1000);
    tx.set_gas_budget(10_000_000);
    tx.set_gas_payment(vec![ObjectRef::new(addr("0x9a5"), 1, Digest([7; 32]))]);
    tx
}

/// Records its name before and after the rest of the pipeline.
struct Trace {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BuildStep for Trace {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        _options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        self.log.lock().unwrap().push(format!("enter {}", self.name));
        next.run(tx).await?;
        self.log.lock().unwrap().push(format!("leave {}", self.name));
        Ok(())
    }
}

struct ForgetsNext;

#[async_trait]
impl BuildStep for ForgetsNext {
    fn name(&self) -> &str {
        "ForgetsNext"
    }

    async fn run(
        &self,
        _tx: &mut TransactionDataBuilder,
        _options: &BuildOptions,
        _next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        Ok(())
    }
}

struct DropsNext;

#[async_trait]
impl BuildStep for DropsNext {
    fn name(&self) -> &str {
        "DropsNext"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        _options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        drop(next.run(tx));
        Ok(())
    }
}

struct CallsNextTwice;

#[async_trait]
impl BuildStep for CallsNextTwice {
    fn name(&self) -> &str {
        "CallsNextTwice"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        _options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        next.run(tx).await?;
        next.run(tx).await
    }
}

/// Expands `Transfer` intents into a plain transfer of the `coin` input.
struct TransferResolver;

#[async_trait]
impl BuildStep for TransferResolver {
    fn name(&self) -> &str {
        "Transfer"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        _options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        while let Some(index) = tx
            .commands
            .iter()
            .position(|c| matches!(c, Command::Intent(i) if i.name == "Transfer"))
        {
            let Command::Intent(intent) = &tx.commands[index] else {
                unreachable!();
            };
            let Some(IntentArgument::One(coin)) = intent.inputs.get("coin").cloned() else {
                return Err(TxError::InvalidArgument {
                    command: index,
                    reason: "missing coin".into(),
                });
            };
            let to = intent.data["to"].as_str().unwrap_or_default().to_string();
            let recipient = tx.add_input(
                sui_ptb::InputKind::Pure,
                sui_ptb::CallArg::pure(addr(&to).inner().to_vec()),
            );
            tx.replace_command(index, vec![Command::transfer_objects(vec![coin], recipient)])?;
        }
        next.run(tx).await
    }
}

fn transfer_intent(coin: Argument, to: &str) -> Command {
    let mut inputs = BTreeMap::new();
    inputs.insert("coin".to_string(), IntentArgument::One(coin));
    let mut data = BTreeMap::new();
    data.insert("to".to_string(), json!(to));
    Command::intent("Transfer", inputs, data)
}

#[tokio::test]
async fn plugins_wrap_the_built_in_steps() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut tx = ready_tx();
    tx.split_coins(Argument::GasCoin, [1u64]);
    tx.add_serialization_step(Arc::new(Trace {
        name: "serialize",
        log: log.clone(),
    }));
    tx.add_build_step(Arc::new(Trace {
        name: "outer",
        log: log.clone(),
    }));
    tx.add_build_step(Arc::new(Trace {
        name: "inner",
        log: log.clone(),
    }));

    tx.build(&BuildOptions::new()).await.unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        [
            "enter serialize",
            "leave serialize",
            "enter outer",
            "enter inner",
            "leave inner",
            "leave outer",
        ]
    );
}

#[tokio::test]
async fn serialization_steps_run_for_json() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut tx = Transaction::new();
    tx.add_serialization_step(Arc::new(Trace {
        name: "serialize",
        log: log.clone(),
    }));
    tx.add_build_step(Arc::new(Trace {
        name: "build",
        log: log.clone(),
    }));

    tx.to_json(&BuildOptions::new()).await.unwrap();
    assert_eq!(*log.lock().unwrap(), ["enter serialize", "leave serialize"]);
}

#[tokio::test]
async fn next_must_be_called() {
    let mut tx = ready_tx();
    tx.add_build_step(Arc::new(ForgetsNext));
    let err = tx.build(&BuildOptions::new()).await.unwrap_err();
    assert!(matches!(err, TxError::NextNotCalled(ref name) if name == "ForgetsNext"));
}

#[tokio::test]
async fn next_must_be_awaited() {
    let mut tx = ready_tx();
    tx.add_build_step(Arc::new(DropsNext));
    let err = tx.build(&BuildOptions::new()).await.unwrap_err();
    assert!(matches!(err, TxError::NextNotAwaited(ref name) if name == "DropsNext"));
}

#[tokio::test]
async fn next_must_be_called_once() {
    let mut tx = ready_tx();
    tx.add_build_step(Arc::new(CallsNextTwice));
    let err = tx.build(&BuildOptions::new()).await.unwrap_err();
    assert!(matches!(err, TxError::NextCalledMultipleTimes(ref name) if name == "CallsNextTwice"));
}

#[tokio::test]
async fn registered_intent_is_expanded() {
    let mut tx = ready_tx();
    tx.add_intent_resolver("Transfer", Arc::new(TransferResolver))
        .unwrap();
    tx.add(transfer_intent(Argument::GasCoin, "0xb0b"));

    let bytes = tx.build(&BuildOptions::new()).await.unwrap();
    let decoded = TransactionDataBuilder::from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded.commands,
        vec![Command::transfer_objects(
            vec![Argument::GasCoin],
            Argument::pure_input(0)
        )]
    );
}

#[tokio::test]
async fn unregistered_intent_fails() {
    let mut tx = ready_tx();
    tx.add(transfer_intent(Argument::GasCoin, "0xb0b"));
    let err = tx.build(&BuildOptions::new()).await.unwrap_err();
    assert!(matches!(err, TxError::MissingIntentResolver(ref name) if name == "Transfer"));
}

#[tokio::test]
async fn supported_intent_stays_in_json() {
    let mut tx = Transaction::new();
    tx.add_intent_resolver("Transfer", Arc::new(TransferResolver))
        .unwrap();
    tx.add(transfer_intent(Argument::GasCoin, "0xb0b"));

    let json = tx
        .to_json(&BuildOptions::new().with_supported_intent("Transfer"))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["commands"][0]["$Intent"]["name"], "Transfer");

    // Intents never reach the wire.
    let err = tx
        .build(&BuildOptions::new().with_supported_intent("Transfer").only_transaction_kind())
        .await
        .unwrap_err();
    assert!(matches!(err, TxError::UnresolvedIntent(ref name) if name == "Transfer"));
}

#[tokio::test]
async fn resolver_names_are_unique() {
    let mut tx = Transaction::new();
    let resolver: Arc<dyn BuildStep> = Arc::new(TransferResolver);
    tx.add_intent_resolver("Transfer", resolver.clone()).unwrap();
    tx.add_intent_resolver("Transfer", resolver).unwrap();

    let err = tx
        .add_intent_resolver("Transfer", Arc::new(TransferResolver))
        .unwrap_err();
    assert!(matches!(err, TxError::DuplicateIntentResolver(ref name) if name == "Transfer"));
}

#[tokio::test]
async fn coin_with_balance_registers_its_resolver_once() {
    let mut tx = Transaction::new();
    tx.coin_with_balance("0x2::sui::SUI", 1).unwrap();
    tx.coin_with_balance("0x2::sui::SUI", 2).unwrap();

    let err = tx
        .add_intent_resolver("CoinWithBalance", Arc::new(TransferResolver))
        .unwrap_err();
    assert!(matches!(err, TxError::DuplicateIntentResolver(_)));
}
