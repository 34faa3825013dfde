mod common;

use sui_ptb::{
    Argument, BuildOptions, CallArg, Command, Digest, ObjectRef, Transaction,
    TransactionDataBuilder, TxError,
};

use common::addr;

fn coin_ref(id: &str) -> ObjectRef {
    ObjectRef::new(addr(id), 3, Digest([1; 32]))
}

#[test]
fn transfer_sui_splits_the_gas_coin() {
    let mut tx = Transaction::new();
    tx.transfer_sui(addr("0xb0b"), Some(500));
    assert_eq!(
        tx.data().commands,
        vec![
            Command::split_coins(Argument::GasCoin, vec![Argument::input(0)]),
            Command::transfer_objects(vec![Argument::NestedResult(0, 0)], Argument::input(1)),
        ]
    );
    assert_eq!(tx.data().inputs[0], CallArg::pure(500u64.to_le_bytes().to_vec()));
}

#[test]
fn transfer_sui_without_amount_sends_the_gas_coin() {
    let mut tx = Transaction::new();
    tx.transfer_sui(addr("0xb0b"), None);
    assert_eq!(
        tx.data().commands,
        vec![Command::transfer_objects(vec![Argument::GasCoin], Argument::input(0))]
    );
}

#[test]
fn pay_merges_then_groups_by_recipient() {
    let mut tx = Transaction::new();
    let a = tx.object_ref(coin_ref("0xc1"));
    let b = tx.object_ref(coin_ref("0xc2"));
    tx.pay(
        [a, b],
        &[addr("0xb0b"), addr("0xca7"), addr("0xb0b")],
        &[10, 20, 30],
    )
    .unwrap();

    let data = tx.data();
    assert_eq!(
        data.commands,
        vec![
            Command::merge_coins(Argument::input(0), vec![Argument::input(1)]),
            Command::split_coins(
                Argument::input(0),
                vec![Argument::input(2), Argument::input(3), Argument::input(4)]
            ),
            Command::transfer_objects(
                vec![Argument::NestedResult(1, 0), Argument::NestedResult(1, 2)],
                Argument::input(5)
            ),
            Command::transfer_objects(vec![Argument::NestedResult(1, 1)], Argument::input(6)),
        ]
    );
    assert_eq!(data.inputs[5], CallArg::pure(addr("0xb0b").inner().to_vec()));
    assert_eq!(data.inputs[6], CallArg::pure(addr("0xca7").inner().to_vec()));
}

#[test]
fn pay_with_one_coin_skips_the_merge() {
    let mut tx = Transaction::new();
    let a = tx.object_ref(coin_ref("0xc1"));
    tx.pay([a], &[addr("0xb0b")], &[10]).unwrap();
    assert_eq!(tx.data().commands.len(), 2);
    assert!(matches!(tx.data().commands[0], Command::SplitCoins(_)));
}

#[test]
fn pay_rejects_bad_input() {
    let mut tx = Transaction::new();
    let none: [Argument; 0] = [];
    let err = tx.pay(none, &[addr("0xb0b")], &[1]).unwrap_err();
    assert!(matches!(err, TxError::MissingField("input coins")));

    let err = tx
        .pay([Argument::GasCoin], &[addr("0xb0b")], &[1])
        .unwrap_err();
    assert!(matches!(err, TxError::InvalidArgument { .. }));

    let a = tx.object_ref(coin_ref("0xc1"));
    let b = tx.object_ref(coin_ref("0xc2"));
    let err = tx.pay([a, b], &[addr("0xb0b")], &[1, 2]).unwrap_err();
    assert!(
        matches!(err, TxError::InvalidArgument { ref reason, .. } if reason.contains("amounts"))
    );
    assert!(tx.data().commands.is_empty());
}

#[test]
fn pay_sui_uses_coins_as_gas() {
    let mut tx = Transaction::new();
    let coins = vec![coin_ref("0xc1"), coin_ref("0xc2")];
    tx.pay_sui(coins.clone(), &[addr("0xb0b"), addr("0xca7")], &[10, 20])
        .unwrap();

    let data = tx.data();
    assert_eq!(data.gas_data.payment, Some(coins));
    assert_eq!(
        data.commands,
        vec![
            Command::split_coins(
                Argument::GasCoin,
                vec![Argument::input(0), Argument::input(1)]
            ),
            Command::transfer_objects(vec![Argument::NestedResult(0, 0)], Argument::input(2)),
            Command::transfer_objects(vec![Argument::NestedResult(0, 1)], Argument::input(3)),
        ]
    );
}

#[test]
fn pay_sui_without_coins_keeps_gas_payment_open() {
    let mut tx = Transaction::new();
    tx.pay_sui(vec![], &[addr("0xb0b")], &[10]).unwrap();
    assert_eq!(tx.data().gas_data.payment, None);

    let err = tx.pay_sui(vec![], &[], &[10]).unwrap_err();
    assert!(matches!(err, TxError::InvalidArgument { .. }));
}

#[test]
fn pay_all_sui_transfers_the_gas_coin() {
    let mut tx = Transaction::new();
    tx.pay_all_sui(vec![coin_ref("0xc1")], addr("0xb0b"));
    assert_eq!(tx.data().gas_data.payment, Some(vec![coin_ref("0xc1")]));
    assert_eq!(
        tx.data().commands,
        vec![Command::transfer_objects(vec![Argument::GasCoin], Argument::input(0))]
    );
}

#[test]
fn split_coin_equal_calls_divide_and_keep() {
    let mut tx = Transaction::new();
    let coin = tx.object_ref(coin_ref("0xc1"));
    tx.split_coin_equal(coin, 4, "0x2::sui::SUI").unwrap();
    assert_eq!(
        tx.data().commands,
        vec![Command::move_call(
            "0x2::pay::divide_and_keep",
            &["0x2::sui::SUI"],
            vec![coin, Argument::input(1)]
        )
        .unwrap()]
    );
    assert_eq!(tx.data().inputs[1], CallArg::pure(4u64.to_le_bytes().to_vec()));

    let err = tx.split_coin_equal(coin, 2, "not a type").unwrap_err();
    assert!(matches!(err, TxError::InvalidTypeTag(..)));
    assert_eq!(tx.data().inputs.len(), 2);
}

#[tokio::test]
async fn pay_sui_builds() {
    let mut tx = Transaction::new();
    tx.set_sender(addr("0xa11ce"));
    tx.set_gas_price(1000);
    tx.set_gas_budget(10_000_000);
    tx.pay_sui(vec![coin_ref("0xc1")], &[addr("0xb0b")], &[7])
        .unwrap();

    let bytes = tx.build(&BuildOptions::new()).await.unwrap();
    let decoded = TransactionDataBuilder::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.commands, tx.data().commands);
    assert_eq!(decoded.gas_data.payment, Some(vec![coin_ref("0xc1")]));
}
