//! High-level API - [`Transaction`] wraps the builder state and exposes
//! command construction, resolution and signing.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::Serialize;

use crate::codec;
use crate::data::{DataBuildOptions, TransactionDataBuilder};
use crate::error::TxError;
use crate::intents::{self, COIN_WITH_BALANCE};
use crate::model::{
    Argument, CallArg, Command, InputKind, ObjectArg, TransactionExpiration, UnresolvedObject,
};
use crate::options::BuildOptions;
use crate::pipeline::{run_steps, BuildStep, PluginRegistry};
use crate::resolve;
use crate::result::TransactionResult;
use crate::signer::{SignedTransaction, Signer};
use crate::type_tag::TypeTag;
use crate::types::{Address, Digest, ObjectId, ObjectRef};

const PAY_SPLIT_N: &str = "0x2::pay::divide_and_keep";

/// Lifecycle of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Open,
    Building,
    Built,
}

/// A coin amount: a literal (encoded as a `u64` input) or an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Value(u64),
    Arg(Argument),
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self::Value(value)
    }
}

impl From<Argument> for Amount {
    fn from(arg: Argument) -> Self {
        Self::Arg(arg)
    }
}

impl From<&TransactionResult> for Amount {
    fn from(result: &TransactionResult) -> Self {
        Self::Arg(result.arg())
    }
}

/// Transfer recipient: a literal address or an argument producing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Address(Address),
    Arg(Argument),
}

impl From<Address> for Recipient {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<Argument> for Recipient {
    fn from(arg: Argument) -> Self {
        Self::Arg(arg)
    }
}

/// Programmable transaction under construction.
///
/// Every mutation puts the transaction back into [`BuildState::Open`];
/// [`Transaction::build`] can be called any number of times.
pub struct Transaction {
    data: TransactionDataBuilder,
    plugins: PluginRegistry,
    state: BuildState,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::from_data(TransactionDataBuilder::new())
    }

    pub fn from_data(data: TransactionDataBuilder) -> Self {
        Self {
            data,
            plugins: PluginRegistry::new(),
            state: BuildState::Open,
        }
    }

    /// Decode built `TransactionData` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        TransactionDataBuilder::from_bytes(bytes).map(Self::from_data)
    }

    pub fn from_kind_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        TransactionDataBuilder::from_kind_bytes(bytes).map(Self::from_data)
    }

    /// Restore from v1 or v2 JSON.
    pub fn restore(json: &str) -> Result<Self, TxError> {
        TransactionDataBuilder::restore(json).map(Self::from_data)
    }

    pub fn data(&self) -> &TransactionDataBuilder {
        &self.data
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Deep copy of the current state, without plugins.
    pub fn snapshot(&self) -> TransactionDataBuilder {
        self.data.snapshot()
    }

    fn touch(&mut self) -> &mut TransactionDataBuilder {
        self.state = BuildState::Open;
        &mut self.data
    }

    pub fn add_build_step(&mut self, step: Arc<dyn BuildStep>) {
        self.plugins.add_build_step(step);
    }

    pub fn add_serialization_step(&mut self, step: Arc<dyn BuildStep>) {
        self.plugins.add_serialization_step(step);
    }

    pub fn add_intent_resolver(
        &mut self,
        intent: impl Into<String>,
        resolver: Arc<dyn BuildStep>,
    ) -> Result<(), TxError> {
        self.plugins.add_intent_resolver(intent, resolver)
    }

    pub fn set_sender(&mut self, sender: Address) {
        self.touch().sender = Some(sender);
    }

    pub fn set_sender_if_not_set(&mut self, sender: Address) {
        if self.data.sender.is_none() {
            self.set_sender(sender);
        }
    }

    pub fn set_expiration(&mut self, expiration: TransactionExpiration) {
        self.touch().expiration = Some(expiration);
    }

    pub fn set_gas_price(&mut self, price: u64) {
        self.touch().gas_data.price = Some(price);
    }

    pub fn set_gas_budget(&mut self, budget: u64) {
        self.touch().gas_data.budget = Some(budget);
    }

    pub fn set_gas_owner(&mut self, owner: Address) {
        self.touch().gas_data.owner = Some(owner);
    }

    pub fn set_gas_payment(&mut self, payment: Vec<ObjectRef>) {
        self.touch().gas_data.payment = Some(payment);
    }

    /// Object input by id (`0x...`); details are fetched at build time.
    pub fn object(&mut self, id: &str) -> Result<Argument, TxError> {
        let object_id = Address::from_str(id)?;
        Ok(self.object_id(object_id))
    }

    pub fn object_id(&mut self, object_id: ObjectId) -> Argument {
        self.add_object(CallArg::UnresolvedObject(UnresolvedObject::new(object_id)))
    }

    /// Owned or immutable object at a known version.
    pub fn object_ref(&mut self, object_ref: ObjectRef) -> Argument {
        self.add_object(CallArg::Object(ObjectArg::ImmOrOwnedObject(object_ref)))
    }

    pub fn shared_object_ref(
        &mut self,
        object_id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    ) -> Argument {
        self.add_object(CallArg::Object(ObjectArg::SharedObject {
            object_id,
            initial_shared_version,
            mutable,
        }))
    }

    pub fn receiving_ref(&mut self, object_ref: ObjectRef) -> Argument {
        self.add_object(CallArg::Object(ObjectArg::Receiving(object_ref)))
    }

    /// One input per object id: a repeated id returns the existing input,
    /// upgraded with whatever the new reference adds.
    fn add_object(&mut self, arg: CallArg) -> Argument {
        let data = self.touch();
        let Some(id) = arg.object_id() else {
            return data.add_input(InputKind::Object, arg);
        };
        match data.inputs.iter().position(|input| input.object_id() == Some(id)) {
            Some(index) => {
                merge_object(&mut data.inputs[index], arg);
                Argument::object_input(index as u16)
            }
            None => data.add_input(InputKind::Object, arg),
        }
    }

    /// BCS-encode `value` as a pure input.
    pub fn pure<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Argument, TxError> {
        let bytes = bcs::to_bytes(value)?;
        Ok(self.pure_bytes(bytes))
    }

    /// Already BCS-encoded bytes.
    pub fn pure_bytes(&mut self, bytes: Vec<u8>) -> Argument {
        self.touch().add_input(InputKind::Pure, CallArg::pure(bytes))
    }

    pub fn pure_u64(&mut self, value: u64) -> Argument {
        self.pure_bytes(value.to_le_bytes().to_vec())
    }

    pub fn pure_bool(&mut self, value: bool) -> Argument {
        self.pure_bytes(vec![value as u8])
    }

    pub fn pure_address(&mut self, address: Address) -> Argument {
        self.pure_bytes(address.inner().to_vec())
    }

    pub fn pure_string(&mut self, value: &str) -> Result<Argument, TxError> {
        self.pure(value)
    }

    /// Untyped value; its type comes from the Move function signature (or
    /// the command slot) at build time.
    pub fn pure_value(&mut self, value: serde_json::Value) -> Argument {
        self.touch()
            .add_input(InputKind::Pure, CallArg::UnresolvedPure { value })
    }

    /// Append a raw command.
    pub fn add(&mut self, command: Command) -> TransactionResult {
        self.touch().add_command(command)
    }

    pub fn split_coins<I, A>(&mut self, coin: impl Into<Argument>, amounts: I) -> TransactionResult
    where
        I: IntoIterator<Item = A>,
        A: Into<Amount>,
    {
        let amounts = amounts
            .into_iter()
            .map(|amount| match amount.into() {
                Amount::Value(value) => self.pure_u64(value),
                Amount::Arg(arg) => arg,
            })
            .collect();
        self.add(Command::split_coins(coin.into(), amounts))
    }

    pub fn merge_coins<I, A>(
        &mut self,
        destination: impl Into<Argument>,
        sources: I,
    ) -> TransactionResult
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        self.add(Command::merge_coins(destination.into(), sources))
    }

    pub fn transfer_objects<I, A>(
        &mut self,
        objects: I,
        recipient: impl Into<Recipient>,
    ) -> TransactionResult
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let objects = objects.into_iter().map(Into::into).collect();
        let address = match recipient.into() {
            Recipient::Address(address) => self.pure_address(address),
            Recipient::Arg(arg) => arg,
        };
        self.add(Command::transfer_objects(objects, address))
    }

    /// `target` is `package::module::function`.
    pub fn move_call<I, A>(
        &mut self,
        target: &str,
        type_arguments: &[&str],
        arguments: I,
    ) -> Result<TransactionResult, TxError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let arguments = arguments.into_iter().map(Into::into).collect();
        let command = Command::move_call(target, type_arguments, arguments)?;
        Ok(self.add(command))
    }

    /// Returns the upgrade capability.
    pub fn publish(
        &mut self,
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
    ) -> TransactionResult {
        self.add(Command::publish(modules, dependencies))
    }

    /// Returns the upgrade receipt.
    pub fn upgrade(
        &mut self,
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        package: ObjectId,
        ticket: impl Into<Argument>,
    ) -> TransactionResult {
        self.add(Command::upgrade(modules, dependencies, package, ticket.into()))
    }

    pub fn make_move_vec<I, A>(
        &mut self,
        type_tag: Option<&str>,
        elements: I,
    ) -> Result<TransactionResult, TxError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let elements = elements.into_iter().map(Into::into).collect();
        let command = Command::make_move_vec(type_tag, elements)?;
        Ok(self.add(command))
    }

    /// A coin of `coin_type` holding exactly `balance`, resolved at build
    /// time from the gas coin (SUI) or the sender's coins.
    pub fn coin_with_balance(
        &mut self,
        coin_type: &str,
        balance: u64,
    ) -> Result<TransactionResult, TxError> {
        let coin_type = TypeTag::parse(coin_type)?;
        self.plugins
            .add_intent_resolver(COIN_WITH_BALANCE, intents::coin_with_balance_resolver())?;
        Ok(self.add(Command::intent(
            COIN_WITH_BALANCE,
            BTreeMap::new(),
            intents::coin_with_balance_data(&coin_type, balance),
        )))
    }

    /// Send `amount` out of the gas coin to `recipient`, or the whole gas
    /// coin when `amount` is `None`.
    pub fn transfer_sui(&mut self, recipient: Address, amount: Option<u64>) -> TransactionResult {
        match amount {
            Some(amount) => {
                let coin = self.split_coins(Argument::GasCoin, [amount]);
                self.transfer_objects([coin.nested(0)], recipient)
            }
            None => self.transfer_objects([Argument::GasCoin], recipient),
        }
    }

    /// Pay `amounts[i]` to `recipients[i]` out of `coins`, which are merged
    /// into the first one. Gas is paid separately.
    pub fn pay<I, A>(
        &mut self,
        coins: I,
        recipients: &[Address],
        amounts: &[u64],
    ) -> Result<(), TxError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let coins: Vec<Argument> = coins.into_iter().map(Into::into).collect();
        let Some((&primary, rest)) = coins.split_first() else {
            return Err(TxError::MissingField("input coins"));
        };
        if coins.contains(&Argument::GasCoin) {
            return Err(self.payment_error("gas coin among input coins, use pay_sui"));
        }
        self.check_payments(recipients, amounts)?;
        if !rest.is_empty() {
            self.merge_coins(primary, rest.iter().copied());
        }
        self.pay_from(primary, recipients, amounts);
        Ok(())
    }

    /// Like [`Self::pay`] with the gas coin as the source. Non-empty `coins`
    /// become the gas payment, which the network merges into the gas coin.
    pub fn pay_sui(
        &mut self,
        coins: Vec<ObjectRef>,
        recipients: &[Address],
        amounts: &[u64],
    ) -> Result<(), TxError> {
        self.check_payments(recipients, amounts)?;
        if !coins.is_empty() {
            self.set_gas_payment(coins);
        }
        self.pay_from(Argument::GasCoin, recipients, amounts);
        Ok(())
    }

    /// Send everything in `coins` (or the selected gas coins) minus gas to
    /// `recipient`.
    pub fn pay_all_sui(&mut self, coins: Vec<ObjectRef>, recipient: Address) -> TransactionResult {
        if !coins.is_empty() {
            self.set_gas_payment(coins);
        }
        self.transfer_objects([Argument::GasCoin], recipient)
    }

    /// Split `coin` into `count` equal coins through `0x2::pay::divide_and_keep`;
    /// any remainder stays in `coin`.
    pub fn split_coin_equal(
        &mut self,
        coin: impl Into<Argument>,
        count: u64,
        coin_type: &str,
    ) -> Result<TransactionResult, TxError> {
        TypeTag::parse(coin_type)?;
        let count = self.pure_u64(count);
        self.move_call(PAY_SPLIT_N, &[coin_type], [coin.into(), count])
    }

    fn check_payments(&self, recipients: &[Address], amounts: &[u64]) -> Result<(), TxError> {
        if recipients.len() != amounts.len() {
            return Err(self.payment_error(&format!(
                "{} recipients but {} amounts",
                recipients.len(),
                amounts.len()
            )));
        }
        Ok(())
    }

    fn payment_error(&self, reason: &str) -> TxError {
        TxError::InvalidArgument {
            command: self.data.commands.len(),
            reason: reason.to_string(),
        }
    }

    /// One split for all amounts, then one transfer per distinct recipient
    /// in first-seen order.
    fn pay_from(&mut self, coin: Argument, recipients: &[Address], amounts: &[u64]) {
        let split = self.split_coins(coin, amounts.iter().copied());
        let mut transfers: Vec<(Address, Vec<Argument>)> = Vec::new();
        for (i, recipient) in recipients.iter().enumerate() {
            let part = split.nested(i as u16);
            match transfers.iter_mut().find(|(to, _)| to == recipient) {
                Some((_, objects)) => objects.push(part),
                None => transfers.push((*recipient, vec![part])),
            }
        }
        for (recipient, objects) in transfers {
            self.transfer_objects(objects, recipient);
        }
    }

    /// Run serialization steps and resolve intents the consumer does not
    /// declare support for.
    pub async fn prepare_for_serialization(
        &mut self,
        options: &BuildOptions,
    ) -> Result<(), TxError> {
        let mut steps = self.plugins.serialization_steps().to_vec();

        let mut seen = Vec::new();
        for command in &self.data.commands {
            let Command::Intent(intent) = command else {
                continue;
            };
            if options.supports_intent(&intent.name) || seen.contains(&intent.name) {
                continue;
            }
            let resolver = self
                .plugins
                .intent_resolver(&intent.name)
                .ok_or_else(|| TxError::MissingIntentResolver(intent.name.clone()))?;
            steps.push(resolver.clone());
            seen.push(intent.name.clone());
        }

        run_steps(&steps, &mut self.data, options).await
    }

    async fn prepare_build(&mut self, options: &BuildOptions) -> Result<(), TxError> {
        if !options.only_transaction_kind && self.data.sender.is_none() {
            return Err(TxError::MissingField("sender"));
        }
        self.prepare_for_serialization(options).await?;

        let mut steps = self.plugins.build_steps().to_vec();
        steps.extend(resolve::default_steps());
        run_steps(&steps, &mut self.data, options).await
    }

    /// Resolve everything and encode. Returns `TransactionData` bytes, or
    /// `TransactionKind` bytes with `only_transaction_kind`.
    pub async fn build(&mut self, options: &BuildOptions) -> Result<Vec<u8>, TxError> {
        self.state = BuildState::Building;
        let result = self.build_inner(options).await;
        self.state = match result {
            Ok(_) => BuildState::Built,
            Err(_) => BuildState::Open,
        };
        result
    }

    async fn build_inner(&mut self, options: &BuildOptions) -> Result<Vec<u8>, TxError> {
        self.prepare_build(options).await?;
        let limits = options.limits().await?;
        let bytes = self.data.build(&DataBuildOptions {
            only_transaction_kind: options.only_transaction_kind,
            max_size_bytes: Some(limits.max_tx_size_bytes),
            ..Default::default()
        })?;
        debug!("built transaction: {} bytes", bytes.len());
        Ok(bytes)
    }

    pub async fn get_digest(&mut self, options: &BuildOptions) -> Result<Digest, TxError> {
        let bytes = self.build(options).await?;
        Ok(codec::transaction_digest(&bytes))
    }

    /// v2 JSON after running serialization steps.
    pub async fn to_json(&mut self, options: &BuildOptions) -> Result<String, TxError> {
        self.prepare_for_serialization(options).await?;
        self.data.to_json()
    }

    /// Build and sign; the signer's address becomes the sender if none is set.
    pub async fn sign(
        &mut self,
        signer: &dyn Signer,
        options: &BuildOptions,
    ) -> Result<SignedTransaction, TxError> {
        self.set_sender_if_not_set(signer.address());
        let bytes = self.build(options).await?;
        let signature = signer
            .sign_transaction(&bytes)
            .await
            .map_err(TxError::Signing)?;
        Ok(SignedTransaction {
            bytes: STANDARD.encode(&bytes),
            signature,
        })
    }
}

fn requested_mutable(arg: &CallArg) -> bool {
    match arg {
        CallArg::Object(ObjectArg::SharedObject { mutable, .. }) => *mutable,
        CallArg::UnresolvedObject(obj) => obj.mutable.unwrap_or(false),
        _ => false,
    }
}

fn merge_object(existing: &mut CallArg, new: CallArg) {
    let requested = requested_mutable(&new);
    match (existing, new) {
        (CallArg::Object(ObjectArg::SharedObject { mutable, .. }), _) => *mutable |= requested,
        (slot @ CallArg::UnresolvedObject(_), CallArg::Object(mut arg)) => {
            if let ObjectArg::SharedObject { mutable, .. } = &mut arg {
                *mutable |= requested_mutable(slot);
            }
            *slot = CallArg::Object(arg);
        }
        (CallArg::UnresolvedObject(obj), CallArg::UnresolvedObject(other)) => {
            obj.version = obj.version.or(other.version);
            obj.digest = obj.digest.or(other.digest);
            obj.initial_shared_version =
                obj.initial_shared_version.or(other.initial_shared_version);
            obj.receiving = obj.receiving.or(other.receiving);
            if obj.mutable.is_some() || other.mutable.is_some() {
                obj.mutable = Some(obj.mutable.unwrap_or(false) || requested);
            }
        }
        _ => {}
    }
}
