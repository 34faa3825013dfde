//! Mutable transaction state and its final encoding.
//!
//! [`TransactionDataBuilder`] is the single owner of inputs, commands, gas
//! data, sender and expiration. Everything else (the resolution pipeline,
//! intent resolvers, the [`crate::Transaction`] façade) edits it through
//! the methods here.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::debug;

use crate::codec::{self, schema};
use crate::error::TxError;
use crate::json;
use crate::model::{Argument, CallArg, Command, GasData, InputKind, TransactionExpiration};
use crate::result::TransactionResult;
use crate::types::{Address, Digest, ObjectId};

/// Options for [`TransactionDataBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct DataBuildOptions {
    /// Encode only the `TransactionKind` (no sender, gas or expiration).
    pub only_transaction_kind: bool,
    /// Defaults to [`codec::DEFAULT_MAX_TX_SIZE_BYTES`].
    pub max_size_bytes: Option<u64>,
    /// Gas values that take precedence over the stored ones without being
    /// written back (used for the dry run).
    pub overrides: GasData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDataBuilder {
    pub sender: Option<Address>,
    pub expiration: Option<TransactionExpiration>,
    pub gas_data: GasData,
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl TransactionDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode full `TransactionData` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let schema::TransactionData::V1(data) = codec::decode(bytes)?;
        let schema::TransactionKind::ProgrammableTransaction(pt) = data.kind;
        let (inputs, commands) = pt.into_model();
        Ok(Self {
            sender: Some(data.sender),
            expiration: Some(data.expiration.into()),
            gas_data: data.gas_data.into_model(),
            inputs,
            commands,
        })
    }

    /// Decode `TransactionKind` bytes; sender, gas and expiration stay unset.
    pub fn from_kind_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let schema::TransactionKind::ProgrammableTransaction(pt) = codec::decode(bytes)?;
        let (inputs, commands) = pt.into_model();
        Ok(Self {
            inputs,
            commands,
            ..Self::default()
        })
    }

    /// Parse v1 or v2 JSON.
    pub fn restore(json: &str) -> Result<Self, TxError> {
        json::restore(json)
    }

    pub fn to_json(&self) -> Result<String, TxError> {
        json::to_v2_string(self)
    }

    /// Legacy v1 JSON, for states v1 can express.
    pub fn serialize_v1(&self) -> Result<String, TxError> {
        json::v1::to_v1_string(self)
    }

    /// Independent deep copy of the current state.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Owner of the gas coins: explicit gas owner, else the sender.
    pub fn gas_owner(&self) -> Option<Address> {
        self.gas_data.owner.or(self.sender)
    }

    pub fn add_input(&mut self, kind: InputKind, arg: CallArg) -> Argument {
        let index = self.inputs.len() as u16;
        self.inputs.push(arg);
        Argument::Input {
            index,
            kind: Some(kind),
        }
    }

    pub fn add_command(&mut self, command: Command) -> TransactionResult {
        let index = self.commands.len() as u16;
        self.commands.push(command);
        TransactionResult::new(index)
    }

    /// Ids of all object inputs, resolved or not.
    pub fn input_object_ids(&self) -> BTreeSet<ObjectId> {
        self.inputs.iter().filter_map(CallArg::object_id).collect()
    }

    /// Calls `f` with every argument that reads input `index`, together with
    /// the command using it.
    pub fn get_input_uses<F>(&self, index: u16, mut f: F)
    where
        F: FnMut(&Argument, &Command),
    {
        for command in &self.commands {
            for arg in command.arguments() {
                if arg.input_index() == Some(index) {
                    f(arg, command);
                }
            }
        }
    }

    /// Read-only visit of every argument with the index of its command.
    pub fn for_each_argument<F>(&self, mut f: F)
    where
        F: FnMut(&Argument, usize),
    {
        for (i, command) in self.commands.iter().enumerate() {
            for arg in command.arguments() {
                f(arg, i);
            }
        }
    }

    /// Rewrite arguments in place; `f` gets the index of the owning command.
    pub fn map_arguments<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Argument, usize),
    {
        for (i, command) in self.commands.iter_mut().enumerate() {
            for arg in command.arguments_mut() {
                f(arg, i);
            }
        }
    }

    /// Replace the command at `index` with `replacement` (possibly empty).
    ///
    /// Result references to commands after `index` are shifted so they keep
    /// pointing at the same command. The replacement commands are inserted
    /// as given: they must already use final positions.
    pub fn replace_command(
        &mut self,
        index: usize,
        replacement: Vec<Command>,
    ) -> Result<(), TxError> {
        self.splice_command(index, replacement, None)
    }

    /// Like [`Self::replace_command`], and every use of the replaced
    /// command's output is redirected to `result`.
    pub fn replace_command_with_result(
        &mut self,
        index: usize,
        replacement: Vec<Command>,
        result: Argument,
    ) -> Result<(), TxError> {
        self.splice_command(index, replacement, Some(result))
    }

    fn splice_command(
        &mut self,
        index: usize,
        replacement: Vec<Command>,
        result: Option<Argument>,
    ) -> Result<(), TxError> {
        if index >= self.commands.len() {
            return Err(TxError::InvalidArgument {
                command: index,
                reason: format!("no command at index {index}"),
            });
        }
        let inserted = replacement.len();
        let delta = inserted as i64 - 1;
        debug!(
            "replacing {} at {index} with {inserted} command(s)",
            self.commands[index].kind_name()
        );
        self.commands.splice(index..=index, replacement);

        // Each reference is rewritten exactly once, judged by its original
        // target: uses of `index` are redirected, later ones shifted.
        for (position, command) in self.commands.iter_mut().enumerate() {
            if (index..index + inserted).contains(&position) {
                continue;
            }
            for arg in command.arguments_mut() {
                let Some(target) = arg.result_index() else {
                    continue;
                };
                match (target as usize).cmp(&index) {
                    Ordering::Less => {}
                    Ordering::Equal => {
                        if let Some(result) = result {
                            *arg = redirect(*arg, result, position)?;
                        }
                    }
                    Ordering::Greater => match arg {
                        Argument::Result(j) | Argument::NestedResult(j, _) => {
                            *j = shift(*j, delta, position)?;
                        }
                        _ => {}
                    },
                }
            }
        }
        Ok(())
    }

    /// Every input index exists and results only read earlier commands.
    pub fn validate_arguments(&self) -> Result<(), TxError> {
        if self.inputs.len() > u16::MAX as usize + 1 || self.commands.len() > u16::MAX as usize + 1
        {
            return Err(TxError::InvalidArgument {
                command: self.commands.len(),
                reason: "too many inputs or commands".into(),
            });
        }
        for (i, command) in self.commands.iter().enumerate() {
            for arg in command.arguments() {
                match *arg {
                    Argument::GasCoin => {}
                    Argument::Input { index, .. } if (index as usize) >= self.inputs.len() => {
                        return Err(TxError::InvalidArgument {
                            command: i,
                            reason: format!(
                                "input {index} does not exist ({} inputs)",
                                self.inputs.len()
                            ),
                        });
                    }
                    Argument::Input { .. } => {}
                    Argument::Result(j) | Argument::NestedResult(j, _) if (j as usize) >= i => {
                        return Err(TxError::InvalidArgument {
                            command: i,
                            reason: format!("result of command {j} is not available yet"),
                        });
                    }
                    Argument::Result(_) | Argument::NestedResult(..) => {}
                }
            }
        }
        Ok(())
    }

    /// Encode the transaction.
    ///
    /// Checks required fields in this order: sender, gas budget, gas
    /// payment, gas price. Gas owner defaults to the sender and expiration
    /// to `None`.
    pub fn build(&self, options: &DataBuildOptions) -> Result<Vec<u8>, TxError> {
        let max = options
            .max_size_bytes
            .unwrap_or(codec::DEFAULT_MAX_TX_SIZE_BYTES);

        if options.only_transaction_kind {
            self.validate_arguments()?;
            let pt = schema::ProgrammableTransaction::from_model(&self.inputs, &self.commands)?;
            return codec::encode(&schema::TransactionKind::ProgrammableTransaction(pt), max);
        }

        let overrides = &options.overrides;
        let sender = self.sender.ok_or(TxError::MissingField("sender"))?;
        let budget = overrides
            .budget
            .or(self.gas_data.budget)
            .ok_or(TxError::MissingField("gas budget"))?;
        let payment = overrides
            .payment
            .as_ref()
            .or(self.gas_data.payment.as_ref())
            .ok_or(TxError::MissingField("gas payment"))?;
        let price = overrides
            .price
            .or(self.gas_data.price)
            .ok_or(TxError::MissingField("gas price"))?;
        let owner = overrides.owner.or(self.gas_data.owner).unwrap_or(sender);

        self.validate_arguments()?;
        let pt = schema::ProgrammableTransaction::from_model(&self.inputs, &self.commands)?;
        let data = schema::TransactionData::V1(schema::TransactionDataV1 {
            kind: schema::TransactionKind::ProgrammableTransaction(pt),
            sender,
            gas_data: schema::GasData::from_model(payment, owner, price, budget),
            expiration: self
                .expiration
                .unwrap_or(TransactionExpiration::None)
                .into(),
        });
        codec::encode(&data, max)
    }

    /// Digest of the fully built transaction.
    pub fn digest(&self) -> Result<Digest, TxError> {
        let bytes = self.build(&DataBuildOptions::default())?;
        Ok(codec::transaction_digest(&bytes))
    }
}

fn shift(index: u16, delta: i64, command: usize) -> Result<u16, TxError> {
    u16::try_from(i64::from(index) + delta).map_err(|_| TxError::InvalidArgument {
        command,
        reason: format!("result index {index} out of range after replacement"),
    })
}

/// Point a use of a replaced command at its substitute.
fn redirect(arg: Argument, result: Argument, command: usize) -> Result<Argument, TxError> {
    match (arg, result) {
        (Argument::NestedResult(_, sub), Argument::Result(r)) => Ok(Argument::NestedResult(r, sub)),
        (Argument::NestedResult(..), _) => Err(TxError::InvalidArgument {
            command,
            reason: format!("cannot index into replacement result {result:?}"),
        }),
        _ => Ok(result),
    }
}
