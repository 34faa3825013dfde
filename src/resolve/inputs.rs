//! Type-directed normalization of unresolved inputs.
//!
//! Move call parameters decide how an untyped input is used: a pure
//! parameter type encodes an `UnresolvedPure` value, an object parameter
//! records mutability and receiving intent on an `UnresolvedObject`. Fixed
//! command slots (split amounts, transfer recipient, typed vectors) need no
//! signature.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;

use crate::client::{MoveFunctionSignature, MoveType};
use crate::codec::pure::{self, PureType};
use crate::data::TransactionDataBuilder;
use crate::error::TxError;
use crate::model::{Argument, CallArg, Command, UnresolvedObject};
use crate::options::BuildOptions;
use crate::pipeline::{BuildStep, Next};
use crate::type_tag::TypeTag;
use crate::types::{Address, ObjectId};

pub struct NormalizeInputs;

type FunctionKey = (ObjectId, String, String);

#[derive(Debug, Clone)]
enum Usage {
    Pure(TypeTag),
    Object { mutable: bool, receiving: bool },
}

fn is_unresolved(tx: &TransactionDataBuilder, arg: &Argument) -> bool {
    arg.input_index()
        .and_then(|i| tx.inputs.get(i as usize))
        .is_some_and(|input| !input.is_resolved())
}

fn usage_of(param: &MoveType, type_args: &[TypeTag]) -> Usage {
    let body = param.body();
    if let Some(tag) = body.to_type_tag(type_args) {
        if PureType::from_type_tag(&tag).is_some() {
            return Usage::Pure(tag);
        }
    }
    Usage::Object {
        mutable: param.is_mutable_use(),
        receiving: body.is_struct(&Address::FRAMEWORK, "transfer", "Receiving"),
    }
}

fn collect_usages(
    tx: &TransactionDataBuilder,
    signatures: &BTreeMap<FunctionKey, MoveFunctionSignature>,
) -> Result<Vec<(u16, Usage)>, TxError> {
    let mut usages = Vec::new();
    let mut push_fixed = |args: &[Argument], tag: &TypeTag| {
        for arg in args {
            if let Some(index) = arg.input_index() {
                usages.push((index, Usage::Pure(tag.clone())));
            }
        }
    };

    let mut call_usages = Vec::new();
    for (i, command) in tx.commands.iter().enumerate() {
        match command {
            Command::MoveCall(call) => {
                let key = (call.package, call.module.clone(), call.function.clone());
                let Some(signature) = signatures.get(&key) else {
                    continue;
                };
                let mut params = signature.parameters.as_slice();
                if params.last().is_some_and(MoveType::is_tx_context) {
                    params = &params[..params.len() - 1];
                }
                if params.len() != call.arguments.len() {
                    return Err(TxError::InvalidArgument {
                        command: i,
                        reason: format!(
                            "{} expects {} arguments, got {}",
                            call.target(),
                            params.len(),
                            call.arguments.len()
                        ),
                    });
                }
                for (arg, param) in call.arguments.iter().zip(params) {
                    if let Some(index) = arg.input_index() {
                        call_usages.push((index, usage_of(param, &call.type_arguments)));
                    }
                }
            }
            Command::SplitCoins(split) => push_fixed(&split.amounts, &TypeTag::U64),
            Command::TransferObjects(transfer) => {
                push_fixed(std::slice::from_ref(&transfer.address), &TypeTag::Address)
            }
            Command::MakeMoveVec(vec) => {
                if let Some(tag) = &vec.type_tag {
                    if PureType::from_type_tag(tag).is_some() {
                        push_fixed(&vec.elements, tag);
                    }
                }
            }
            _ => {}
        }
    }
    usages.extend(call_usages);
    Ok(usages)
}

fn apply_usage(input: &mut CallArg, index: u16, usage: Usage) -> Result<(), TxError> {
    let pure_error = |reason: String| TxError::PureResolution {
        index: index as usize,
        reason,
    };
    match (&mut *input, usage) {
        (CallArg::UnresolvedPure { value }, Usage::Pure(tag)) => {
            let ty = PureType::from_type_tag(&tag)
                .ok_or_else(|| pure_error(format!("{tag} is not a pure type")))?;
            let bytes = pure::encode(value, &ty).map_err(|e| pure_error(e.to_string()))?;
            *input = CallArg::pure(bytes);
        }
        (CallArg::UnresolvedPure { value }, Usage::Object { mutable, receiving }) => {
            let id = value
                .as_str()
                .ok_or_else(|| pure_error("object parameter needs an object id".into()))?;
            let object_id = Address::from_str(id)?;
            *input = CallArg::UnresolvedObject(UnresolvedObject {
                mutable: Some(mutable),
                receiving: receiving.then_some(true),
                ..UnresolvedObject::new(object_id)
            });
        }
        (CallArg::UnresolvedObject(obj), Usage::Object { mutable, receiving }) => {
            obj.mutable = Some(obj.mutable.unwrap_or(false) || mutable);
            if receiving {
                obj.receiving = Some(true);
            }
        }
        (CallArg::UnresolvedObject(obj), Usage::Pure(tag)) => {
            return Err(pure_error(format!(
                "object {} passed where {tag} is expected",
                obj.object_id
            )));
        }
        (CallArg::Pure { .. } | CallArg::Object(_), _) => {}
    }
    Ok(())
}

impl NormalizeInputs {
    async fn fetch_signatures(
        tx: &TransactionDataBuilder,
        options: &BuildOptions,
    ) -> Result<BTreeMap<FunctionKey, MoveFunctionSignature>, TxError> {
        let needed: BTreeSet<FunctionKey> = tx
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::MoveCall(call) if call.arguments.iter().any(|a| is_unresolved(tx, a)) => {
                    Some((call.package, call.module.clone(), call.function.clone()))
                }
                _ => None,
            })
            .collect();
        if needed.is_empty() {
            return Ok(BTreeMap::new());
        }

        let client = options.client("move function signatures")?;
        debug!("fetching {} move function signature(s)", needed.len());
        let signatures = try_join_all(needed.iter().map(|(package, module, function)| {
            client.get_normalized_move_function(*package, module, function)
        }))
        .await
        .map_err(TxError::Client)?;

        Ok(needed.into_iter().zip(signatures).collect())
    }
}

#[async_trait]
impl BuildStep for NormalizeInputs {
    fn name(&self) -> &str {
        "NormalizeInputs"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        if tx.inputs.iter().any(|input| !input.is_resolved()) {
            let signatures = Self::fetch_signatures(tx, options).await?;
            for (index, usage) in collect_usages(tx, &signatures)? {
                if let Some(input) = tx.inputs.get_mut(index as usize) {
                    apply_usage(input, index, usage)?;
                }
            }

            if let Some(index) = tx
                .inputs
                .iter()
                .position(|input| matches!(input, CallArg::UnresolvedPure { .. }))
            {
                return Err(TxError::PureResolution {
                    index,
                    reason: "no type information; use a typed pure helper".into(),
                });
            }

            let kinds: Vec<_> = tx.inputs.iter().map(CallArg::kind).collect();
            tx.map_arguments(|arg, _| {
                if let Argument::Input { index, kind } = arg {
                    if let Some(k) = kinds.get(*index as usize) {
                        *kind = Some(*k);
                    }
                }
            });
        }

        next.run(tx).await
    }
}
