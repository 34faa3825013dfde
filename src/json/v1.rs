//! Legacy v1 JSON layout.
//!
//! v1 calls commands `transactions`, tags commands and arguments with a
//! `kind` field, embeds the full input in every `Input` argument and writes
//! type tags as JSON objects (`{"u64": null}`). It has no intents and can
//! only describe an unresolved object by its id.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::data::TransactionDataBuilder;
use crate::error::{CodecError, TxError};
use crate::model::{
    Argument, CallArg, Command, GasData, InputKind, ObjectArg, TransactionExpiration,
    UnresolvedObject,
};
use crate::type_tag::{StructTag, TypeTag};
use crate::types::{Address, Digest, ObjectId, ObjectRef};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedV1 {
    pub version: u64,
    #[serde(default)]
    pub sender: Option<Address>,
    #[serde(default)]
    pub expiration: Option<ExpirationV1>,
    #[serde(default)]
    pub gas_config: GasConfigV1,
    pub inputs: Vec<InputV1>,
    pub transactions: Vec<TransactionV1>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExpirationV1 {
    Epoch(#[serde(deserialize_with = "super::u64_string::deserialize")] u64),
    None(Option<bool>),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasConfigV1 {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::option_u64_string"
    )]
    pub budget: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::option_u64_string"
    )]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Vec<PaymentRefV1>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
}

/// Gas payment reference; v1 writes the version as a JSON number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRefV1 {
    pub object_id: ObjectId,
    #[serde(deserialize_with = "super::u64_string::deserialize")]
    pub version: u64,
    pub digest: Digest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputV1 {
    pub kind: String,
    pub index: u16,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ArgumentV1 {
    GasCoin,
    Input {
        index: u16,
        #[serde(default)]
        value: Value,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        input_type: Option<InputKind>,
    },
    Result {
        index: u16,
    },
    NestedResult {
        index: u16,
        #[serde(rename = "resultIndex")]
        result_index: u16,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransactionV1 {
    MoveCall {
        target: String,
        #[serde(rename = "typeArguments", default)]
        type_arguments: Vec<String>,
        arguments: Vec<ArgumentV1>,
    },
    TransferObjects {
        objects: Vec<ArgumentV1>,
        address: ArgumentV1,
    },
    SplitCoins {
        coin: ArgumentV1,
        amounts: Vec<ArgumentV1>,
    },
    MergeCoins {
        destination: ArgumentV1,
        sources: Vec<ArgumentV1>,
    },
    Publish {
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
    },
    MakeMoveVec {
        #[serde(rename = "type", default)]
        type_tag: Option<Value>,
        objects: Vec<ArgumentV1>,
    },
    Upgrade {
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        #[serde(rename = "packageId")]
        package_id: ObjectId,
        ticket: ArgumentV1,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum ObjectArgV1 {
    ImmOrOwned(ObjectRef),
    Shared(SharedObjectV1),
    Receiving(ObjectRef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedObjectV1 {
    object_id: ObjectId,
    #[serde(with = "super::u64_string")]
    initial_shared_version: u64,
    mutable: bool,
}

fn incompatible(reason: impl Into<String>) -> TxError {
    CodecError::V1Incompatible(reason.into()).into()
}

/// Migrate a v1 document to builder state.
pub fn into_builder(v1: SerializedV1) -> Result<TransactionDataBuilder, TxError> {
    let inputs = v1
        .inputs
        .iter()
        .map(input_from_v1)
        .collect::<Result<Vec<_>, _>>()?;
    let commands = v1
        .transactions
        .into_iter()
        .map(|tx| command_from_v1(tx, &inputs))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransactionDataBuilder {
        sender: v1.sender,
        expiration: v1.expiration.map(|exp| match exp {
            ExpirationV1::Epoch(epoch) => TransactionExpiration::Epoch(epoch),
            ExpirationV1::None(_) => TransactionExpiration::None,
        }),
        gas_data: GasData {
            budget: v1.gas_config.budget,
            price: v1.gas_config.price,
            owner: v1.gas_config.owner,
            payment: v1.gas_config.payment.map(|refs| {
                refs.into_iter()
                    .map(|r| ObjectRef::new(r.object_id, r.version, r.digest))
                    .collect()
            }),
        },
        inputs,
        commands,
    })
}

fn input_from_v1(input: &InputV1) -> Result<CallArg, TxError> {
    if let Some(object) = input.value.get("Object") {
        let arg: ObjectArgV1 = serde_json::from_value(object.clone())?;
        return Ok(CallArg::Object(match arg {
            ObjectArgV1::ImmOrOwned(r) => ObjectArg::ImmOrOwnedObject(r),
            ObjectArgV1::Receiving(r) => ObjectArg::Receiving(r),
            ObjectArgV1::Shared(s) => ObjectArg::SharedObject {
                object_id: s.object_id,
                initial_shared_version: s.initial_shared_version,
                mutable: s.mutable,
            },
        }));
    }
    if let Some(pure) = input.value.get("Pure") {
        let bytes: Vec<u8> = serde_json::from_value(pure.clone())?;
        return Ok(CallArg::pure(bytes));
    }
    match input.input_type {
        Some(InputKind::Object) => {
            let id = input
                .value
                .as_str()
                .ok_or_else(|| incompatible(format!("object input {} has no id", input.index)))?;
            Ok(CallArg::UnresolvedObject(UnresolvedObject::new(
                Address::from_str(id)?,
            )))
        }
        _ => Ok(CallArg::UnresolvedPure {
            value: input.value.clone(),
        }),
    }
}

fn arg_from_v1(arg: ArgumentV1, inputs: &[CallArg]) -> Argument {
    match arg {
        ArgumentV1::GasCoin => Argument::GasCoin,
        ArgumentV1::Input { index, .. } => Argument::Input {
            index,
            kind: inputs.get(index as usize).map(CallArg::kind),
        },
        ArgumentV1::Result { index } => Argument::Result(index),
        ArgumentV1::NestedResult {
            index,
            result_index,
        } => Argument::NestedResult(index, result_index),
    }
}

fn args_from_v1(args: Vec<ArgumentV1>, inputs: &[CallArg]) -> Vec<Argument> {
    args.into_iter().map(|a| arg_from_v1(a, inputs)).collect()
}

fn command_from_v1(tx: TransactionV1, inputs: &[CallArg]) -> Result<Command, TxError> {
    Ok(match tx {
        TransactionV1::MoveCall {
            target,
            type_arguments,
            arguments,
        } => {
            let type_arguments: Vec<&str> = type_arguments.iter().map(String::as_str).collect();
            Command::move_call(&target, &type_arguments, args_from_v1(arguments, inputs))?
        }
        TransactionV1::TransferObjects { objects, address } => Command::transfer_objects(
            args_from_v1(objects, inputs),
            arg_from_v1(address, inputs),
        ),
        TransactionV1::SplitCoins { coin, amounts } => {
            Command::split_coins(arg_from_v1(coin, inputs), args_from_v1(amounts, inputs))
        }
        TransactionV1::MergeCoins {
            destination,
            sources,
        } => Command::merge_coins(
            arg_from_v1(destination, inputs),
            args_from_v1(sources, inputs),
        ),
        TransactionV1::Publish {
            modules,
            dependencies,
        } => Command::publish(modules, dependencies),
        TransactionV1::MakeMoveVec { type_tag, objects } => {
            let type_tag = match type_tag.as_ref().and_then(|t| t.get("Some")) {
                Some(tag) => Some(type_tag_from_v1(tag)?),
                None => None,
            };
            Command::MakeMoveVec(crate::model::MakeMoveVec {
                type_tag,
                elements: args_from_v1(objects, inputs),
            })
        }
        TransactionV1::Upgrade {
            modules,
            dependencies,
            package_id,
            ticket,
        } => Command::upgrade(modules, dependencies, package_id, arg_from_v1(ticket, inputs)),
    })
}

/// Serialize builder state as v1 JSON.
///
/// Fails with [`CodecError::V1Incompatible`] for intents and for
/// unresolved objects carrying more than their id.
pub fn to_v1_string(data: &TransactionDataBuilder) -> Result<String, TxError> {
    let inputs = data
        .inputs
        .iter()
        .enumerate()
        .map(|(i, arg)| input_to_v1(i, arg))
        .collect::<Result<Vec<_>, _>>()?;
    let transactions = data
        .commands
        .iter()
        .map(|c| command_to_v1(c, &inputs))
        .collect::<Result<Vec<_>, _>>()?;

    let serialized = SerializedV1 {
        version: 1,
        sender: data.sender,
        expiration: data.expiration.map(|exp| match exp {
            TransactionExpiration::None => ExpirationV1::None(Some(true)),
            TransactionExpiration::Epoch(epoch) => ExpirationV1::Epoch(epoch),
        }),
        gas_config: GasConfigV1 {
            budget: data.gas_data.budget,
            price: data.gas_data.price,
            owner: data.gas_data.owner,
            payment: data.gas_data.payment.as_ref().map(|refs| {
                refs.iter()
                    .map(|r| PaymentRefV1 {
                        object_id: r.object_id,
                        version: r.version,
                        digest: r.digest,
                    })
                    .collect()
            }),
        },
        inputs,
        transactions,
    };
    Ok(serde_json::to_string(&serialized)?)
}

fn input_to_v1(index: usize, arg: &CallArg) -> Result<InputV1, TxError> {
    let value = match arg {
        CallArg::Pure { bytes } => json!({ "Pure": bytes }),
        CallArg::Object(obj) => {
            let obj = match *obj {
                ObjectArg::ImmOrOwnedObject(r) => ObjectArgV1::ImmOrOwned(r),
                ObjectArg::Receiving(r) => ObjectArgV1::Receiving(r),
                ObjectArg::SharedObject {
                    object_id,
                    initial_shared_version,
                    mutable,
                } => ObjectArgV1::Shared(SharedObjectV1 {
                    object_id,
                    initial_shared_version,
                    mutable,
                }),
            };
            json!({ "Object": serde_json::to_value(obj)? })
        }
        CallArg::UnresolvedPure { value } => value.clone(),
        CallArg::UnresolvedObject(obj) => {
            if !obj.is_bare() {
                return Err(incompatible(format!(
                    "unresolved object input {index} carries more than its id"
                )));
            }
            Value::String(obj.object_id.to_string())
        }
    };
    Ok(InputV1 {
        kind: "Input".into(),
        index: index as u16,
        value,
        input_type: Some(arg.kind()),
    })
}

fn arg_to_v1(arg: &Argument, inputs: &[InputV1]) -> Result<ArgumentV1, TxError> {
    Ok(match *arg {
        Argument::GasCoin => ArgumentV1::GasCoin,
        Argument::Input { index, .. } => {
            let input = inputs
                .get(index as usize)
                .ok_or_else(|| incompatible(format!("input {index} does not exist")))?;
            ArgumentV1::Input {
                index,
                value: input.value.clone(),
                input_type: input.input_type,
            }
        }
        Argument::Result(index) => ArgumentV1::Result { index },
        Argument::NestedResult(index, result_index) => ArgumentV1::NestedResult {
            index,
            result_index,
        },
    })
}

fn args_to_v1(args: &[Argument], inputs: &[InputV1]) -> Result<Vec<ArgumentV1>, TxError> {
    args.iter().map(|a| arg_to_v1(a, inputs)).collect()
}

fn command_to_v1(command: &Command, inputs: &[InputV1]) -> Result<TransactionV1, TxError> {
    Ok(match command {
        Command::MoveCall(call) => TransactionV1::MoveCall {
            target: call.target(),
            type_arguments: call.type_arguments.iter().map(ToString::to_string).collect(),
            arguments: args_to_v1(&call.arguments, inputs)?,
        },
        Command::TransferObjects(t) => TransactionV1::TransferObjects {
            objects: args_to_v1(&t.objects, inputs)?,
            address: arg_to_v1(&t.address, inputs)?,
        },
        Command::SplitCoins(s) => TransactionV1::SplitCoins {
            coin: arg_to_v1(&s.coin, inputs)?,
            amounts: args_to_v1(&s.amounts, inputs)?,
        },
        Command::MergeCoins(m) => TransactionV1::MergeCoins {
            destination: arg_to_v1(&m.destination, inputs)?,
            sources: args_to_v1(&m.sources, inputs)?,
        },
        Command::Publish(p) => TransactionV1::Publish {
            modules: p.modules.clone(),
            dependencies: p.dependencies.clone(),
        },
        Command::MakeMoveVec(v) => TransactionV1::MakeMoveVec {
            type_tag: Some(match &v.type_tag {
                Some(tag) => json!({ "Some": type_tag_to_v1(tag) }),
                None => json!({ "None": true }),
            }),
            objects: args_to_v1(&v.elements, inputs)?,
        },
        Command::Upgrade(u) => TransactionV1::Upgrade {
            modules: u.modules.clone(),
            dependencies: u.dependencies.clone(),
            package_id: u.package,
            ticket: arg_to_v1(&u.ticket, inputs)?,
        },
        Command::Intent(intent) => {
            return Err(incompatible(format!(
                "intent `{}` has no v1 representation",
                intent.name
            )))
        }
    })
}

fn type_tag_to_v1(tag: &TypeTag) -> Value {
    let (key, inner) = match tag {
        TypeTag::Bool => ("bool", Value::Null),
        TypeTag::U8 => ("u8", Value::Null),
        TypeTag::U16 => ("u16", Value::Null),
        TypeTag::U32 => ("u32", Value::Null),
        TypeTag::U64 => ("u64", Value::Null),
        TypeTag::U128 => ("u128", Value::Null),
        TypeTag::U256 => ("u256", Value::Null),
        TypeTag::Address => ("address", Value::Null),
        TypeTag::Signer => ("signer", Value::Null),
        TypeTag::Vector(inner) => ("vector", type_tag_to_v1(inner)),
        TypeTag::Struct(s) => (
            "struct",
            json!({
                "address": s.address.to_string(),
                "module": s.module,
                "name": s.name,
                "typeParams": s.type_params.iter().map(type_tag_to_v1).collect::<Vec<_>>(),
            }),
        ),
    };
    let mut map = Map::new();
    map.insert(key.into(), inner);
    Value::Object(map)
}

fn type_tag_from_v1(value: &Value) -> Result<TypeTag, TxError> {
    let invalid = || TxError::InvalidTypeTag(value.to_string(), "not a v1 type tag".into());
    let map = value.as_object().ok_or_else(invalid)?;
    let (key, inner) = match map.iter().next() {
        Some(entry) if map.len() == 1 => entry,
        _ => return Err(invalid()),
    };
    Ok(match key.as_str() {
        "bool" => TypeTag::Bool,
        "u8" => TypeTag::U8,
        "u16" => TypeTag::U16,
        "u32" => TypeTag::U32,
        "u64" => TypeTag::U64,
        "u128" => TypeTag::U128,
        "u256" => TypeTag::U256,
        "address" => TypeTag::Address,
        "signer" => TypeTag::Signer,
        "vector" => TypeTag::Vector(Box::new(type_tag_from_v1(inner)?)),
        "struct" => {
            let field = |name: &str| inner.get(name).and_then(Value::as_str).ok_or_else(invalid);
            let type_params = match inner.get("typeParams") {
                Some(Value::Array(params)) => params
                    .iter()
                    .map(type_tag_from_v1)
                    .collect::<Result<Vec<_>, _>>()?,
                None | Some(Value::Null) => Vec::new(),
                Some(_) => return Err(invalid()),
            };
            TypeTag::Struct(Box::new(StructTag {
                address: Address::from_str(field("address")?)?,
                module: field("module")?.to_string(),
                name: field("name")?.to_string(),
                type_params,
            }))
        }
        _ => return Err(invalid()),
    })
}
