//! Wire layout of `TransactionData`.
//!
//! Enum variant order is the BCS tag and must not change. These types are
//! only ever BCS-encoded; the JSON shapes live in [`crate::model`].

use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::model;
use crate::type_tag;
use crate::types::{Address, Digest, ObjectId};

/// `(object id, version, digest)`
pub type ObjectRef = (ObjectId, u64, Digest);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: Address,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

/// Only programmable transactions are built here; system transaction kinds
/// that follow it on the wire are never produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
    Receiving(ObjectRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    SplitCoins(Argument, Vec<Argument>),
    MergeCoins(Argument, Vec<Argument>),
    Publish(Vec<Vec<u8>>, Vec<ObjectId>),
    MakeMoveVec(Option<TypeTag>, Vec<Argument>),
    Upgrade(Vec<Vec<u8>>, Vec<ObjectId>, ObjectId, Argument),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

/// Move type tag in wire order. `U16`, `U32` and `U256` were appended
/// after the original primitives, hence the odd position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: Address,
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

impl From<&type_tag::TypeTag> for TypeTag {
    fn from(tag: &type_tag::TypeTag) -> Self {
        use type_tag::TypeTag as T;
        match tag {
            T::Bool => Self::Bool,
            T::U8 => Self::U8,
            T::U16 => Self::U16,
            T::U32 => Self::U32,
            T::U64 => Self::U64,
            T::U128 => Self::U128,
            T::U256 => Self::U256,
            T::Address => Self::Address,
            T::Signer => Self::Signer,
            T::Vector(inner) => Self::Vector(Box::new(inner.as_ref().into())),
            T::Struct(s) => Self::Struct(Box::new(StructTag {
                address: s.address,
                module: s.module.clone(),
                name: s.name.clone(),
                type_params: s.type_params.iter().map(Into::into).collect(),
            })),
        }
    }
}

impl From<TypeTag> for type_tag::TypeTag {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Bool => Self::Bool,
            TypeTag::U8 => Self::U8,
            TypeTag::U16 => Self::U16,
            TypeTag::U32 => Self::U32,
            TypeTag::U64 => Self::U64,
            TypeTag::U128 => Self::U128,
            TypeTag::U256 => Self::U256,
            TypeTag::Address => Self::Address,
            TypeTag::Signer => Self::Signer,
            TypeTag::Vector(inner) => Self::Vector(Box::new((*inner).into())),
            TypeTag::Struct(s) => Self::Struct(Box::new(type_tag::StructTag {
                address: s.address,
                module: s.module,
                name: s.name,
                type_params: s.type_params.into_iter().map(Into::into).collect(),
            })),
        }
    }
}

impl From<model::Argument> for Argument {
    fn from(arg: model::Argument) -> Self {
        match arg {
            model::Argument::GasCoin => Self::GasCoin,
            model::Argument::Input { index, .. } => Self::Input(index),
            model::Argument::Result(i) => Self::Result(i),
            model::Argument::NestedResult(i, j) => Self::NestedResult(i, j),
        }
    }
}

impl From<TransactionExpiration> for model::TransactionExpiration {
    fn from(exp: TransactionExpiration) -> Self {
        match exp {
            TransactionExpiration::None => Self::None,
            TransactionExpiration::Epoch(e) => Self::Epoch(e),
        }
    }
}

impl From<model::TransactionExpiration> for TransactionExpiration {
    fn from(exp: model::TransactionExpiration) -> Self {
        match exp {
            model::TransactionExpiration::None => Self::None,
            model::TransactionExpiration::Epoch(e) => Self::Epoch(e),
        }
    }
}

fn object_ref_to_wire(r: &crate::types::ObjectRef) -> ObjectRef {
    (r.object_id, r.version, r.digest)
}

fn object_ref_from_wire((object_id, version, digest): ObjectRef) -> crate::types::ObjectRef {
    crate::types::ObjectRef::new(object_id, version, digest)
}

impl From<&model::ObjectArg> for ObjectArg {
    fn from(arg: &model::ObjectArg) -> Self {
        match arg {
            model::ObjectArg::ImmOrOwnedObject(r) => Self::ImmOrOwnedObject(object_ref_to_wire(r)),
            model::ObjectArg::SharedObject {
                object_id,
                initial_shared_version,
                mutable,
            } => Self::SharedObject {
                id: *object_id,
                initial_shared_version: *initial_shared_version,
                mutable: *mutable,
            },
            model::ObjectArg::Receiving(r) => Self::Receiving(object_ref_to_wire(r)),
        }
    }
}

impl From<ObjectArg> for model::ObjectArg {
    fn from(arg: ObjectArg) -> Self {
        match arg {
            ObjectArg::ImmOrOwnedObject(r) => Self::ImmOrOwnedObject(object_ref_from_wire(r)),
            ObjectArg::SharedObject {
                id,
                initial_shared_version,
                mutable,
            } => Self::SharedObject {
                object_id: id,
                initial_shared_version,
                mutable,
            },
            ObjectArg::Receiving(r) => Self::Receiving(object_ref_from_wire(r)),
        }
    }
}

fn call_arg_to_wire(index: usize, arg: &model::CallArg) -> Result<CallArg, TxError> {
    match arg {
        model::CallArg::Pure { bytes } => Ok(CallArg::Pure(bytes.clone())),
        model::CallArg::Object(obj) => Ok(CallArg::Object(obj.into())),
        model::CallArg::UnresolvedPure { .. } | model::CallArg::UnresolvedObject(_) => {
            Err(TxError::UnresolvedInput(index))
        }
    }
}

fn args(list: &[model::Argument]) -> Vec<Argument> {
    list.iter().copied().map(Into::into).collect()
}

fn command_to_wire(command: &model::Command) -> Result<Command, TxError> {
    use model::Command as C;
    Ok(match command {
        C::MoveCall(call) => Command::MoveCall(Box::new(ProgrammableMoveCall {
            package: call.package,
            module: call.module.clone(),
            function: call.function.clone(),
            type_arguments: call.type_arguments.iter().map(Into::into).collect(),
            arguments: args(&call.arguments),
        })),
        C::TransferObjects(t) => Command::TransferObjects(args(&t.objects), t.address.into()),
        C::SplitCoins(s) => Command::SplitCoins(s.coin.into(), args(&s.amounts)),
        C::MergeCoins(m) => Command::MergeCoins(m.destination.into(), args(&m.sources)),
        C::Publish(p) => Command::Publish(p.modules.clone(), p.dependencies.clone()),
        C::MakeMoveVec(v) => {
            Command::MakeMoveVec(v.type_tag.as_ref().map(Into::into), args(&v.elements))
        }
        C::Upgrade(u) => Command::Upgrade(
            u.modules.clone(),
            u.dependencies.clone(),
            u.package,
            u.ticket.into(),
        ),
        C::Intent(intent) => return Err(TxError::UnresolvedIntent(intent.name.clone())),
    })
}

/// Restores the advisory input-kind hint from the input list.
fn arg_from_wire(arg: Argument, inputs: &[model::CallArg]) -> model::Argument {
    match arg {
        Argument::GasCoin => model::Argument::GasCoin,
        Argument::Input(index) => model::Argument::Input {
            index,
            kind: inputs.get(index as usize).map(model::CallArg::kind),
        },
        Argument::Result(i) => model::Argument::Result(i),
        Argument::NestedResult(i, j) => model::Argument::NestedResult(i, j),
    }
}

fn args_from_wire(list: Vec<Argument>, inputs: &[model::CallArg]) -> Vec<model::Argument> {
    list.into_iter().map(|a| arg_from_wire(a, inputs)).collect()
}

fn command_from_wire(command: Command, inputs: &[model::CallArg]) -> model::Command {
    use model::Command as C;
    match command {
        Command::MoveCall(call) => C::MoveCall(model::MoveCall {
            package: call.package,
            module: call.module,
            function: call.function,
            type_arguments: call.type_arguments.into_iter().map(Into::into).collect(),
            arguments: args_from_wire(call.arguments, inputs),
        }),
        Command::TransferObjects(objects, address) => C::TransferObjects(model::TransferObjects {
            objects: args_from_wire(objects, inputs),
            address: arg_from_wire(address, inputs),
        }),
        Command::SplitCoins(coin, amounts) => C::SplitCoins(model::SplitCoins {
            coin: arg_from_wire(coin, inputs),
            amounts: args_from_wire(amounts, inputs),
        }),
        Command::MergeCoins(destination, sources) => C::MergeCoins(model::MergeCoins {
            destination: arg_from_wire(destination, inputs),
            sources: args_from_wire(sources, inputs),
        }),
        Command::Publish(modules, dependencies) => C::Publish(model::Publish {
            modules,
            dependencies,
        }),
        Command::MakeMoveVec(type_tag, elements) => C::MakeMoveVec(model::MakeMoveVec {
            type_tag: type_tag.map(Into::into),
            elements: args_from_wire(elements, inputs),
        }),
        Command::Upgrade(modules, dependencies, package, ticket) => C::Upgrade(model::Upgrade {
            modules,
            dependencies,
            package,
            ticket: arg_from_wire(ticket, inputs),
        }),
    }
}

impl ProgrammableTransaction {
    /// Fails on the first unresolved input or intent.
    pub fn from_model(
        inputs: &[model::CallArg],
        commands: &[model::Command],
    ) -> Result<Self, TxError> {
        let inputs = inputs
            .iter()
            .enumerate()
            .map(|(i, arg)| call_arg_to_wire(i, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let commands = commands
            .iter()
            .map(command_to_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { inputs, commands })
    }

    pub fn into_model(self) -> (Vec<model::CallArg>, Vec<model::Command>) {
        let inputs: Vec<model::CallArg> = self
            .inputs
            .into_iter()
            .map(|arg| match arg {
                CallArg::Pure(bytes) => model::CallArg::Pure { bytes },
                CallArg::Object(obj) => model::CallArg::Object(obj.into()),
            })
            .collect();
        let commands = self
            .commands
            .into_iter()
            .map(|c| command_from_wire(c, &inputs))
            .collect();
        (inputs, commands)
    }
}

impl GasData {
    pub fn from_model(
        payment: &[crate::types::ObjectRef],
        owner: Address,
        price: u64,
        budget: u64,
    ) -> Self {
        Self {
            payment: payment.iter().map(object_ref_to_wire).collect(),
            owner,
            price,
            budget,
        }
    }

    pub fn into_model(self) -> model::GasData {
        model::GasData {
            budget: Some(self.budget),
            price: Some(self.price),
            owner: Some(self.owner),
            payment: Some(self.payment.into_iter().map(object_ref_from_wire).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_tags() {
        assert_eq!(bcs::to_bytes(&Argument::GasCoin).unwrap(), vec![0]);
        assert_eq!(bcs::to_bytes(&Argument::Input(1)).unwrap(), vec![1, 1, 0]);
        assert_eq!(bcs::to_bytes(&Argument::Result(2)).unwrap(), vec![2, 2, 0]);
        assert_eq!(
            bcs::to_bytes(&Argument::NestedResult(1, 3)).unwrap(),
            vec![3, 1, 0, 3, 0]
        );
    }

    #[test]
    fn type_tag_wire_order() {
        assert_eq!(bcs::to_bytes(&TypeTag::U64).unwrap(), vec![2]);
        assert_eq!(bcs::to_bytes(&TypeTag::Address).unwrap(), vec![4]);
        assert_eq!(bcs::to_bytes(&TypeTag::U16).unwrap(), vec![8]);
        assert_eq!(bcs::to_bytes(&TypeTag::U256).unwrap(), vec![10]);
    }

    #[test]
    fn shared_object_layout() {
        let arg = CallArg::Object(ObjectArg::SharedObject {
            id: Address::FRAMEWORK,
            initial_shared_version: 1,
            mutable: true,
        });
        let bytes = bcs::to_bytes(&arg).unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[2..34], Address::FRAMEWORK.inner());
        assert_eq!(&bytes[34..42], &1u64.to_le_bytes());
        assert_eq!(bytes[42], 1);
        assert_eq!(bytes.len(), 43);
    }

    #[test]
    fn object_ref_digest_is_length_prefixed() {
        let r: ObjectRef = (Address::ZERO, 5, Digest([7; 32]));
        let bytes = bcs::to_bytes(&r).unwrap();
        assert_eq!(bytes.len(), 32 + 8 + 1 + 32);
        assert_eq!(bytes[40], 32);
    }

    #[test]
    fn unresolved_inputs_are_rejected() {
        let inputs = vec![
            model::CallArg::pure(vec![1]),
            model::CallArg::UnresolvedPure {
                value: serde_json::json!(5),
            },
        ];
        let err = ProgrammableTransaction::from_model(&inputs, &[]).unwrap_err();
        assert!(matches!(err, TxError::UnresolvedInput(1)));
    }

    #[test]
    fn intent_commands_are_rejected() {
        let command =
            model::Command::intent("CoinWithBalance", Default::default(), Default::default());
        let err = ProgrammableTransaction::from_model(&[], &[command]).unwrap_err();
        assert!(matches!(err, TxError::UnresolvedIntent(name) if name == "CoinWithBalance"));
    }

    #[test]
    fn input_hints_restored_from_inputs() {
        let pt = ProgrammableTransaction {
            inputs: vec![CallArg::Pure(vec![0; 8])],
            commands: vec![Command::SplitCoins(Argument::GasCoin, vec![Argument::Input(0)])],
        };
        let (inputs, commands) = pt.into_model();
        assert_eq!(inputs.len(), 1);
        let model::Command::SplitCoins(split) = &commands[0] else {
            panic!("expected split coins");
        };
        assert!(matches!(
            split.amounts[0],
            model::Argument::Input {
                index: 0,
                kind: Some(model::InputKind::Pure)
            }
        ));
    }
}
