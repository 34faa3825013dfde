//! Transaction vocabulary: arguments, inputs and commands.
//!
//! The JSON form of these types is the v2 serialized transaction schema.
//! The wire (BCS) form lives in [`crate::codec::schema`].

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TxError;
use crate::type_tag::TypeTag;
use crate::types::{Address, Digest, ObjectId, ObjectRef};

/// Advisory hint on an [`Argument::Input`] telling how the input is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pure,
    Object,
}

/// Where a command operand comes from.
///
/// The `kind` of an input is a hint only: two inputs with the same index are
/// equal whatever their hints say.
#[derive(Debug, Clone, Copy)]
pub enum Argument {
    /// The gas coin of the transaction.
    GasCoin,
    /// Position in the input list.
    Input { index: u16, kind: Option<InputKind> },
    /// Whole result of an earlier command.
    Result(u16),
    /// One value of an earlier command's multi-value result.
    NestedResult(u16, u16),
}

impl Argument {
    pub fn input(index: u16) -> Self {
        Self::Input { index, kind: None }
    }

    pub fn pure_input(index: u16) -> Self {
        Self::Input {
            index,
            kind: Some(InputKind::Pure),
        }
    }

    pub fn object_input(index: u16) -> Self {
        Self::Input {
            index,
            kind: Some(InputKind::Object),
        }
    }

    pub fn input_index(&self) -> Option<u16> {
        match self {
            Self::Input { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Command index this argument reads from, if it is a result.
    pub fn result_index(&self) -> Option<u16> {
        match self {
            Self::Result(i) | Self::NestedResult(i, _) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::GasCoin, Self::GasCoin) => true,
            (Self::Input { index: a, .. }, Self::Input { index: b, .. }) => a == b,
            (Self::Result(a), Self::Result(b)) => a == b,
            (Self::NestedResult(a, x), Self::NestedResult(b, y)) => a == b && x == y,
            _ => false,
        }
    }
}

impl Eq for Argument {}

impl Hash for Argument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::GasCoin => {}
            Self::Input { index, .. } | Self::Result(index) => index.hash(state),
            Self::NestedResult(index, sub) => {
                index.hash(state);
                sub.hash(state);
            }
        }
    }
}

impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        match self {
            Self::GasCoin => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("GasCoin", &true)?;
                map.end()
            }
            Self::Input { index, kind } => {
                let mut map = serializer.serialize_map(Some(1 + kind.is_some() as usize))?;
                map.serialize_entry("Input", index)?;
                if let Some(kind) = kind {
                    map.serialize_entry("type", kind)?;
                }
                map.end()
            }
            Self::Result(index) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Result", index)?;
                map.end()
            }
            Self::NestedResult(index, sub) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("NestedResult", &(index, sub))?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
struct RawArgument {
    #[serde(rename = "GasCoin")]
    gas_coin: Option<bool>,
    #[serde(rename = "Input")]
    input: Option<u16>,
    #[serde(rename = "type")]
    kind: Option<InputKind>,
    #[serde(rename = "Result")]
    result: Option<u16>,
    #[serde(rename = "NestedResult")]
    nested_result: Option<(u16, u16)>,
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawArgument::deserialize(deserializer)?;
        match (raw.gas_coin, raw.input, raw.result, raw.nested_result) {
            (Some(true), None, None, None) => Ok(Self::GasCoin),
            (None, Some(index), None, None) => Ok(Self::Input {
                index,
                kind: raw.kind,
            }),
            (None, None, Some(index), None) => Ok(Self::Result(index)),
            (None, None, None, Some((index, sub))) => Ok(Self::NestedResult(index, sub)),
            _ => Err(serde::de::Error::custom(
                "argument must have exactly one of GasCoin, Input, Result, NestedResult",
            )),
        }
    }
}

/// A concrete object input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    #[serde(rename_all = "camelCase")]
    SharedObject {
        object_id: ObjectId,
        #[serde(with = "crate::json::u64_string")]
        initial_shared_version: u64,
        mutable: bool,
    },
    Receiving(ObjectRef),
}

impl ObjectArg {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::ImmOrOwnedObject(r) | Self::Receiving(r) => r.object_id,
            Self::SharedObject { object_id, .. } => *object_id,
        }
    }
}

/// An object input whose version, digest or ownership is not known yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedObject {
    pub object_id: ObjectId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::json::option_u64_string"
    )]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::json::option_u64_string"
    )]
    pub initial_shared_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiving: Option<bool>,
}

impl UnresolvedObject {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            ..Default::default()
        }
    }

    /// True when only the id is known, which is all v1 can carry.
    pub fn is_bare(&self) -> bool {
        self.version.is_none()
            && self.digest.is_none()
            && self.initial_shared_version.is_none()
            && self.mutable.is_none()
            && self.receiving.is_none()
    }
}

/// A value supplied to the transaction before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallArg {
    Object(ObjectArg),
    Pure {
        #[serde(with = "crate::json::base64_bytes")]
        bytes: Vec<u8>,
    },
    UnresolvedPure {
        value: serde_json::Value,
    },
    UnresolvedObject(UnresolvedObject),
}

impl CallArg {
    pub fn pure(bytes: Vec<u8>) -> Self {
        Self::Pure { bytes }
    }

    /// Id of the object this input refers to, resolved or not.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Object(arg) => Some(arg.object_id()),
            Self::UnresolvedObject(obj) => Some(obj.object_id),
            Self::Pure { .. } | Self::UnresolvedPure { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Pure { .. })
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Pure { .. } | Self::UnresolvedPure { .. } => InputKind::Pure,
            Self::Object(_) | Self::UnresolvedObject(_) => InputKind::Object,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferObjects {
    pub objects: Vec<Argument>,
    pub address: Argument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCoins {
    pub coin: Argument,
    pub amounts: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCoins {
    pub destination: Argument,
    pub sources: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publish {
    #[serde(with = "crate::json::base64_vec")]
    pub modules: Vec<Vec<u8>>,
    pub dependencies: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeMoveVec {
    #[serde(rename = "type")]
    pub type_tag: Option<TypeTag>,
    pub elements: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    #[serde(with = "crate::json::base64_vec")]
    pub modules: Vec<Vec<u8>>,
    pub dependencies: Vec<ObjectId>,
    pub package: ObjectId,
    pub ticket: Argument,
}

/// Argument slot of an intent: a single argument or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntentArgument {
    One(Argument),
    Many(Vec<Argument>),
}

/// Named placeholder command expanded by a registered resolver before
/// serialization. Never encoded on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, IntentArgument>,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(MoveCall),
    TransferObjects(TransferObjects),
    SplitCoins(SplitCoins),
    MergeCoins(MergeCoins),
    Publish(Publish),
    MakeMoveVec(MakeMoveVec),
    Upgrade(Upgrade),
    #[serde(rename = "$Intent")]
    Intent(Intent),
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Command {
    /// `target` must be `package::module::function`.
    pub fn move_call(
        target: &str,
        type_arguments: &[&str],
        arguments: Vec<Argument>,
    ) -> Result<Self, TxError> {
        let parts: Vec<&str> = target.split("::").collect();
        let &[package, module, function] = parts.as_slice() else {
            return Err(TxError::InvalidTarget(target.into()));
        };
        if !is_identifier(module) || !is_identifier(function) {
            return Err(TxError::InvalidTarget(target.into()));
        }
        let package =
            Address::from_str(package).map_err(|_| TxError::InvalidTarget(target.into()))?;
        let type_arguments = type_arguments
            .iter()
            .map(|t| TypeTag::parse(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::MoveCall(MoveCall {
            package,
            module: module.to_string(),
            function: function.to_string(),
            type_arguments,
            arguments,
        }))
    }

    pub fn transfer_objects(objects: Vec<Argument>, address: Argument) -> Self {
        Self::TransferObjects(TransferObjects { objects, address })
    }

    pub fn split_coins(coin: Argument, amounts: Vec<Argument>) -> Self {
        Self::SplitCoins(SplitCoins { coin, amounts })
    }

    pub fn merge_coins(destination: Argument, sources: Vec<Argument>) -> Self {
        Self::MergeCoins(MergeCoins {
            destination,
            sources,
        })
    }

    pub fn publish(modules: Vec<Vec<u8>>, dependencies: Vec<ObjectId>) -> Self {
        Self::Publish(Publish {
            modules,
            dependencies,
        })
    }

    pub fn upgrade(
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        package: ObjectId,
        ticket: Argument,
    ) -> Self {
        Self::Upgrade(Upgrade {
            modules,
            dependencies,
            package,
            ticket,
        })
    }

    /// An element type is required when the vector is empty or holds pure values.
    pub fn make_move_vec(type_tag: Option<&str>, elements: Vec<Argument>) -> Result<Self, TxError> {
        let type_tag = type_tag.map(TypeTag::parse).transpose()?;
        Ok(Self::MakeMoveVec(MakeMoveVec { type_tag, elements }))
    }

    pub fn intent(
        name: impl Into<String>,
        inputs: BTreeMap<String, IntentArgument>,
        data: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self::Intent(Intent {
            name: name.into(),
            inputs,
            data,
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MoveCall(_) => "MoveCall",
            Self::TransferObjects(_) => "TransferObjects",
            Self::SplitCoins(_) => "SplitCoins",
            Self::MergeCoins(_) => "MergeCoins",
            Self::Publish(_) => "Publish",
            Self::MakeMoveVec(_) => "MakeMoveVec",
            Self::Upgrade(_) => "Upgrade",
            Self::Intent(_) => "$Intent",
        }
    }

    /// Every argument embedded in the command, in declaration order.
    pub fn arguments(&self) -> Vec<&Argument> {
        match self {
            Self::MoveCall(call) => call.arguments.iter().collect(),
            Self::TransferObjects(t) => t.objects.iter().chain(Some(&t.address)).collect(),
            Self::SplitCoins(s) => Some(&s.coin).into_iter().chain(&s.amounts).collect(),
            Self::MergeCoins(m) => Some(&m.destination).into_iter().chain(&m.sources).collect(),
            Self::Publish(_) => Vec::new(),
            Self::MakeMoveVec(v) => v.elements.iter().collect(),
            Self::Upgrade(u) => vec![&u.ticket],
            Self::Intent(intent) => intent
                .inputs
                .values()
                .flat_map(|slot| match slot {
                    IntentArgument::One(arg) => std::slice::from_ref(arg).iter(),
                    IntentArgument::Many(args) => args.iter(),
                })
                .collect(),
        }
    }

    pub fn arguments_mut(&mut self) -> Vec<&mut Argument> {
        match self {
            Self::MoveCall(call) => call.arguments.iter_mut().collect(),
            Self::TransferObjects(t) => t
                .objects
                .iter_mut()
                .chain(Some(&mut t.address))
                .collect(),
            Self::SplitCoins(s) => Some(&mut s.coin)
                .into_iter()
                .chain(s.amounts.iter_mut())
                .collect(),
            Self::MergeCoins(m) => Some(&mut m.destination)
                .into_iter()
                .chain(m.sources.iter_mut())
                .collect(),
            Self::Publish(_) => Vec::new(),
            Self::MakeMoveVec(v) => v.elements.iter_mut().collect(),
            Self::Upgrade(u) => vec![&mut u.ticket],
            Self::Intent(intent) => intent
                .inputs
                .values_mut()
                .flat_map(|slot| match slot {
                    IntentArgument::One(arg) => std::slice::from_mut(arg).iter_mut(),
                    IntentArgument::Many(args) => args.iter_mut(),
                })
                .collect(),
        }
    }
}

/// When the transaction stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ExpirationRepr", into = "ExpirationRepr")]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

#[derive(Clone, Serialize, Deserialize)]
enum ExpirationRepr {
    None(bool),
    Epoch(#[serde(with = "crate::json::u64_string")] u64),
}

impl From<ExpirationRepr> for TransactionExpiration {
    fn from(repr: ExpirationRepr) -> Self {
        match repr {
            ExpirationRepr::None(_) => Self::None,
            ExpirationRepr::Epoch(epoch) => Self::Epoch(epoch),
        }
    }
}

impl From<TransactionExpiration> for ExpirationRepr {
    fn from(exp: TransactionExpiration) -> Self {
        match exp {
            TransactionExpiration::None => Self::None(true),
            TransactionExpiration::Epoch(epoch) => Self::Epoch(epoch),
        }
    }
}

/// Gas configuration; every field stays `None` until set or resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasData {
    #[serde(default, with = "crate::json::option_u64_string")]
    pub budget: Option<u64>,
    #[serde(default, with = "crate::json::option_u64_string")]
    pub price: Option<u64>,
    #[serde(default)]
    pub owner: Option<Address>,
    #[serde(default)]
    pub payment: Option<Vec<ObjectRef>>,
}
