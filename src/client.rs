//! Network access needed by the resolution pipeline.
//!
//! The library ships no RPC transport. Callers implement [`SuiClient`] over
//! whatever node API they use; the build steps only see this trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::objects::{CoinRef, ObjectLookup};
use crate::type_tag::{StructTag, TypeTag};
use crate::types::{Address, ObjectId};

#[async_trait]
pub trait SuiClient: Send + Sync {
    /// Coins of `coin_type` owned by `owner`, all pages.
    async fn get_coins(&self, owner: Address, coin_type: &str) -> anyhow::Result<Vec<CoinRef>>;

    /// One entry per requested id, in request order.
    async fn multi_get_objects(&self, ids: &[ObjectId]) -> anyhow::Result<Vec<ObjectLookup>>;

    async fn get_reference_gas_price(&self) -> anyhow::Result<u64>;

    async fn dry_run_transaction(&self, tx_bytes: &[u8]) -> anyhow::Result<DryRunResult>;

    async fn get_normalized_move_function(
        &self,
        package: ObjectId,
        module: &str,
        function: &str,
    ) -> anyhow::Result<MoveFunctionSignature>;

    async fn get_protocol_config(&self) -> anyhow::Result<ProtocolConfig>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasCostSummary {
    pub computation_cost: u64,
    pub storage_cost: u64,
    pub storage_rebate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResult {
    pub status: ExecutionStatus,
    pub gas_used: GasCostSummary,
}

/// Parameter types of an on-chain Move function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFunctionSignature {
    pub parameters: Vec<MoveType>,
}

/// Normalized Move type as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    #[serde(rename_all = "camelCase")]
    Struct {
        address: Address,
        module: String,
        name: String,
        #[serde(default)]
        type_arguments: Vec<MoveType>,
    },
    Vector(Box<MoveType>),
    TypeParameter(u16),
    Reference(Box<MoveType>),
    MutableReference(Box<MoveType>),
}

impl MoveType {
    /// Strips one level of reference.
    pub fn body(&self) -> &MoveType {
        match self {
            Self::Reference(inner) | Self::MutableReference(inner) => inner,
            other => other,
        }
    }

    /// Passed by `&mut` or by value: either way the object is written.
    pub fn is_mutable_use(&self) -> bool {
        !matches!(self, Self::Reference(_))
    }

    pub fn is_struct(&self, address: &Address, module: &str, name: &str) -> bool {
        matches!(
            self,
            Self::Struct { address: a, module: m, name: n, .. }
                if a == address && m == module && n == name
        )
    }

    /// `&TxContext` / `&mut TxContext`, supplied by the runtime.
    pub fn is_tx_context(&self) -> bool {
        self.body()
            .is_struct(&Address::FRAMEWORK, "tx_context", "TxContext")
    }

    /// Concrete type tag after substituting the call's type arguments.
    /// `None` for signers, references and unknown type parameters.
    pub fn to_type_tag(&self, type_args: &[TypeTag]) -> Option<TypeTag> {
        Some(match self {
            Self::Bool => TypeTag::Bool,
            Self::U8 => TypeTag::U8,
            Self::U16 => TypeTag::U16,
            Self::U32 => TypeTag::U32,
            Self::U64 => TypeTag::U64,
            Self::U128 => TypeTag::U128,
            Self::U256 => TypeTag::U256,
            Self::Address => TypeTag::Address,
            Self::Signer | Self::Reference(_) | Self::MutableReference(_) => return None,
            Self::Vector(inner) => TypeTag::Vector(Box::new(inner.to_type_tag(type_args)?)),
            Self::TypeParameter(i) => type_args.get(*i as usize)?.clone(),
            Self::Struct {
                address,
                module,
                name,
                type_arguments,
            } => TypeTag::Struct(Box::new(StructTag {
                address: *address,
                module: module.clone(),
                name: name.clone(),
                type_params: type_arguments
                    .iter()
                    .map(|t| t.to_type_tag(type_args))
                    .collect::<Option<Vec<_>>>()?,
            })),
        })
    }
}

/// Protocol configuration attributes, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub attributes: BTreeMap<String, u64>,
}

impl ProtocolConfig {
    pub fn get(&self, key: &str) -> Option<u64> {
        self.attributes.get(key).copied()
    }
}
