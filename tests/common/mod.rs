//! In-memory `SuiClient` for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use sui_ptb::client::{
    DryRunResult, ExecutionStatus, GasCostSummary, MoveFunctionSignature, ProtocolConfig,
};
use sui_ptb::objects::{CoinRef, ObjectInfo, ObjectLookup, Owner};
use sui_ptb::{Address, Digest, ObjectId, SuiClient, TypeTag};

pub fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

pub fn coin(id: &str, version: u64, balance: u64) -> CoinRef {
    CoinRef {
        object_id: addr(id),
        version,
        digest: Digest([version as u8; 32]),
        balance,
    }
}

pub fn owned(id: &str, version: u64) -> ObjectInfo {
    ObjectInfo {
        object_id: addr(id),
        version,
        digest: Digest([version as u8; 32]),
        owner: Owner::AddressOwner(addr("0xa11ce")),
    }
}

pub fn shared(id: &str, initial_shared_version: u64) -> ObjectInfo {
    ObjectInfo {
        object_id: addr(id),
        version: initial_shared_version + 10,
        digest: Digest([1; 32]),
        owner: Owner::Shared {
            initial_shared_version,
        },
    }
}

fn type_key(coin_type: &str) -> String {
    TypeTag::parse(coin_type)
        .map(|t| t.to_string())
        .unwrap_or_else(|_| coin_type.to_string())
}

#[derive(Default)]
pub struct MockClient {
    pub gas_price: u64,
    pub gas_used: GasCostSummary,
    pub dry_run_error: Option<String>,
    pub protocol: ProtocolConfig,
    pub coins: BTreeMap<(Address, String), Vec<CoinRef>>,
    pub objects: BTreeMap<ObjectId, ObjectInfo>,
    pub functions: BTreeMap<String, MoveFunctionSignature>,
    pub dry_runs: AtomicUsize,
    pub object_fetches: Mutex<Vec<usize>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            gas_price: 1000,
            gas_used: GasCostSummary {
                computation_cost: 1_000_000,
                storage_cost: 2_000_000,
                storage_rebate: 500_000,
            },
            ..Default::default()
        }
    }

    pub fn with_coins(mut self, owner: Address, coin_type: &str, coins: Vec<CoinRef>) -> Self {
        self.coins.insert((owner, type_key(coin_type)), coins);
        self
    }

    pub fn with_object(mut self, info: ObjectInfo) -> Self {
        self.objects.insert(info.object_id, info);
        self
    }

    /// `target` is `package::module::function`, any address form.
    pub fn with_function(mut self, target: &str, signature: MoveFunctionSignature) -> Self {
        let (package, rest) = target.split_once("::").unwrap();
        self.functions
            .insert(format!("{}::{rest}", addr(package)), signature);
        self
    }

    pub fn with_protocol_attribute(mut self, key: &str, value: u64) -> Self {
        self.protocol.attributes.insert(key.to_string(), value);
        self
    }

    pub fn dry_run_count(&self) -> usize {
        self.dry_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SuiClient for MockClient {
    async fn get_coins(&self, owner: Address, coin_type: &str) -> anyhow::Result<Vec<CoinRef>> {
        Ok(self
            .coins
            .get(&(owner, type_key(coin_type)))
            .cloned()
            .unwrap_or_default())
    }

    async fn multi_get_objects(&self, ids: &[ObjectId]) -> anyhow::Result<Vec<ObjectLookup>> {
        self.object_fetches.lock().unwrap().push(ids.len());
        Ok(ids
            .iter()
            .map(|id| match self.objects.get(id) {
                Some(info) => ObjectLookup::Found(info.clone()),
                None => ObjectLookup::Error {
                    object_id: *id,
                    error: "notExists".into(),
                },
            })
            .collect())
    }

    async fn get_reference_gas_price(&self) -> anyhow::Result<u64> {
        Ok(self.gas_price)
    }

    async fn dry_run_transaction(&self, _tx_bytes: &[u8]) -> anyhow::Result<DryRunResult> {
        self.dry_runs.fetch_add(1, Ordering::SeqCst);
        let status = match &self.dry_run_error {
            Some(error) => ExecutionStatus::Failure {
                error: error.clone(),
            },
            None => ExecutionStatus::Success,
        };
        Ok(DryRunResult {
            status,
            gas_used: self.gas_used,
        })
    }

    async fn get_normalized_move_function(
        &self,
        package: ObjectId,
        module: &str,
        function: &str,
    ) -> anyhow::Result<MoveFunctionSignature> {
        let key = format!("{package}::{module}::{function}");
        self.functions
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("function {key} not found"))
    }

    async fn get_protocol_config(&self) -> anyhow::Result<ProtocolConfig> {
        Ok(self.protocol.clone())
    }
}
