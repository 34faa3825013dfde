//! Build configuration and protocol limits.

use std::fmt;
use std::sync::Arc;

use log::debug;
use tokio::sync::OnceCell;

use crate::client::{ProtocolConfig, SuiClient};
use crate::codec::DEFAULT_MAX_TX_SIZE_BYTES;
use crate::error::TxError;

pub const DEFAULT_MAX_PURE_ARGUMENT_SIZE: u64 = 16 * 1024;
pub const DEFAULT_MAX_TX_GAS: u64 = 50_000_000_000;
pub const DEFAULT_MAX_GAS_OBJECTS: u64 = 256;
pub const DEFAULT_MAX_OBJECTS_PER_FETCH: usize = 50;

/// Added to the dry-run computation cost, multiplied by the gas price.
pub const GAS_SAFE_OVERHEAD: u64 = 1000;

/// Effective limits for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_tx_size_bytes: u64,
    pub max_pure_argument_size: u64,
    pub max_tx_gas: u64,
    pub max_gas_objects: u64,
    pub max_objects_per_fetch: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_tx_size_bytes: DEFAULT_MAX_TX_SIZE_BYTES,
            max_pure_argument_size: DEFAULT_MAX_PURE_ARGUMENT_SIZE,
            max_tx_gas: DEFAULT_MAX_TX_GAS,
            max_gas_objects: DEFAULT_MAX_GAS_OBJECTS,
            max_objects_per_fetch: DEFAULT_MAX_OBJECTS_PER_FETCH,
        }
    }
}

impl Limits {
    /// Missing attributes keep their offline defaults.
    pub fn from_protocol_config(config: &ProtocolConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_tx_size_bytes: config
                .get("max_tx_size_bytes")
                .unwrap_or(defaults.max_tx_size_bytes),
            max_pure_argument_size: config
                .get("max_pure_argument_size")
                .unwrap_or(defaults.max_pure_argument_size),
            max_tx_gas: config.get("max_tx_gas").unwrap_or(defaults.max_tx_gas),
            max_gas_objects: config
                .get("max_gas_payment_objects")
                .unwrap_or(defaults.max_gas_objects),
            max_objects_per_fetch: defaults.max_objects_per_fetch,
        }
    }

    pub fn with_overrides(self, overrides: &LimitOverrides) -> Self {
        Self {
            max_tx_size_bytes: overrides.max_tx_size_bytes.unwrap_or(self.max_tx_size_bytes),
            max_pure_argument_size: overrides
                .max_pure_argument_size
                .unwrap_or(self.max_pure_argument_size),
            max_tx_gas: overrides.max_tx_gas.unwrap_or(self.max_tx_gas),
            max_gas_objects: overrides.max_gas_objects.unwrap_or(self.max_gas_objects),
            max_objects_per_fetch: overrides
                .max_objects_per_fetch
                .unwrap_or(self.max_objects_per_fetch)
                .max(1),
        }
    }
}

/// Caller-supplied limits; they win over protocol config and defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitOverrides {
    pub max_tx_size_bytes: Option<u64>,
    pub max_pure_argument_size: Option<u64>,
    pub max_tx_gas: Option<u64>,
    pub max_gas_objects: Option<u64>,
    pub max_objects_per_fetch: Option<usize>,
}

/// Options for [`crate::Transaction::build`] and the resolution pipeline.
#[derive(Clone, Default)]
pub struct BuildOptions {
    pub client: Option<Arc<dyn SuiClient>>,
    pub only_transaction_kind: bool,
    /// Intents the consumer of the output understands; left unresolved.
    pub supported_intents: Vec<String>,
    pub limits: LimitOverrides,
    resolved_limits: OnceCell<Limits>,
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("client", &self.client.as_ref().map(|_| "SuiClient"))
            .field("only_transaction_kind", &self.only_transaction_kind)
            .field("supported_intents", &self.supported_intents)
            .field("limits", &self.limits)
            .finish()
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: Arc<dyn SuiClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn only_transaction_kind(mut self) -> Self {
        self.only_transaction_kind = true;
        self
    }

    pub fn with_supported_intent(mut self, name: impl Into<String>) -> Self {
        self.supported_intents.push(name.into());
        self
    }

    pub fn with_limits(mut self, limits: LimitOverrides) -> Self {
        self.limits = limits;
        self.resolved_limits = OnceCell::new();
        self
    }

    pub fn supports_intent(&self, name: &str) -> bool {
        self.supported_intents.iter().any(|s| s == name)
    }

    /// The configured client, or a `MissingClient` error naming `needed_for`.
    pub fn client(&self, needed_for: &'static str) -> Result<&Arc<dyn SuiClient>, TxError> {
        self.client.as_ref().ok_or(TxError::MissingClient(needed_for))
    }

    /// Limits for this build: overrides, then protocol config (fetched once
    /// when a client is set), then offline defaults.
    pub async fn limits(&self) -> Result<Limits, TxError> {
        self.resolved_limits
            .get_or_try_init(|| async {
                let base = match &self.client {
                    Some(client) => {
                        let config = client
                            .get_protocol_config()
                            .await
                            .map_err(TxError::Client)?;
                        Limits::from_protocol_config(&config)
                    }
                    None => Limits::default(),
                };
                let limits = base.with_overrides(&self.limits);
                debug!("build limits: {limits:?}");
                Ok::<_, TxError>(limits)
            })
            .await
            .copied()
    }
}
