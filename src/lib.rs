//! Programmable transaction builder for Sui.
//!
//! Compose commands over inputs and earlier results, let the build pipeline
//! resolve whatever was left symbolic (object versions, pure value types,
//! gas), and get canonical BCS bytes ready to sign.
//!
//! # Quick start
//!
//! ```no_run
//! use std::str::FromStr;
//! use sui_ptb::{Address, Argument, BuildOptions, Transaction};
//!
//! # async fn run(client: std::sync::Arc<dyn sui_ptb::SuiClient>) -> Result<(), sui_ptb::TxError> {
//! let mut tx = Transaction::new();
//! tx.set_sender(Address::from_str("0xa11ce")?);
//!
//! let coins = tx.split_coins(Argument::GasCoin, [100u64, 200]);
//! tx.transfer_objects([coins.nested(0), coins.nested(1)], Address::from_str("0xb0b")?);
//!
//! let bytes = tx.build(&BuildOptions::new().with_client(client)).await?;
//! println!("{} bytes, digest {}", bytes.len(), tx.get_digest(&BuildOptions::new()).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`api`] -- high-level [`Transaction`] facade
//! - [`data`] -- [`TransactionDataBuilder`], the serializable state
//! - [`model`] -- arguments, inputs, commands, intents
//! - [`codec`] -- BCS wire schema, pure value encoding, digests
//! - [`json`] -- v1/v2 JSON snapshots
//! - [`pipeline`] -- build steps, `next` contract, plugin registry
//! - [`resolve`] -- built-in resolution steps (objects, pure types, gas)
//! - [`intents`] -- `CoinWithBalance`
//! - [`client`] -- [`SuiClient`] seam for chain data
//! - [`signer`] -- [`Signer`] seam and signing digest
//! - [`types`] -- [`Address`], [`Digest`], [`ObjectRef`]

pub mod api;
pub mod client;
pub mod codec;
pub mod data;
pub mod error;
pub mod intents;
pub mod json;
pub mod model;
pub mod objects;
pub mod options;
pub mod pipeline;
pub mod resolve;
pub mod result;
pub mod signer;
pub mod type_tag;
pub mod types;

pub use api::{Amount, BuildState, Recipient, Transaction};
pub use client::SuiClient;
pub use data::TransactionDataBuilder;
pub use error::{CodecError, TxError};
pub use model::{Argument, CallArg, Command, InputKind, ObjectArg, TransactionExpiration};
pub use options::{BuildOptions, LimitOverrides, Limits};
pub use pipeline::{BuildStep, Next};
pub use result::TransactionResult;
pub use signer::{SignedTransaction, Signer};
pub use type_tag::{StructTag, TypeTag};
pub use types::{Address, Digest, ObjectId, ObjectRef};
