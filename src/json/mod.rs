//! JSON transport format for builder state.
//!
//! Two schema versions describe the same state. Version 2 is the native
//! shape of [`crate::model`]; version 1 is the legacy layout handled in
//! [`v1`]. [`restore`] accepts either.

pub mod v1;

use serde::{Deserialize, Serialize};

use crate::data::TransactionDataBuilder;
use crate::error::{CodecError, TxError};
use crate::model::{CallArg, Command, GasData, TransactionExpiration};
use crate::types::Address;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializedV2 {
    version: u64,
    sender: Option<Address>,
    expiration: Option<TransactionExpiration>,
    gas_data: GasData,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

/// Serialize builder state as v2 JSON.
pub fn to_v2_string(data: &TransactionDataBuilder) -> Result<String, TxError> {
    let serialized = SerializedV2 {
        version: 2,
        sender: data.sender,
        expiration: data.expiration,
        gas_data: data.gas_data.clone(),
        inputs: data.inputs.clone(),
        commands: data.commands.clone(),
        digest: None,
    };
    Ok(serde_json::to_string(&serialized)?)
}

/// Parse v1 or v2 JSON into builder state, migrating v1 on the way in.
pub fn restore(json: &str) -> Result<TransactionDataBuilder, TxError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    restore_value(value)
}

pub fn restore_value(value: serde_json::Value) -> Result<TransactionDataBuilder, TxError> {
    let version = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    match version {
        1 => {
            let v1: v1::SerializedV1 = serde_json::from_value(value)?;
            v1::into_builder(v1)
        }
        2 => {
            let v2: SerializedV2 = serde_json::from_value(value)?;
            Ok(TransactionDataBuilder {
                sender: v2.sender,
                expiration: v2.expiration,
                gas_data: v2.gas_data,
                inputs: v2.inputs,
                commands: v2.commands,
            })
        }
        other => Err(CodecError::UnsupportedVersion(other).into()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

impl StringOrNumber {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s.parse().map_err(E::custom),
        }
    }
}

/// `u64` written as a decimal string, read from a string or a number.
pub(crate) mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        StringOrNumber::deserialize(deserializer)?.into_u64()
    }
}

pub(crate) mod option_u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<StringOrNumber>::deserialize(deserializer)?
            .map(StringOrNumber::into_u64)
            .transpose()
    }
}

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_vec {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&STANDARD.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
