//! Core types: addresses, object digests, object references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, TxError};

pub const ADDRESS_LENGTH: usize = 32;

/// 32-byte account or object address.
///
/// Parsed from hex with an optional `0x` prefix; short forms are
/// left-padded with zeros (`0x2` is the framework package). Always
/// displayed as `0x` followed by 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

/// Object ids share the address representation.
pub type ObjectId = Address;

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// `0x1`, the Move standard library.
    pub const STD: Self = Self::from_low_byte(1);

    /// `0x2`, the Sui framework.
    pub const FRAMEWORK: Self = Self::from_low_byte(2);

    const fn from_low_byte(b: u8) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 1] = b;
        Self(bytes)
    }

    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn inner(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex_literal(&self) -> String {
        self.to_string()
    }
}

/// Normalize a hex address string to its canonical `0x`-prefixed 64-char form.
pub fn normalize_address(s: &str) -> Result<String, TxError> {
    Ok(Address::from_str(s)?.to_string())
}

impl FromStr for Address {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_str = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_str.is_empty() {
            return Err(TxError::InvalidAddress(s.into(), "empty".into()));
        }
        if hex_str.len() > ADDRESS_LENGTH * 2 {
            return Err(TxError::InvalidAddress(
                s.into(),
                format!("longer than {} hex characters", ADDRESS_LENGTH * 2),
            ));
        }

        let padded = format!("{:0>64}", hex_str.to_ascii_lowercase());
        let bytes =
            hex::decode(&padded).map_err(|e| TxError::InvalidAddress(s.into(), e.to_string()))?;

        let mut addr = [0u8; ADDRESS_LENGTH];
        addr.copy_from_slice(&bytes);
        Ok(Self(addr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}

/// 32-byte object (or transaction) digest, base58 in text form.
///
/// On the wire the digest is a length-prefixed byte vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn inner(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CodecError::DigestLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl FromStr for Digest {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec()?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Digest::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            Digest::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

/// Reference to a specific version of an owned or receivable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: ObjectId,
    #[serde(with = "crate::json::u64_string")]
    pub version: u64,
    pub digest: Digest,
}

impl ObjectRef {
    pub fn new(object_id: ObjectId, version: u64, digest: Digest) -> Self {
        Self {
            object_id,
            version,
            digest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_is_zero_padded() {
        let addr: Address = "0x2".parse().unwrap();
        assert_eq!(addr, Address::FRAMEWORK);
        assert_eq!(
            addr.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn address_without_prefix_and_uppercase() {
        let addr: Address = "ABC".parse().unwrap();
        assert_eq!(addr.0[30], 0x0a);
        assert_eq!(addr.0[31], 0xbc);
        assert!(addr.to_string().ends_with("0abc"));
    }

    #[test]
    fn address_too_long_rejected() {
        let long = format!("0x{}", "1".repeat(65));
        assert!(matches!(
            long.parse::<Address>(),
            Err(TxError::InvalidAddress(..))
        ));
    }

    #[test]
    fn address_invalid_hex_rejected() {
        assert!("0xzz".parse::<Address>().is_err());
        assert!("0x".parse::<Address>().is_err());
    }

    #[test]
    fn normalize_lowercases() {
        let n = normalize_address("0xABCDEF").unwrap();
        assert!(n.starts_with("0x0000"));
        assert!(n.ends_with("abcdef"));
        assert_eq!(n.len(), 66);
    }

    #[test]
    fn address_bcs_is_fixed_width() {
        let bytes = bcs::to_bytes(&Address::FRAMEWORK).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 2);
    }

    #[test]
    fn address_json_is_hex_string() {
        let json = serde_json::to_string(&Address::STD).unwrap();
        assert_eq!(
            json,
            "\"0x0000000000000000000000000000000000000000000000000000000000000001\""
        );
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::STD);
    }

    #[test]
    fn digest_bcs_is_length_prefixed() {
        let digest = Digest([7u8; 32]);
        let bytes = bcs::to_bytes(&digest).unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], 32);
        assert_eq!(bcs::from_bytes::<Digest>(&bytes).unwrap(), digest);
    }

    #[test]
    fn digest_base58_text() {
        let digest = Digest([1u8; 32]);
        let text = digest.to_string();
        assert_eq!(text.parse::<Digest>().unwrap(), digest);
    }

    #[test]
    fn digest_wrong_length_rejected() {
        let text = bs58::encode([1u8; 31]).into_string();
        assert!(matches!(
            text.parse::<Digest>(),
            Err(CodecError::DigestLength(31))
        ));
    }

    #[test]
    fn object_ref_json_shape() {
        let r = ObjectRef::new(Address::FRAMEWORK, 42, Digest([0u8; 32]));
        let value = serde_json::to_value(r).unwrap();
        assert_eq!(value["version"], "42");
        assert!(value["objectId"].as_str().unwrap().ends_with("02"));
    }
}
