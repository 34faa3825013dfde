//! BCS encoding of untyped pure values once their Move type is known.
//!
//! Values arrive as JSON: booleans, numbers or decimal strings for
//! integers, hex strings for addresses, arrays for vectors and `null` for an
//! empty `Option`.

use std::io;

use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::Value;

use crate::error::CodecError;
use crate::type_tag::TypeTag;
use crate::types::Address;

/// Move types that can be passed as pure inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PureType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    /// `0x1::string::String`, `0x1::ascii::String`
    String,
    Vector(Box<PureType>),
    Option(Box<PureType>),
}

impl PureType {
    /// `None` for types that must be supplied as objects.
    pub fn from_type_tag(tag: &TypeTag) -> Option<Self> {
        Some(match tag {
            TypeTag::Bool => Self::Bool,
            TypeTag::U8 => Self::U8,
            TypeTag::U16 => Self::U16,
            TypeTag::U32 => Self::U32,
            TypeTag::U64 => Self::U64,
            TypeTag::U128 => Self::U128,
            TypeTag::U256 => Self::U256,
            TypeTag::Address => Self::Address,
            TypeTag::Signer => return None,
            TypeTag::Vector(inner) => Self::Vector(Box::new(Self::from_type_tag(inner)?)),
            TypeTag::Struct(s) => {
                if s.is(&Address::STD, "string", "String") || s.is(&Address::STD, "ascii", "String")
                {
                    Self::String
                } else if s.is(&Address::FRAMEWORK, "object", "ID") {
                    Self::Address
                } else if s.is(&Address::STD, "option", "Option") && s.type_params.len() == 1 {
                    Self::Option(Box::new(Self::from_type_tag(&s.type_params[0])?))
                } else {
                    return None;
                }
            }
        })
    }
}

/// Encode `value` as a BCS value of type `ty`.
pub fn encode(value: &Value, ty: &PureType) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, ty)?;
    Ok(buf)
}

fn io_error(e: io::Error) -> CodecError {
    CodecError::PureValue(e.to_string())
}

fn invalid(value: &Value, ty: &PureType) -> CodecError {
    CodecError::PureValue(format!("{value} is not a valid {ty:?}"))
}

fn write_value(buf: &mut Vec<u8>, value: &Value, ty: &PureType) -> Result<(), CodecError> {
    match ty {
        PureType::Bool => {
            let b = value.as_bool().ok_or_else(|| invalid(value, ty))?;
            buf.write_u8(b as u8).map_err(io_error)?;
        }
        PureType::U8 => {
            let v = u8::try_from(integer(value, ty)?).map_err(|_| invalid(value, ty))?;
            buf.write_u8(v).map_err(io_error)?;
        }
        PureType::U16 => {
            let v = u16::try_from(integer(value, ty)?).map_err(|_| invalid(value, ty))?;
            buf.write_u16::<LittleEndian>(v).map_err(io_error)?;
        }
        PureType::U32 => {
            let v = u32::try_from(integer(value, ty)?).map_err(|_| invalid(value, ty))?;
            buf.write_u32::<LittleEndian>(v).map_err(io_error)?;
        }
        PureType::U64 => {
            let v = u64::try_from(integer(value, ty)?).map_err(|_| invalid(value, ty))?;
            buf.write_u64::<LittleEndian>(v).map_err(io_error)?;
        }
        PureType::U128 => {
            buf.write_u128::<LittleEndian>(integer(value, ty)?)
                .map_err(io_error)?;
        }
        PureType::U256 => {
            let digits = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) if n.is_u64() => n.to_string(),
                _ => return Err(invalid(value, ty)),
            };
            buf.extend_from_slice(&parse_u256(&digits)?);
        }
        PureType::Address => {
            let s = value.as_str().ok_or_else(|| invalid(value, ty))?;
            let address: Address = s
                .parse()
                .map_err(|e: crate::error::TxError| CodecError::PureValue(e.to_string()))?;
            buf.extend_from_slice(address.inner());
        }
        PureType::String => {
            let s = value.as_str().ok_or_else(|| invalid(value, ty))?;
            write_uleb128(buf, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        PureType::Vector(inner) => {
            let items = value.as_array().ok_or_else(|| invalid(value, ty))?;
            write_uleb128(buf, items.len() as u64);
            for item in items {
                write_value(buf, item, inner)?;
            }
        }
        PureType::Option(inner) => {
            if value.is_null() {
                buf.write_u8(0).map_err(io_error)?;
            } else {
                buf.write_u8(1).map_err(io_error)?;
                write_value(buf, value, inner)?;
            }
        }
    }
    Ok(())
}

/// Integers up to `u128` from a JSON number or a decimal string.
fn integer(value: &Value, ty: &PureType) -> Result<u128, CodecError> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from).ok_or_else(|| invalid(value, ty)),
        Value::String(s) => s.parse::<u128>().map_err(|_| invalid(value, ty)),
        _ => Err(invalid(value, ty)),
    }
}

/// Decimal string to a little-endian 256-bit integer.
fn parse_u256(digits: &str) -> Result<[u8; 32], CodecError> {
    if digits.is_empty() {
        return Err(CodecError::PureValue("empty u256".into()));
    }
    let mut out = [0u8; 32];
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| CodecError::PureValue(format!("invalid u256 `{digits}`")))?;
        let mut carry = digit;
        for byte in out.iter_mut() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return Err(CodecError::PureValue(format!("u256 overflow `{digits}`")));
        }
    }
    Ok(out)
}

pub(crate) fn write_uleb128(buf: &mut Vec<u8>, mut val: u64) {
    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if val == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uleb128_encoding() {
        let mut buf = Vec::new();
        write_uleb128(&mut buf, 0);
        assert_eq!(buf, [0x00]);

        buf.clear();
        write_uleb128(&mut buf, 127);
        assert_eq!(buf, [0x7F]);

        buf.clear();
        write_uleb128(&mut buf, 300);
        assert_eq!(buf, [0xAC, 0x02]);
    }

    #[test]
    fn integers_match_bcs() {
        assert_eq!(
            encode(&json!(1000), &PureType::U64).unwrap(),
            bcs::to_bytes(&1000u64).unwrap()
        );
        assert_eq!(
            encode(&json!("340282366920938463463374607431768211455"), &PureType::U128).unwrap(),
            bcs::to_bytes(&u128::MAX).unwrap()
        );
        assert!(encode(&json!(256), &PureType::U8).is_err());
        assert!(encode(&json!(-1), &PureType::U64).is_err());
    }

    #[test]
    fn u256_from_decimal() {
        let bytes = encode(&json!("256"), &PureType::U256).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..2], &[0, 1]);
        assert!(bytes[2..].iter().all(|b| *b == 0));

        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(encode(&json!(max), &PureType::U256).unwrap(), vec![0xff; 32]);
        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(encode(&json!(over), &PureType::U256).is_err());
    }

    #[test]
    fn strings_vectors_options() {
        assert_eq!(
            encode(&json!("hi"), &PureType::String).unwrap(),
            bcs::to_bytes("hi").unwrap()
        );
        let ty = PureType::Vector(Box::new(PureType::U16));
        assert_eq!(
            encode(&json!([1, 2]), &ty).unwrap(),
            bcs::to_bytes(&vec![1u16, 2]).unwrap()
        );
        let ty = PureType::Option(Box::new(PureType::Bool));
        assert_eq!(encode(&json!(null), &ty).unwrap(), vec![0]);
        assert_eq!(encode(&json!(true), &ty).unwrap(), vec![1, 1]);
    }

    #[test]
    fn address_is_padded() {
        let bytes = encode(&json!("0x2"), &PureType::Address).unwrap();
        assert_eq!(bytes, Address::FRAMEWORK.inner().to_vec());
    }

    #[test]
    fn pure_types_from_tags() {
        let tag = TypeTag::parse("0x1::option::Option<0x1::string::String>").unwrap();
        assert_eq!(
            PureType::from_type_tag(&tag),
            Some(PureType::Option(Box::new(PureType::String)))
        );
        let id = TypeTag::parse("0x2::object::ID").unwrap();
        assert_eq!(PureType::from_type_tag(&id), Some(PureType::Address));
        let coin = TypeTag::parse("0x2::coin::Coin<0x2::sui::SUI>").unwrap();
        assert_eq!(PureType::from_type_tag(&coin), None);
        let nested = TypeTag::parse("vector<0x2::coin::Coin<0x2::sui::SUI>>").unwrap();
        assert_eq!(PureType::from_type_tag(&nested), None);
    }
}
