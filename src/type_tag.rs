//! Move type tags (`u64`, `vector<u8>`, `0x2::coin::Coin<0x2::sui::SUI>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TxError;
use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl StructTag {
    /// `0x2::sui::SUI`
    pub fn sui() -> Self {
        Self {
            address: Address::FRAMEWORK,
            module: "sui".into(),
            name: "SUI".into(),
            type_params: Vec::new(),
        }
    }

    pub fn is(&self, address: &Address, module: &str, name: &str) -> bool {
        &self.address == address && self.module == module && self.name == name
    }
}

impl TypeTag {
    pub fn parse(s: &str) -> Result<Self, TxError> {
        let mut parser = Parser { src: s, pos: 0 };
        let tag = parser.type_tag()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(tag)
    }
}

impl FromStr for TypeTag {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for StructTag {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match TypeTag::parse(s)? {
            TypeTag::Struct(tag) => Ok(*tag),
            _ => Err(TxError::InvalidTypeTag(s.into(), "not a struct type".into())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::U128 => write!(f, "u128"),
            Self::U256 => write!(f, "u256"),
            Self::Address => write!(f, "address"),
            Self::Signer => write!(f, "signer"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
            Self::Struct(tag) => write!(f, "{tag}"),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            write!(f, "<")?;
            for (i, param) in self.type_params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TypeTag::parse(&s).map_err(serde::de::Error::custom)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> TxError {
        TxError::InvalidTypeTag(self.src.into(), format!("{reason} at offset {}", self.pos))
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'a str, TxError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn type_tag(&mut self) -> Result<TypeTag, TxError> {
        let word = self.ident()?;
        let tag = match word {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                if !self.eat("<") {
                    return Err(self.error("expected `<` after vector"));
                }
                let inner = self.type_tag()?;
                if !self.eat(">") {
                    return Err(self.error("expected `>`"));
                }
                TypeTag::Vector(Box::new(inner))
            }
            address => {
                let address = Address::from_str(address)
                    .map_err(|_| self.error("expected primitive type or address"))?;
                TypeTag::Struct(Box::new(self.struct_tail(address)?))
            }
        };
        Ok(tag)
    }

    fn struct_tail(&mut self, address: Address) -> Result<StructTag, TxError> {
        if !self.eat("::") {
            return Err(self.error("expected `::`"));
        }
        let module = self.ident()?.to_string();
        if !self.eat("::") {
            return Err(self.error("expected `::`"));
        }
        let name = self.ident()?.to_string();

        let mut type_params = Vec::new();
        if self.eat("<") {
            loop {
                type_params.push(self.type_tag()?);
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(self.error("expected `,` or `>`"));
            }
        }

        Ok(StructTag {
            address,
            module,
            name,
            type_params,
        })
    }
}
