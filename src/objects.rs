//! Object metadata returned by the network client.
//!
//! These are the narrow views the resolution pipeline needs: who owns an
//! object, its current reference, and the balance of coin objects.

use serde::{Deserialize, Serialize};

use crate::model::ObjectArg;
use crate::types::{Address, Digest, ObjectId, ObjectRef};

/// `0x2::sui::SUI`, the coin type accepted for gas payment.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    AddressOwner(Address),
    ObjectOwner(Address),
    Shared { initial_shared_version: u64 },
    Immutable,
}

/// Current state of an object as reported by `multi_get_objects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: Digest,
    pub owner: Owner,
}

impl ObjectInfo {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.object_id, self.version, self.digest)
    }

    /// Turn the fetched object into a concrete input.
    ///
    /// Shared objects keep the caller's mutability; everything else is
    /// passed by reference, either owned/immutable or as a receiving ticket.
    pub fn to_object_arg(&self, mutable: bool, receiving: bool) -> ObjectArg {
        match self.owner {
            Owner::Shared {
                initial_shared_version,
            } => ObjectArg::SharedObject {
                object_id: self.object_id,
                initial_shared_version,
                mutable,
            },
            Owner::AddressOwner(_) | Owner::ObjectOwner(_) | Owner::Immutable => {
                if receiving {
                    ObjectArg::Receiving(self.object_ref())
                } else {
                    ObjectArg::ImmOrOwnedObject(self.object_ref())
                }
            }
        }
    }
}

/// One slot of a `multi_get_objects` response: the object, or the reason
/// it could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectLookup {
    Found(ObjectInfo),
    Error { object_id: ObjectId, error: String },
}

/// Reference to a coin object together with its balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: Digest,
    pub balance: u64,
}

impl CoinRef {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.object_id, self.version, self.digest)
    }
}
