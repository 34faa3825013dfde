//! Fetch object metadata for unresolved object inputs.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;

use crate::data::TransactionDataBuilder;
use crate::error::TxError;
use crate::model::{CallArg, Command, ObjectArg, UnresolvedObject};
use crate::objects::{ObjectInfo, ObjectLookup};
use crate::options::BuildOptions;
use crate::pipeline::{BuildStep, Next};
use crate::types::{ObjectId, ObjectRef};

pub struct ResolveObjects;

/// Inputs that carry enough detail to skip the lookup.
fn resolve_locally(obj: &UnresolvedObject, used_mutably: bool) -> Option<ObjectArg> {
    if let Some(initial_shared_version) = obj.initial_shared_version {
        return Some(ObjectArg::SharedObject {
            object_id: obj.object_id,
            initial_shared_version,
            mutable: obj.mutable.unwrap_or(false) || used_mutably,
        });
    }
    let (version, digest) = (obj.version?, obj.digest?);
    let object_ref = ObjectRef::new(obj.object_id, version, digest);
    Some(if obj.receiving == Some(true) {
        ObjectArg::Receiving(object_ref)
    } else {
        ObjectArg::ImmOrOwnedObject(object_ref)
    })
}

/// Shared objects are mutable when a Move call asked for it, or when any
/// non-Move-call command consumes them.
fn used_by_non_move_call(tx: &TransactionDataBuilder, index: usize) -> bool {
    let mut used = false;
    tx.get_input_uses(index as u16, |_, command| {
        if !matches!(command, Command::MoveCall(_)) {
            used = true;
        }
    });
    used
}

#[async_trait]
impl BuildStep for ResolveObjects {
    fn name(&self) -> &str {
        "ResolveObjects"
    }

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError> {
        let mut pending = BTreeSet::new();
        for index in 0..tx.inputs.len() {
            let CallArg::UnresolvedObject(obj) = &tx.inputs[index] else {
                continue;
            };
            match resolve_locally(obj, used_by_non_move_call(tx, index)) {
                Some(arg) => tx.inputs[index] = CallArg::Object(arg),
                None => {
                    pending.insert(obj.object_id);
                }
            }
        }

        if !pending.is_empty() {
            let client = options.client("object resolution")?;
            let limits = options.limits().await?;
            let ids: Vec<ObjectId> = pending.into_iter().collect();
            debug!(
                "fetching {} object(s) in chunks of {}",
                ids.len(),
                limits.max_objects_per_fetch
            );

            let responses = try_join_all(
                ids.chunks(limits.max_objects_per_fetch)
                    .map(|chunk| client.multi_get_objects(chunk)),
            )
            .await
            .map_err(TxError::Client)?;

            let mut found: BTreeMap<ObjectId, ObjectInfo> = BTreeMap::new();
            for lookup in responses.into_iter().flatten() {
                match lookup {
                    ObjectLookup::Found(info) => {
                        found.insert(info.object_id, info);
                    }
                    ObjectLookup::Error { object_id, error } => {
                        return Err(TxError::ObjectResolution {
                            id: object_id.to_string(),
                            reason: error,
                        });
                    }
                }
            }

            for index in 0..tx.inputs.len() {
                let CallArg::UnresolvedObject(obj) = &tx.inputs[index] else {
                    continue;
                };
                let info = found.get(&obj.object_id).ok_or_else(|| TxError::ObjectResolution {
                    id: obj.object_id.to_string(),
                    reason: "not returned by the node".into(),
                })?;
                let mutable = obj.mutable.unwrap_or(false) || used_by_non_move_call(tx, index);
                let receiving = obj.receiving == Some(true);
                tx.inputs[index] = CallArg::Object(info.to_object_arg(mutable, receiving));
            }
        }

        next.run(tx).await
    }
}
