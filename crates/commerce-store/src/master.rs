//! Master entity index.
//!
//! A single identity table shared by every record kind. Each row maps an
//! `(entity_type, business_key)` pair to an immutable numeric id and UUID.
//! Rows are created only inside a caller-supplied transaction, at the start
//! of the owning record's creation, and are never updated or deleted
//! independently: if that transaction rolls back, so does the row.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use commerce_types::{EntityType, MasterId, MasterRef};

use crate::engine::{Tables, Txn};
use crate::error::{StoreError, StoreResult};

const TABLE: &str = "master_entity";

/// Identity row shared by all domain records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterEntity {
    pub id: MasterId,
    pub uuid: Uuid,
    pub entity_type: EntityType,
    pub business_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterEntity {
    pub fn reference(&self) -> MasterRef {
        MasterRef::new(self.id, self.uuid)
    }
}

/// Storage for the master index: rows by id plus a unique
/// `(entity_type, business_key)` index.
#[derive(Default)]
pub struct MasterTable {
    by_id: BTreeMap<MasterId, MasterEntity>,
    by_key: HashMap<(EntityType, String), MasterId>,
    last_id: i64,
}

impl MasterTable {
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.by_id
            .values()
            .filter(|m| m.entity_type == entity_type)
            .count()
    }
}

/// Mint an identity for `(entity_type, business_key)` inside `tx`.
///
/// Never opens its own transaction. Fails with [`StoreError::Conflict`]
/// when the pair already has a live row. Ids come from a sequence that is
/// not rewound on rollback, so gaps are expected.
pub fn create(tx: &mut Txn, entity_type: EntityType, business_key: &str) -> StoreResult<MasterRef> {
    tx.statement(TABLE)?;
    if business_key.trim().is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "empty business key for {entity_type}"
        )));
    }

    let index_key = (entity_type, business_key.to_string());
    let table = &mut tx.tables_mut().master;
    if table.by_key.contains_key(&index_key) {
        return Err(StoreError::Conflict {
            entity_type,
            business_key: business_key.to_string(),
        });
    }

    table.last_id += 1;
    let now = Utc::now();
    let entity = MasterEntity {
        id: MasterId(table.last_id),
        uuid: Uuid::now_v7(),
        entity_type,
        business_key: business_key.to_string(),
        created_at: now,
        updated_at: now,
    };
    let id = entity.id;
    let reference = entity.reference();
    table.by_id.insert(id, entity);
    table.by_key.insert(index_key.clone(), id);

    tx.push_undo(move |t| {
        t.master.by_id.remove(&id);
        t.master.by_key.remove(&index_key);
    });

    debug!(%entity_type, business_key, master_id = %id, "master entity created");
    Ok(reference)
}

/// Find the live master row for `(entity_type, business_key)`.
pub fn lookup(tables: &Tables, entity_type: EntityType, business_key: &str) -> Option<MasterEntity> {
    let master = tables.master();
    master
        .by_key
        .get(&(entity_type, business_key.to_string()))
        .and_then(|id| master.by_id.get(id))
        .cloned()
}

/// Find a master row by numeric id.
pub fn get(tables: &Tables, id: MasterId) -> Option<MasterEntity> {
    tables.master().by_id.get(&id).cloned()
}
