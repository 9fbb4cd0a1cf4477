//! In-memory per-table cache with dirty/deleted tracking and transactional
//! flush (spec §4.3, component C3).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::active::Active;
use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// A single table's in-memory cache for the duration of one tick transaction.
///
/// `lookup` returns a write-observing view is realized here as an explicit
/// [`GameTable::update`] taking `FnOnce(&mut T) -> R`: every call
/// unconditionally marks the id modified, so no mutation can happen without
/// being tracked (spec §9 design note (a)).
pub struct GameTable<Id, T> {
    data: HashMap<Id, T>,
    modified: HashSet<Id>,
    deleted: HashSet<Id>,
}

impl<Id, T> GameTable<Id, T>
where
    Id: Copy + Eq + Hash + fmt::Display,
    T: Active,
{
    pub fn new() -> Self {
        Self { data: HashMap::new(), modified: HashSet::new(), deleted: HashSet::new() }
    }

    /// Seed the cache from a snapshot already loaded from the store, with no
    /// rows marked dirty. Used when a tick transaction begins.
    pub fn load(rows: HashMap<Id, T>) -> Self {
        Self { data: rows, modified: HashSet::new(), deleted: HashSet::new() }
    }

    /// Insert (or overwrite) `row` under `id` and mark it modified.
    pub fn insert(&mut self, id: Id, row: T) -> Id {
        self.data.insert(id, row);
        self.modified.insert(id);
        self.deleted.remove(&id);
        id
    }

    /// Remove `id` from the cache and mark it for deletion on flush.
    pub fn delete(&mut self, id: Id) {
        self.data.remove(&id);
        self.modified.remove(&id);
        self.deleted.insert(id);
    }

    /// Read-only lookup. Fails if `id` is absent or inactive.
    pub fn lookup(&self, id: Id) -> StoreResult<&T> {
        match self.data.get(&id) {
            Some(row) if row.is_active() => Ok(row),
            Some(_) => Err(StoreError::InactiveId(id.to_string())),
            None => Err(StoreError::InvalidId(id.to_string())),
        }
    }

    /// Mutate `id` through `f`, unconditionally marking it modified. Fails if
    /// `id` is absent or inactive, matching [`GameTable::lookup`].
    pub fn update<F, R>(&mut self, id: Id, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let row = match self.data.get_mut(&id) {
            Some(row) if row.is_active() => row,
            Some(_) => return Err(StoreError::InactiveId(id.to_string())),
            None => return Err(StoreError::InvalidId(id.to_string())),
        };
        let result = f(row);
        self.modified.insert(id);
        Ok(result)
    }

    /// First active row matching `pred`.
    pub fn find<F: Fn(&T) -> bool>(&self, pred: F) -> Option<(Id, &T)> {
        self.data.iter().find(|(_, row)| row.is_active() && pred(row)).map(|(id, row)| (*id, row))
    }

    /// All active rows matching `pred`.
    pub fn filter<F: Fn(&T) -> bool>(&self, pred: F) -> Vec<(Id, &T)> {
        self.data
            .iter()
            .filter(|(_, row)| row.is_active() && pred(row))
            .map(|(id, row)| (*id, row))
            .collect()
    }

    /// Ids currently marked modified this transaction.
    pub fn modified_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.modified.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl<Id, T> GameTable<Id, T>
where
    Id: Copy + Eq + Hash + fmt::Display + Into<u64>,
    T: Active + Serialize,
{
    /// Delete all `deleted` ids, replace all `modified` ids with their
    /// current cached state, then clear both sets. Idempotent: calling twice
    /// in a row with no intervening writes is a no-op the second time.
    pub fn save(&mut self, store: &dyn Store, table: &str) -> StoreResult<()> {
        for id in self.deleted.drain() {
            store.delete(table, id.into())?;
        }
        for id in self.modified.drain() {
            if let Some(row) = self.data.get(&id) {
                let value = serde_json::to_value(row)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                store.replace(table, id.into(), value)?;
            }
        }
        Ok(())
    }
}
