//! The `Store` contract: the transactional persistence collaborator the core
//! engine requires but does not implement (spec §6 "Store contract").
//!
//! Real deployments back this with a transactional document database offering
//! strict serializable isolation and optimistic-concurrency retry around the
//! whole handler; this crate only provides [`MemStore`], a non-durable
//! in-memory reference implementation for tests and `demos/basic`.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreResult;

/// A deferred callback registered through [`Store::run_after`].
///
/// `MemStore` does not run these automatically — it has no clock of its own.
/// Callers (typically `town-engine`'s step loop in a test harness) drain due
/// callbacks explicitly via [`MemStore::take_due`]; a production `Store`
/// would instead schedule this with a durable cron/timer service.
pub struct DeferredCall {
    pub ready_at_ms: u64,
    pub callback: Box<dyn FnOnce() + Send>,
}

/// Transactional multi-record read/insert/replace/delete, keyed by table name
/// and a raw `u64` id. Table contents are opaque `serde_json::Value`
/// documents so one trait serves every entity type without per-table glue.
pub trait Store: Send + Sync {
    fn get(&self, table: &str, id: u64) -> StoreResult<Option<serde_json::Value>>;

    fn get_many(&self, table: &str, ids: &[u64]) -> StoreResult<Vec<Option<serde_json::Value>>> {
        ids.iter().map(|id| self.get(table, *id)).collect()
    }

    fn insert(&self, table: &str, id: u64, value: serde_json::Value) -> StoreResult<()>;

    fn replace(&self, table: &str, id: u64, value: serde_json::Value) -> StoreResult<()>;

    fn delete(&self, table: &str, id: u64) -> StoreResult<()>;

    /// Schedule `callback` to run after a delay, surviving restart in a real
    /// deployment (spec §6 `runAfter`). `ready_at_ms` is an absolute
    /// timestamp (caller's clock + delay) rather than a bare delay, since
    /// `MemStore` has no clock of its own to measure a delay against.
    fn run_after(&self, ready_at_ms: u64, callback: Box<dyn FnOnce() + Send>) -> StoreResult<()>;
}

/// Non-durable in-memory [`Store`] used by tests and `demos/basic`.
#[derive(Default)]
pub struct MemStore {
    tables: Mutex<HashMap<String, HashMap<u64, serde_json::Value>>>,
    deferred: Mutex<Vec<DeferredCall>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain (and return) every deferred call whose `ready_at_ms` is `<= now_ms`.
    /// The caller is responsible for invoking the returned callbacks.
    pub fn take_due(&self, now_ms: u64) -> Vec<DeferredCall> {
        let mut deferred = self.deferred.lock().unwrap();
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut *deferred).into_iter().partition(|d| d.ready_at_ms <= now_ms);
        *deferred = pending;
        due
    }
}

impl Store for MemStore {
    fn get(&self, table: &str, id: u64) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.tables.lock().unwrap().get(table).and_then(|t| t.get(&id)).cloned())
    }

    fn insert(&self, table: &str, id: u64, value: serde_json::Value) -> StoreResult<()> {
        self.tables.lock().unwrap().entry(table.to_string()).or_default().insert(id, value);
        Ok(())
    }

    fn replace(&self, table: &str, id: u64, value: serde_json::Value) -> StoreResult<()> {
        self.insert(table, id, value)
    }

    fn delete(&self, table: &str, id: u64) -> StoreResult<()> {
        if let Some(t) = self.tables.lock().unwrap().get_mut(table) {
            t.remove(&id);
        }
        Ok(())
    }

    fn run_after(&self, ready_at_ms: u64, callback: Box<dyn FnOnce() + Send>) -> StoreResult<()> {
        self.deferred.lock().unwrap().push(DeferredCall { ready_at_ms, callback });
        Ok(())
    }
}
