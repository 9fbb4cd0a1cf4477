//! Per-record numeric sample tracking and binary-blob packing (spec §4.2,
//! component C2).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use town_core::Timestamp;

use crate::active::Active;
use crate::error::StoreResult;
use crate::game_table::GameTable;
use crate::history_blob::{self, FieldHistory};
use crate::store::Store;

/// A record type some of whose numeric fields are tracked for client-side
/// interpolation. `tracked_fields` returns an associative list of field name
/// to current value so the generic sampler needs no per-type glue code.
pub trait Historical: Active {
    fn tracked_fields(&self) -> Vec<(&'static str, f64)>;
}

/// Wraps a [`GameTable`], adding per-field sample accumulation and
/// blob-packing on flush.
pub struct HistoricalTable<Id, T> {
    table: GameTable<Id, T>,
    /// Samples accumulated since the last flush, per id then per field name.
    samples: HashMap<Id, HashMap<&'static str, Vec<(Timestamp, f64)>>>,
    /// The last value observed for each (id, field), persisted *across*
    /// flushes so that only genuine changes — not every touch of a modified
    /// record — produce a sample. Seeded once per id from
    /// [`HistoricalTable::insert`]'s initial field values.
    last_known: HashMap<Id, HashMap<&'static str, f64>>,
}

impl<Id, T> HistoricalTable<Id, T>
where
    Id: Copy + Eq + Hash + fmt::Display,
    T: Historical,
{
    pub fn new() -> Self {
        Self { table: GameTable::new(), samples: HashMap::new(), last_known: HashMap::new() }
    }

    pub fn load(rows: HashMap<Id, T>) -> Self
    where
        T: Clone,
    {
        let mut last_known = HashMap::new();
        for (id, row) in &rows {
            last_known.insert(*id, row.tracked_fields().into_iter().collect());
        }
        Self { table: GameTable::load(rows), samples: HashMap::new(), last_known }
    }

    /// Insert a new historical record, seeding its tracked-field baseline so
    /// that the values it is created with never themselves register as a
    /// "change" the first time they are sampled.
    pub fn insert(&mut self, id: Id, row: T) -> Id {
        self.last_known.insert(id, row.tracked_fields().into_iter().collect());
        self.table.insert(id, row)
    }

    pub fn delete(&mut self, id: Id) {
        self.table.delete(id);
        self.last_known.remove(&id);
        self.samples.remove(&id);
    }

    pub fn lookup(&self, id: Id) -> StoreResult<&T> {
        self.table.lookup(id)
    }

    pub fn update<F, R>(&mut self, id: Id, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.table.update(id, f)
    }

    pub fn find<F: Fn(&T) -> bool>(&self, pred: F) -> Option<(Id, &T)> {
        self.table.find(pred)
    }

    pub fn filter<F: Fn(&T) -> bool>(&self, pred: F) -> Vec<(Id, &T)> {
        self.table.filter(pred)
    }

    /// For every tracked field of every record modified this tick, append a
    /// `(now, value)` sample whenever the value differs from the last known
    /// value for that field (spec §4.2, §3 invariant 6).
    pub fn sample_tick(&mut self, now: Timestamp) {
        let modified: Vec<Id> = self.table.modified_ids().collect();
        for id in modified {
            let Ok(row) = self.table.lookup(id) else { continue };
            let fields = row.tracked_fields();
            let last = self.last_known.entry(id).or_default();
            let bucket = self.samples.entry(id).or_default();
            for (name, value) in fields {
                // Touch the entry unconditionally so `flush` sees every
                // tracked field, even ones with no changes this interval
                // (they pack as {initialValue: <steady value>, samples: []}).
                let field_samples = bucket.entry(name).or_default();
                let changed = last.get(name).map(|prev| *prev != value).unwrap_or(true);
                if changed {
                    field_samples.push((now, value));
                    last.insert(name, value);
                }
            }
        }
    }
}

impl<Id, T> HistoricalTable<Id, T>
where
    Id: Copy + Eq + Hash + fmt::Display + Into<u64>,
    T: Historical + Serialize,
{
    /// Pack this interval's per-field histories into each modified record's
    /// `history` blob (via `set_history`), then delegate to the wrapped
    /// `GameTable::save`. Sample buffers are cleared afterward; `last_known`
    /// persists so the next interval's change detection has a baseline.
    pub fn flush(
        &mut self,
        store: &dyn Store,
        table: &str,
        mut set_history: impl FnMut(&mut T, Vec<u8>),
    ) -> StoreResult<()> {
        let ids: Vec<Id> = self.samples.keys().copied().collect();
        for id in ids {
            let Some(field_samples) = self.samples.remove(&id) else { continue };
            let last = self.last_known.get(&id).cloned().unwrap_or_default();
            let mut histories = Vec::with_capacity(field_samples.len());
            for (name, samples) in field_samples {
                let initial_value =
                    samples.first().map(|(_, v)| *v).or_else(|| last.get(name).copied()).unwrap_or(0.0);
                histories.push(FieldHistory { name, initial_value, samples });
            }
            let blob = history_blob::pack(&histories);
            let _ = self.table.update(id, |row| set_history(row, blob));
        }
        self.table.save(store, table)
    }
}
