//! Per-engine input queue: an ascending-number prefix drained in order,
//! backed by a sparse `BTreeMap` keyed by input `number` rather than wake
//! tick, since inputs must drain strictly in order rather than by tick
//! bucket.

use std::collections::BTreeMap;

use town_core::{EngineId, InputId, Timestamp};

use crate::input::{Input, InputResult};

/// Holds every input submitted to one engine, pending or resolved.
#[derive(Default)]
pub struct InputQueue {
    by_number: BTreeMap<u64, Input>,
    next_number: u64,
    next_id: u64,
}

impl InputQueue {
    pub fn new() -> Self {
        Self { by_number: BTreeMap::new(), next_number: 1, next_id: 1 }
    }

    /// Allocate the next `number` for `engine_id` and enqueue a pending
    /// input. Numbers are a dense ascending prefix starting at 1.
    pub fn insert(
        &mut self,
        engine_id: EngineId,
        name: impl Into<String>,
        args: serde_json::Value,
        received_ts: Timestamp,
    ) -> Input {
        let number = self.next_number;
        self.next_number += 1;
        let id = InputId(self.next_id);
        self.next_id += 1;

        let input = Input { id, engine_id, number, name: name.into(), args, received_ts, return_value: None };
        self.by_number.insert(number, input.clone());
        input
    }

    /// Borrow the input with the given `number`, if any (pending or not).
    pub fn peek(&self, number: u64) -> Option<&Input> {
        self.by_number.get(&number)
    }

    /// Record the result of applying the input with the given `number`.
    /// Idempotent in the sense that a second call overwrites, but callers
    /// (the step loop) only ever call this once per number (spec §8: "each
    /// input's returnValue is written exactly once").
    pub fn record_result(&mut self, number: u64, result: InputResult) {
        if let Some(input) = self.by_number.get_mut(&number) {
            input.return_value = Some(result);
        }
    }

    /// Status of a previously submitted input, by its allocated `id`.
    pub fn status_by_id(&self, id: InputId) -> Option<&InputResult> {
        self.by_number.values().find(|i| i.id == id).and_then(|i| i.return_value.as_ref())
    }

    /// The next unprocessed number, i.e. `processed_input_number + 1`.
    pub fn highest_number(&self) -> u64 {
        self.next_number.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}
