use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single validated fetch result written into a source's windowed buffer.
/// Immutable once inserted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp_ms: i64,
    pub mid: Decimal,
    pub ask: Decimal,
    pub bid: Decimal,
    /// The source's last executed trade price, used by the TRADES
    /// aggregation method instead of `mid`.
    pub last_price: Decimal,
    pub volume: Decimal,
}

/// A bounded, time-ordered sequence of `Observation`s for one price source.
///
/// Insertion enforces strict timestamp monotonicity (an observation older
/// than the newest already buffered is dropped) and evicts entries older
/// than `window_duration_ms` relative to the timestamp of the newest insert.
#[derive(Debug, Clone)]
pub struct WindowedBuffer {
    window_duration_ms: i64,
    entries: VecDeque<Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The observation's timestamp was not newer than the newest buffered
    /// one; the buffer was left unchanged.
    DroppedOutOfOrder,
}

impl WindowedBuffer {
    pub fn new(window_duration_ms: i64) -> Self {
        Self {
            window_duration_ms,
            entries: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, observation: Observation) -> InsertOutcome {
        if let Some(newest) = self.entries.back() {
            if observation.timestamp_ms < newest.timestamp_ms {
                return InsertOutcome::DroppedOutOfOrder;
            }
        }
        self.entries.push_back(observation);
        self.evict_older_than(observation.timestamp_ms);
        InsertOutcome::Inserted
    }

    fn evict_older_than(&mut self, newest_timestamp_ms: i64) {
        let cutoff = newest_timestamp_ms - self.window_duration_ms;
        while let Some(front) = self.entries.front() {
            if front.timestamp_ms < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.entries.back()
    }

    /// The most recent observation, if its timestamp falls within
    /// `[now_ms - window_duration_ms, now_ms]`.
    pub fn latest_within_window(&self, now_ms: i64) -> Option<&Observation> {
        self.latest()
            .filter(|o| now_ms - o.timestamp_ms <= self.window_duration_ms && o.timestamp_ms <= now_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.entries.iter()
    }
}
