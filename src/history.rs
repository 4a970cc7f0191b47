/// Bounded store of past calculations
use std::collections::VecDeque;

use chrono::{DateTime, Local};
use log::info;

use crate::calculation::{CalculationOutcome, FireRequest};
use crate::constants::HISTORY_CAPACITY;
use crate::error::InputError;

/// One archived calculation
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub weapon: String,
    pub ammunition: String,
    pub request: FireRequest,
    pub outcome: CalculationOutcome,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(
        weapon: impl Into<String>,
        ammunition: impl Into<String>,
        request: FireRequest,
        outcome: CalculationOutcome,
    ) -> Self {
        Self {
            weapon: weapon.into(),
            ammunition: ammunition.into(),
            request,
            outcome,
            timestamp: Local::now(),
        }
    }

    /// Wall-clock time of the calculation as `HH:MM:SS`
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Most-recent-N calculations, oldest evicted first.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        info!(
            "history: {} / {} at {} m",
            entry.weapon, entry.ammunition, entry.request.distance_m
        );
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entry by 1-based reverse index; 1 is the most recent.
    pub fn get(&self, reverse_index: usize) -> Result<&HistoryEntry, InputError> {
        let len = self.entries.len();
        if reverse_index == 0 || reverse_index > len {
            return Err(InputError::HistoryIndex {
                index: reverse_index,
                len,
            });
        }
        Ok(&self.entries[len - reverse_index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries from most recent to oldest, paired with their reverse index
    pub fn iter_recent(&self) -> impl Iterator<Item = (usize, &HistoryEntry)> {
        self.entries.iter().rev().enumerate().map(|(i, e)| (i + 1, e))
    }
}
