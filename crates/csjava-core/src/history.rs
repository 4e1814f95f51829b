//! Fixed-capacity analysis history

use crate::types::AnalysisRecord;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of analyses kept per session
pub const HISTORY_CAPACITY: usize = 10;

/// FIFO of the most recent analyses; the oldest is evicted first
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AnalysisHistory {
    records: VecDeque<AnalysisRecord>,
    #[serde(skip)]
    capacity: usize,
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl AnalysisHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, returning the evicted one when full
    pub fn push(&mut self, record: AnalysisRecord) -> Option<AnalysisRecord> {
        if self.capacity == 0 {
            return Some(record);
        }
        let evicted = if self.records.len() == self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Newest `n` records, newest first
    pub fn recent(&self, n: usize) -> Vec<&AnalysisRecord> {
        self.records.iter().rev().take(n).collect()
    }

    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.records.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
