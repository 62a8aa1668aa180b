use std::io;

use crate::render::Renderer;
use crate::results::ResultEntry;
use crate::storage::record::ResultRecord;

/// Walks through the entries of a loaded record, wrapping around at both ends.
#[derive(Debug, Clone)]
pub struct SummaryPager {
    record: ResultRecord,
    index: usize,
}

impl SummaryPager {
    /// `None` for a record without entries.
    pub fn new(record: ResultRecord) -> Option<Self> {
        (!record.entries.is_empty()).then_some(Self { record, index: 0 })
    }

    pub fn record(&self) -> &ResultRecord {
        &self.record
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.record.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.entries.is_empty()
    }

    pub fn current(&self) -> &ResultEntry {
        &self.record.entries[self.index]
    }

    pub fn turn(&mut self, change: isize) -> usize {
        let len = self.len() as isize;
        self.index = (self.index as isize + change).rem_euclid(len) as usize;
        self.index
    }

    pub fn show<R: Renderer>(&self, renderer: &mut R) -> io::Result<()> {
        renderer.display_summary_entry(self.current(), self.index, self.len())
    }
}
