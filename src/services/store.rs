use crate::error::{Error, Result};
use crate::models::question::QuestionRecord;

/// Ordered collection of authored questions. Positions are contiguous
/// 0..count-1 after every mutation; removal re-indexes rather than leaving
/// gaps.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    records: Vec<QuestionRecord>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record at the end and returns its position.
    pub fn append(&mut self, record: QuestionRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn replace_at(&mut self, position: usize, record: QuestionRecord) -> Result<()> {
        let len = self.records.len();
        let slot = self
            .records
            .get_mut(position)
            .ok_or(Error::Index { position, len })?;
        *slot = record;
        Ok(())
    }

    /// Removes the record at `position`, shifting every subsequent record
    /// down by one.
    pub fn remove_at(&mut self, position: usize) -> Result<QuestionRecord> {
        if position >= self.records.len() {
            return Err(Error::Index {
                position,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(position))
    }

    pub fn get(&self, position: usize) -> Option<&QuestionRecord> {
        self.records.get(position)
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_marks(&self) -> u32 {
        self.records.iter().map(|r| r.marks).sum()
    }
}
