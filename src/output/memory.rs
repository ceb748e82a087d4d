//! In-memory record collection for tests and embedding

use crate::catalog::{NormalizedRecord, Record, SummaryRecord};
use crate::output::traits::{OutputResult, RecordSink};
use std::sync::{Mutex, PoisonError};

/// Keeps every record it is given, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                Record::Summary(summary) => Some(summary),
                Record::Product(_) => None,
            })
            .collect()
    }

    pub fn products(&self) -> Vec<NormalizedRecord> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                Record::Product(product) => Some(product),
                Record::Summary(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn write_record(&self, record: &Record) -> OutputResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn finish(&self) -> OutputResult<()> {
        Ok(())
    }
}
