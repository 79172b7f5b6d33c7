// src/store/memory.rs
use std::sync::Mutex;

use anyhow::Result;

use super::{row_values, IncidentStore, COL_ADDRESS, COL_CALL_RECEIVED};
use crate::dedup::History;
use crate::feed::types::IncidentRecord;

/// In-process ledger used by dry runs and the integration tests. Holds
/// full rows so the history read exercises the same column extraction the
/// spreadsheet path relies on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().expect("memory store mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl IncidentStore for MemoryStore {
    async fn read_history(&self) -> Result<History> {
        let rows = self.rows.lock().expect("memory store mutex poisoned");
        let calls = rows
            .iter()
            .map(|r| r.get(COL_CALL_RECEIVED).cloned().unwrap_or_default())
            .collect();
        let addresses = rows
            .iter()
            .map(|r| r.get(COL_ADDRESS).cloned().unwrap_or_default())
            .collect();
        History::from_columns(calls, addresses)
    }

    async fn append(&self, record: &IncidentRecord) -> Result<()> {
        self.rows
            .lock()
            .expect("memory store mutex poisoned")
            .push(row_values(record));
        Ok(())
    }
}
