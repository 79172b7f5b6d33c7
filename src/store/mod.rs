// src/store/mod.rs
pub mod memory;
pub mod sheets;

use anyhow::Result;

use crate::dedup::History;
use crate::feed::types::IncidentRecord;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// Column layout of one ledger row. The call-received and address columns
/// feed the [`History`] read, so their positions are part of the store
/// contract, not a presentation detail.
pub const COL_CALL_RECEIVED: usize = 2;
pub const COL_ADDRESS: usize = 4;

#[async_trait::async_trait]
pub trait IncidentStore {
    /// Read the call-received and address columns of the whole ledger,
    /// header row excluded, drawn from the same rows in the same order.
    async fn read_history(&self) -> Result<History>;

    /// Append one record as a single row, in the fixed column order.
    async fn append(&self, record: &IncidentRecord) -> Result<()>;
}

/// One ledger row in the fixed column order.
pub fn row_values(record: &IncidentRecord) -> Vec<String> {
    vec![
        record.incident_type_code.clone(),
        record.incident_type.clone(),
        record.call_received.clone(),
        record.last_updated.clone(),
        record.address.clone(),
        record.city.clone(),
    ]
}
