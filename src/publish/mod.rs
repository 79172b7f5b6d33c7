// src/publish/mod.rs
pub mod twitter;

use anyhow::Result;

use crate::feed::types::IncidentRecord;

pub use twitter::TwitterPublisher;

#[async_trait::async_trait]
pub trait Publisher {
    async fn publish(&self, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fixed status template. The record's fields are interpolated verbatim,
/// timestamps included, so the post always mirrors the ledger row.
pub fn compose_status(record: &IncidentRecord) -> String {
    format!(
        "#NEW: {} {} IS REPORTED AT {} / {}. CALL RECEIVED AT {}",
        record.incident_type_code,
        record.incident_type,
        record.address,
        record.city,
        record.call_received
    )
}

/// Publisher for dry runs: the status goes to the log and nowhere else.
pub struct LogPublisher;

#[async_trait::async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        tracing::info!(status = %text, "dry-run publish");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
