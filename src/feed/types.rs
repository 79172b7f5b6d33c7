// src/feed/types.rs
use anyhow::Result;

/// One active-incident row as delivered by the open-data feed.
///
/// Field values are carried verbatim. `call_received` and `last_updated`
/// are fixed-pattern timestamp strings (e.g. `1/1/2020 10:00:00 AM`);
/// they are never reparsed or reformatted before storage or publishing,
/// so the ledger always holds exactly what the feed said.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct IncidentRecord {
    #[serde(default)]
    pub incident_type_code: String, // e.g. "44F"
    #[serde(default)]
    pub incident_type: String, // e.g. "FIRE ALARM"
    #[serde(default)]
    pub call_received: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

#[async_trait::async_trait]
pub trait IncidentSource {
    async fn fetch_latest(&self) -> Result<Vec<IncidentRecord>>;
    fn name(&self) -> &'static str;
}
