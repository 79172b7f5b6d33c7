// src/store/sheets.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{row_values, IncidentStore};
use crate::dedup::History;
use crate::feed::types::IncidentRecord;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

// Header row lives in row 1; history reads start below it.
const RANGE_CALL_RECEIVED: &str = "C2:C";
const RANGE_ADDRESS: &str = "E2:E";
const RANGE_APPEND: &str = "A:F";

/// Ledger backed by one worksheet of a Google spreadsheet, addressed
/// through the Sheets v4 values API with a bearer access token.
pub struct SheetsStore {
    sheet_key: String,
    access_token: String,
    client: Client,
}

impl SheetsStore {
    pub fn new(sheet_key: String, access_token: String) -> Self {
        Self {
            sheet_key,
            access_token,
            client: Client::new(),
        }
    }

    fn values_url(&self, suffix: &str) -> String {
        format!("{SHEETS_API}/{}/values{suffix}", self.sheet_key)
    }
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(rename = "valueRanges", default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    // Omitted entirely when the requested range is empty.
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl ValueRange {
    /// First (and only) column of a COLUMNS-major range.
    fn into_column(mut self) -> Vec<String> {
        if self.values.is_empty() {
            return Vec::new();
        }
        self.values.swap_remove(0)
    }
}

#[async_trait::async_trait]
impl IncidentStore for SheetsStore {
    async fn read_history(&self) -> Result<History> {
        let resp = self
            .client
            .get(self.values_url(":batchGet"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("ranges", RANGE_CALL_RECEIVED),
                ("ranges", RANGE_ADDRESS),
                ("majorDimension", "COLUMNS"),
            ])
            .send()
            .await
            .context("sheets batchGet")?
            .error_for_status()
            .context("sheets batchGet non-2xx")?;

        let body: BatchGetResponse = resp.json().await.context("sheets batchGet body")?;
        let mut ranges = body.value_ranges.into_iter();
        let mut calls = ranges.next().map(ValueRange::into_column).unwrap_or_default();
        let mut addresses = ranges.next().map(ValueRange::into_column).unwrap_or_default();

        // Sheets truncates a trailing run of empty cells per column, which
        // would surface here as misalignment; pad the shorter column so
        // blank cells compare as empty strings instead of shifting rows.
        let rows = calls.len().max(addresses.len());
        calls.resize(rows, String::new());
        addresses.resize(rows, String::new());

        History::from_columns(calls, addresses)
    }

    async fn append(&self, record: &IncidentRecord) -> Result<()> {
        let body = serde_json::json!({ "values": [row_values(record)] });

        self.client
            .post(self.values_url(&format!("/{RANGE_APPEND}:append")))
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .context("sheets append")?
            .error_for_status()
            .context("sheets append non-2xx")?;
        Ok(())
    }
}
