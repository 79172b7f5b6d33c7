// src/dedup.rs
use std::collections::HashSet;

use anyhow::{bail, Result};
use metrics::counter;

use crate::feed::types::IncidentRecord;

/// How a fetched record is matched against the ledger history.
///
/// - `Field`: a record is a duplicate when its call-received value OR its
///   address has been seen in any prior row. Matches the historical sheet
///   check exactly, including its known weakness: two unrelated incidents
///   at the same address collapse into one.
/// - `Pair`: a record is a duplicate only when one prior row carries BOTH
///   the same call-received value AND the same address. (call, address)
///   is the identity key; this is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    Field,
    #[default]
    Pair,
}

impl std::str::FromStr for MatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "field" => Ok(MatchPolicy::Field),
            "pair" => Ok(MatchPolicy::Pair),
            other => bail!("unknown match policy {other:?} (expected \"pair\" or \"field\")"),
        }
    }
}

/// Snapshot of previously recorded incidents, rebuilt from the ledger at
/// the start of every cycle.
///
/// Built from two column reads that must come from the same rows in the
/// same order; the constructor rejects misaligned columns because every
/// membership answer after that point would be silently wrong.
#[derive(Debug, Clone, Default)]
pub struct History {
    rows: usize,
    calls: HashSet<String>,
    addresses: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl History {
    pub fn from_columns(calls: Vec<String>, addresses: Vec<String>) -> Result<Self> {
        if calls.len() != addresses.len() {
            bail!(
                "ledger columns misaligned: {} call-received values vs {} addresses",
                calls.len(),
                addresses.len()
            );
        }
        let rows = calls.len();
        let pairs = calls
            .iter()
            .cloned()
            .zip(addresses.iter().cloned())
            .collect();
        Ok(Self {
            rows,
            calls: calls.into_iter().collect(),
            addresses: addresses.into_iter().collect(),
            pairs,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    /// True iff the record's call-received value is absent from the
    /// call-received column AND its address is absent from the address
    /// column. Exact string equality, no normalization; formatting drift
    /// upstream shows up here as misclassification, not an error.
    pub fn is_novel(&self, record: &IncidentRecord) -> bool {
        !self.calls.contains(&record.call_received) && !self.addresses.contains(&record.address)
    }

    /// True iff no single prior row carries both the record's
    /// call-received value and its address.
    pub fn is_novel_pair(&self, record: &IncidentRecord) -> bool {
        !self
            .pairs
            .contains(&(record.call_received.clone(), record.address.clone()))
    }

    /// Apply the configured policy. When the two policies disagree (the
    /// coarse field check calls something a duplicate that no prior row
    /// actually matches as a whole), the discrepancy is logged so repeat
    /// calls to one address are never dropped silently.
    pub fn is_novel_under(&self, policy: MatchPolicy, record: &IncidentRecord) -> bool {
        let by_field = self.is_novel(record);
        let by_pair = self.is_novel_pair(record);
        if by_field != by_pair {
            counter!("watch_policy_disagreements_total").increment(1);
            tracing::warn!(
                call_received = %record.call_received,
                address = %record.address,
                "field-match and pair-match disagree on this record"
            );
        }
        match policy {
            MatchPolicy::Field => by_field,
            MatchPolicy::Pair => by_pair,
        }
    }
}
