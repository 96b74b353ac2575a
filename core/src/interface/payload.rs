use serde::{Deserialize, Serialize};

use crate::catalog::record::{CatalogRecord, SourceId};
use crate::interface::pointing::Pointing;
use crate::prelude::SelectorError;

/// One element of the published target list. Coordinates are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub source_id: SourceId,
    pub ra: f64,
    pub dec: f64,
}

impl From<&CatalogRecord> for TargetEntry {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            source_id: record.source_id.clone(),
            ra: record.ra,
            dec: record.dec,
        }
    }
}

/// Ordered target list stored under `targets:<ObservationID>`; element 0 is the primary pointing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TargetEntry>", into = "Vec<TargetEntry>")]
pub struct ResultPayload {
    entries: Vec<TargetEntry>,
}

impl TryFrom<Vec<TargetEntry>> for ResultPayload {
    type Error = SelectorError;

    fn try_from(entries: Vec<TargetEntry>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            return Err(SelectorError::MalformedMessage(
                "target list has no primary pointing entry".to_string(),
            ));
        }
        Ok(Self { entries })
    }
}

impl From<ResultPayload> for Vec<TargetEntry> {
    fn from(payload: ResultPayload) -> Self {
        payload.entries
    }
}

impl ResultPayload {
    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn primary(&self) -> &TargetEntry {
        &self.entries[0]
    }

    /// Number of catalog matches, excluding the primary pointing.
    pub fn match_count(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }
}

pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format(records: &[CatalogRecord], pointing: &Pointing) -> ResultPayload {
        let mut entries = Vec::with_capacity(records.len() + 1);
        entries.push(TargetEntry {
            source_id: SourceId::Name(pointing.target_name.clone()),
            ra: pointing.ra_deg,
            dec: pointing.dec_deg,
        });
        entries.extend(records.iter().map(TargetEntry::from));
        ResultPayload { entries }
    }
}
