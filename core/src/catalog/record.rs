use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier: numeric for survey-derived lists, textual for named targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Name(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(id) => write!(f, "{}", id),
            SourceId::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for SourceId {
    fn from(id: i64) -> Self {
        SourceId::Number(id)
    }
}

impl From<&str> for SourceId {
    fn from(name: &str) -> Self {
        SourceId::Name(name.to_string())
    }
}

impl From<String> for SourceId {
    fn from(name: String) -> Self {
        SourceId::Name(name)
    }
}

/// Row of the `target_list` table. Coordinates are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub source_id: SourceId,
    pub ra: f64,
    pub dec: f64,
    pub distance: Option<f64>,
}

impl CatalogRecord {
    pub fn new(source_id: impl Into<SourceId>, ra: f64, dec: f64, distance: Option<f64>) -> Self {
        Self {
            source_id: source_id.into(),
            ra,
            dec,
            distance,
        }
    }
}
