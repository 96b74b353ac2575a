use crate::math::geometry::BoundingBox;
use crate::prelude::{SelectorError, SelectorResult};

pub const DEFAULT_TABLE: &str = "target_list";

const COLUMNS: &str = "source_id, ra, decl, dist_c";

/// Parameterised cone search ready to run against the catalog store.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub sql: String,
    pub params: Vec<f64>,
    /// Whether the trigonometric filter runs over a rectangular pre-filter.
    pub prefiltered: bool,
}

/// Builds the two-stage box + angular-separation query.
#[derive(Debug, Clone)]
pub struct CatalogQueryBuilder {
    table: String,
}

impl CatalogQueryBuilder {
    pub fn new(table: impl Into<String>) -> SelectorResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(SelectorError::Configuration(format!(
                "invalid catalog table name {:?}",
                table
            )));
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Boxes are in radians, as produced by the geometry engine, as are the
    /// center coordinates and radius.
    pub fn build(
        &self,
        boxes: &[BoundingBox],
        ra_rad: f64,
        dec_rad: f64,
        radius_rad: f64,
    ) -> CatalogQuery {
        let mut params = Vec::with_capacity(boxes.len() * 4 + 4);

        let inner = if boxes.is_empty() {
            format!("SELECT {} FROM {}", COLUMNS, self.table)
        } else {
            let clauses = boxes
                .iter()
                .map(|bounds| {
                    let deg = bounds.to_degrees();
                    params.extend([deg.ra_min, deg.ra_max, deg.dec_min, deg.dec_max]);
                    "(ra >= ? AND ra <= ? AND decl >= ? AND decl <= ?)"
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("SELECT {} FROM {} WHERE {}", COLUMNS, self.table, clauses)
        };

        params.extend([dec_rad, dec_rad, ra_rad, radius_rad]);
        let sql = format!(
            "SELECT {} FROM ({}) AS t \
             WHERE ACOS(SIN(RADIANS(decl)) * SIN(?) \
             + COS(RADIANS(decl)) * COS(?) * COS(? - RADIANS(ra))) < ?",
            COLUMNS, inner
        );

        CatalogQuery {
            sql,
            params,
            prefiltered: !boxes.is_empty(),
        }
    }
}

fn is_valid_table_name(name: &str) -> bool {
    let mut parts = name.split('.');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    match (parts.next(), parts.next(), parts.next()) {
        (Some(table), None, None) => valid_part(table),
        (Some(schema), Some(table), None) => valid_part(schema) && valid_part(table),
        _ => false,
    }
}
