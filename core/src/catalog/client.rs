use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::catalog::query::CatalogQuery;
use crate::catalog::record::{CatalogRecord, SourceId};

/// Errors raised while reading from the catalog store.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported source_id value in row {row}")]
    UnsupportedSourceId { row: usize },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the relational catalog of known sources.
pub trait CatalogStore {
    /// Runs the query in a single read transaction, returning rows in store order.
    fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRecord>, CatalogError>;
}

/// Catalog backed by a SQLite database holding a `target_list`-shaped table.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CatalogError> {
        register_trig_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Creates the catalog table and its `(ra, decl)` index if missing.
    pub fn create_table(&self, table: &str) -> Result<(), CatalogError> {
        let index = table.replace('.', "_");
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 source_id,
                 ra REAL NOT NULL,
                 decl REAL NOT NULL,
                 dist_c REAL
             );
             CREATE INDEX IF NOT EXISTS {index}_ra_decl ON {table} (ra, decl);"
        ))?;
        Ok(())
    }

    /// Bulk-loads fixture rows; returns the number inserted.
    pub fn insert_records(
        &mut self,
        table: &str,
        records: &[CatalogRecord],
    ) -> Result<usize, CatalogError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (source_id, ra, decl, dist_c) VALUES (?1, ?2, ?3, ?4)",
                table
            ))?;
            for record in records {
                let source_id = match &record.source_id {
                    SourceId::Number(id) => Value::Integer(*id),
                    SourceId::Name(name) => Value::Text(name.clone()),
                };
                stmt.execute(rusqlite::params![
                    source_id,
                    record.ra,
                    record.dec,
                    record.distance
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }
}

impl CatalogStore for SqliteCatalog {
    fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        let tx = self.conn.unchecked_transaction()?;
        let records = {
            let mut stmt = tx.prepare(&query.sql)?;
            let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
                Ok((
                    row.get::<_, Value>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })?;

            let mut records = Vec::new();
            for (index, row) in rows.enumerate() {
                let (raw_id, ra, dec, distance) = row?;
                let source_id = match raw_id {
                    Value::Integer(id) => SourceId::Number(id),
                    Value::Text(name) => SourceId::Name(name),
                    _ => return Err(CatalogError::UnsupportedSourceId { row: index }),
                };
                records.push(CatalogRecord {
                    source_id,
                    ra,
                    dec,
                    distance,
                });
            }
            records
        };
        tx.commit()?;
        Ok(records)
    }
}

fn register_trig_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    // Rounding can push the cosine just past 1 for sources at the pointing center.
    conn.create_scalar_function("ACOS", 1, flags, |ctx| {
        Ok(ctx.get::<f64>(0)?.clamp(-1.0, 1.0).acos())
    })?;
    conn.create_scalar_function("SIN", 1, flags, |ctx| Ok(ctx.get::<f64>(0)?.sin()))?;
    conn.create_scalar_function("COS", 1, flags, |ctx| Ok(ctx.get::<f64>(0)?.cos()))?;
    conn.create_scalar_function("RADIANS", 1, flags, |ctx| {
        Ok(ctx.get::<f64>(0)?.to_radians())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::query::{CatalogQueryBuilder, DEFAULT_TABLE};
    use crate::math::geometry::GeometryEngine;
    use tempfile::TempDir;

    fn seeded_catalog(records: &[CatalogRecord]) -> SqliteCatalog {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.create_table(DEFAULT_TABLE).unwrap();
        catalog.insert_records(DEFAULT_TABLE, records).unwrap();
        catalog
    }

    fn cone_query(ra_deg: f64, dec_deg: f64, radius_deg: f64) -> CatalogQuery {
        let (ra, dec, r) = (
            ra_deg.to_radians(),
            dec_deg.to_radians(),
            radius_deg.to_radians(),
        );
        let boxes = GeometryEngine::bounding_boxes(ra, dec, r);
        CatalogQueryBuilder::new(DEFAULT_TABLE)
            .unwrap()
            .build(&boxes, ra, dec, r)
    }

    #[test]
    fn fetch_returns_sources_inside_cone() {
        let catalog = seeded_catalog(&[
            CatalogRecord::new(1_i64, 100.0, 10.0, Some(12.5)),
            CatalogRecord::new(2_i64, 100.5, 10.2, None),
            CatalogRecord::new(3_i64, 103.0, 10.0, Some(4.0)),
            CatalogRecord::new("named", 99.8, 9.9, Some(1.0)),
        ]);

        let records = catalog.fetch(&cone_query(100.0, 10.0, 1.0)).unwrap();
        let mut ids: Vec<String> = records.iter().map(|r| r.source_id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "named"]);
        let first = records
            .iter()
            .find(|r| r.source_id == SourceId::Number(1))
            .unwrap();
        assert_eq!(first.distance, Some(12.5));
        let second = records
            .iter()
            .find(|r| r.source_id == SourceId::Number(2))
            .unwrap();
        assert_eq!(second.distance, None);
    }

    #[test]
    fn fetch_keeps_sources_across_the_antimeridian() {
        let catalog = seeded_catalog(&[
            CatalogRecord::new(10_i64, 0.0, 0.0, None),
            CatalogRecord::new(11_i64, 357.0, 1.0, None),
            CatalogRecord::new(12_i64, 5.5, 0.0, None),
            CatalogRecord::new(13_i64, 350.0, 0.0, None),
            CatalogRecord::new(14_i64, 180.0, 0.0, None),
        ]);

        let records = catalog.fetch(&cone_query(1.0, 0.0, 5.0)).unwrap();
        let mut ids: Vec<String> = records.iter().map(|r| r.source_id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["10", "11", "12"]);
    }

    #[test]
    fn fetch_covers_the_pole() {
        let catalog = seeded_catalog(&[
            CatalogRecord::new(20_i64, 0.0, 90.0, None),
            CatalogRecord::new(21_i64, 190.0, 87.0, None),
            CatalogRecord::new(22_i64, 10.0, 80.0, None),
        ]);

        let records = catalog.fetch(&cone_query(10.0, 89.0, 5.0)).unwrap();
        let mut ids: Vec<String> = records.iter().map(|r| r.source_id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["20", "21"]);
    }

    #[test]
    fn full_scan_without_boxes_is_still_exact() {
        let catalog = seeded_catalog(&[
            CatalogRecord::new(30_i64, 0.0, 0.0, None),
            CatalogRecord::new(31_i64, 120.0, 0.0, None),
        ]);
        let query = CatalogQueryBuilder::new(DEFAULT_TABLE)
            .unwrap()
            .build(&[], 0.0, 0.0, 100.0_f64.to_radians());
        let records = catalog.fetch(&query).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id, SourceId::Number(30));
    }

    #[test]
    fn missing_table_is_reported() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let err = catalog.fetch(&cone_query(0.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, CatalogError::Sqlite(_)));
    }

    #[test]
    fn reopens_catalog_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let mut catalog = SqliteCatalog::open(&path).unwrap();
            catalog.create_table(DEFAULT_TABLE).unwrap();
            catalog
                .insert_records(DEFAULT_TABLE, &[CatalogRecord::new(40_i64, 45.0, -30.0, None)])
                .unwrap();
        }
        let catalog = SqliteCatalog::open(&path).unwrap();
        let records = catalog.fetch(&cone_query(45.0, -30.0, 0.5)).unwrap();
        assert_eq!(records.len(), 1);
    }
}
