use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use selectorcore::catalog::{CatalogRecord, SqliteCatalog};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for a synthetic target list used by offline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Sources scattered uniformly over the sky.
    pub background_sources: usize,
    /// Sources clustered around the field center.
    pub field_sources: usize,
    pub field_ra_deg: f64,
    pub field_dec_deg: f64,
    /// Maximum offset of clustered sources from the field center, degrees.
    pub field_spread_deg: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            background_sources: 5000,
            field_sources: 25,
            field_ra_deg: 202.78,
            field_dec_deg: 30.51,
            field_spread_deg: 0.4,
            seed: 0,
        }
    }
}

pub fn build_synthetic_records(config: &GeneratorConfig) -> Vec<CatalogRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut records = Vec::with_capacity(config.background_sources + config.field_sources);
    let mut next_id: i64 = 1;

    for _ in 0..config.background_sources {
        let ra = rng.gen_range(0.0..360.0);
        // Uniform in sin(dec) so the density is uniform on the sphere.
        let dec = rng.gen_range(-1.0_f64..1.0).asin().to_degrees();
        records.push(CatalogRecord::new(next_id, ra, dec, Some(rng.gen_range(1.0..2000.0))));
        next_id += 1;
    }

    let spread = config.field_spread_deg.max(0.0);
    for _ in 0..config.field_sources {
        let offset = spread * rng.gen::<f64>().sqrt();
        let angle = rng.gen_range(0.0..2.0 * PI);
        let dec = (config.field_dec_deg + offset * angle.sin()).clamp(-90.0, 90.0);
        let cos_dec = config.field_dec_deg.to_radians().cos().max(1e-6);
        let ra = (config.field_ra_deg + offset * angle.cos() / cos_dec).rem_euclid(360.0);
        records.push(CatalogRecord::new(next_id, ra, dec, Some(rng.gen_range(1.0..500.0))));
        next_id += 1;
    }

    records
}

/// Creates `table` in an in-memory catalog and fills it with synthetic sources.
pub fn build_synthetic_catalog(
    config: &GeneratorConfig,
    table: &str,
) -> anyhow::Result<SqliteCatalog> {
    let mut catalog =
        SqliteCatalog::open_in_memory().context("opening in-memory synthetic catalog")?;
    catalog
        .create_table(table)
        .with_context(|| format!("creating synthetic table {}", table))?;
    let records = build_synthetic_records(config);
    catalog
        .insert_records(table, &records)
        .context("seeding synthetic catalog")?;
    Ok(catalog)
}
