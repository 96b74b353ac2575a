pub mod client;
pub mod query;
pub mod record;

pub use client::{CatalogError, CatalogStore, SqliteCatalog};
pub use query::{CatalogQuery, CatalogQueryBuilder};
pub use record::{CatalogRecord, SourceId};
