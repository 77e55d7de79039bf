use crate::corpus::{record_array, LoadReport};
use crate::error::{LoadError, RecordError};
use crate::resource::open_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 6;

/// One autocomplete candidate from the ingredient catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCatalogEntry {
    pub id: String,
    pub ingredient_id: String,
    pub search_value: String,
    pub term: String,
    /// Popularity; higher ranks first.
    pub use_count: u64,
}

#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub entries: Vec<IngredientCatalogEntry>,
    pub report: LoadReport,
}

impl CatalogLoad {
    pub fn skipped(&self) -> usize { self.report.skipped }
}

pub fn load_catalog(path: &Path) -> Result<CatalogLoad, LoadError> {
    let reader = open_resource(path)?;
    let load = load_catalog_from_reader(reader)?;
    tracing::info!(
        path = %path.display(),
        entries = load.entries.len(),
        skipped = load.report.skipped,
        "loaded ingredient catalog"
    );
    Ok(load)
}

pub fn load_catalog_from_reader<R: Read>(reader: R) -> Result<CatalogLoad, LoadError> {
    let value: Value = serde_json::from_reader(reader)?;
    decode_catalog(value)
}

pub fn load_catalog_from_str(text: &str) -> Result<CatalogLoad, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    decode_catalog(value)
}

fn decode_catalog(value: Value) -> Result<CatalogLoad, LoadError> {
    let mut load = CatalogLoad::default();
    for (position, record) in record_array(value)?.into_iter().enumerate() {
        if !record.is_object() {
            load.report.skip(position, None, RecordError::NotAnObject);
            continue;
        }
        match serde_json::from_value::<IngredientCatalogEntry>(record) {
            Ok(entry) => load.entries.push(entry),
            Err(e) => load.report.skip(position, None, RecordError::Invalid(e.to_string())),
        }
    }
    Ok(load)
}

/// Autocomplete: entries whose search value or term contains `query` (case-insensitive),
/// most used first, at most `limit`.
///
/// A blank query suggests nothing; that is a different state from a query that matched
/// nothing, even though both come back empty.
pub fn suggest<'a>(catalog: &'a [IngredientCatalogEntry], query: &str, limit: usize) -> Vec<&'a IngredientCatalogEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<&IngredientCatalogEntry> = catalog
        .iter()
        .filter(|e| e.search_value.to_lowercase().contains(&needle) || e.term.to_lowercase().contains(&needle))
        .collect();
    hits.sort_by(|a, b| b.use_count.cmp(&a.use_count));
    hits.truncate(limit);
    hits
}
