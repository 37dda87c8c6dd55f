//! Schema inference over sampled documents.
//!
//! Collections carry no declared schema, so the gateway derives one by
//! sampling: up to `sample_size` documents per collection are flattened,
//! path-extracted, and merged into a field-path → type-tag-set map. A path
//! holding different types across documents reports every tag it was seen
//! with — heterogeneity is an expected outcome, not an error. The first
//! sampled document, normalized, doubles as a worked example of the
//! collection's shape.
//!
//! Reports are cached per `(database, sample size)` with no eviction;
//! schema drift is only picked up across process restarts. Acceptable for
//! an introspection endpoint that is not the system of record.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use mongodb::bson::doc;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::extract::{extract_paths, merge_paths, PathTypes};
use crate::flatten::flatten_document;
use crate::kind::ValueKind;
use crate::normalize::normalize_document;
use crate::store::DocumentStore;

/// Field name treated as date-bearing even when no timestamp tag was
/// observed (a common export convention stores dates under this name as
/// wrapper objects, which extract as mappings).
pub const DATE_SENTINEL: &str = "Date";

/// Query-authoring guidance attached to timestamp-like fields.
pub const TIMESTAMP_HINT: &str = "Field may hold wrapped timestamp encodings; project year/month parts (e.g. $year/$month) and match on those instead of comparing the raw value directly.";

/// Observed types for one field path, plus optional authoring guidance.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntry {
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Field path → entry, for one collection.
pub type CollectionSchema = BTreeMap<String, SchemaEntry>;

/// Inferred schema and one normalized sample per collection of a database.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub schema: BTreeMap<String, CollectionSchema>,
    pub samples: BTreeMap<String, JsonValue>,
}

/// Infer the schema of every collection in `db_name` from up to
/// `sample_size` documents each. Empty collections report an empty map and
/// a null sample.
pub async fn build_schema(
    store: &dyn DocumentStore,
    db_name: &str,
    sample_size: usize,
) -> Result<SchemaReport> {
    let mut schema = BTreeMap::new();
    let mut samples = BTreeMap::new();

    for collection in store.collection_names(db_name).await? {
        let docs = store
            .find(db_name, &collection, doc! {}, sample_size as i64)
            .await?;

        if docs.is_empty() {
            schema.insert(collection.clone(), CollectionSchema::new());
            samples.insert(collection, JsonValue::Null);
            continue;
        }

        let flattened: Vec<_> = docs.iter().map(flatten_document).collect();

        let mut combined = PathTypes::new();
        for doc in &flattened {
            merge_paths(&mut combined, extract_paths(doc, ""));
        }

        let entries: CollectionSchema = combined
            .into_iter()
            .map(|(path, tags)| {
                let hint = guidance_for(&path, &tags).map(str::to_string);
                let types = tags.into_iter().map(str::to_string).collect();
                (path, SchemaEntry { types, hint })
            })
            .collect();

        samples.insert(collection.clone(), normalize_document(&flattened[0]));
        schema.insert(collection, entries);
    }

    Ok(SchemaReport { schema, samples })
}

fn guidance_for(
    path: &str,
    tags: &std::collections::BTreeSet<&'static str>,
) -> Option<&'static str> {
    if tags.contains(ValueKind::Timestamp.tag()) || path == DATE_SENTINEL {
        Some(TIMESTAMP_HINT)
    } else {
        None
    }
}

/// Memoized schema reports keyed by `(database, sample size)`.
///
/// No eviction: entries live until process exit. Concurrent callers for
/// the same key may compute redundantly; whoever finishes later overwrites
/// with an equivalent value, and readers only ever see a whole `Arc`.
pub struct SchemaCache {
    entries: Mutex<HashMap<(String, usize), Arc<SchemaReport>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, db_name: &str, sample_size: usize) -> Option<Arc<SchemaReport>> {
        self.entries
            .lock()
            .unwrap()
            .get(&(db_name.to_string(), sample_size))
            .cloned()
    }

    fn insert(&self, db_name: &str, sample_size: usize, report: Arc<SchemaReport>) {
        self.entries
            .lock()
            .unwrap()
            .insert((db_name.to_string(), sample_size), report);
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve a report from the cache, computing and publishing it on a miss.
/// The store is only touched on a miss; no lock is held across I/O.
pub async fn cached_schema(
    store: &dyn DocumentStore,
    cache: &SchemaCache,
    db_name: &str,
    sample_size: usize,
) -> Result<Arc<SchemaReport>> {
    if let Some(report) = cache.get(db_name, sample_size) {
        return Ok(report);
    }

    let report = Arc::new(build_schema(store, db_name, sample_size).await?);
    cache.insert(db_name, sample_size, report.clone());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_guidance_on_timestamp_tag() {
        let tags: BTreeSet<&'static str> = ["timestamp", "string"].into_iter().collect();
        assert_eq!(guidance_for("created_at", &tags), Some(TIMESTAMP_HINT));
    }

    #[test]
    fn test_guidance_on_date_sentinel_path() {
        let tags: BTreeSet<&'static str> = ["mapping"].into_iter().collect();
        assert_eq!(guidance_for("Date", &tags), Some(TIMESTAMP_HINT));
        assert_eq!(guidance_for("date", &tags), None);
    }

    #[test]
    fn test_cache_returns_same_arc() {
        let cache = SchemaCache::new();
        let report = Arc::new(SchemaReport {
            schema: BTreeMap::new(),
            samples: BTreeMap::new(),
        });
        cache.insert("app", 50, report.clone());

        let hit = cache.get("app", 50).unwrap();
        assert!(Arc::ptr_eq(&hit, &report));
        // A different sample size is a different key
        assert!(cache.get("app", 10).is_none());
    }
}
