//! Database and collection discovery.
//!
//! Agents rarely know which database owns the collection they were told
//! about, so at startup the gateway enumerates every non-system database
//! and builds a reverse index from collection name to owning database. The
//! index is built as a local value and published read-only behind an `Arc`
//! before traffic is served; it is never mutated afterwards.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::store::DocumentStore;

/// Databases owned by the deployment itself, skipped during discovery.
pub const SYSTEM_DATABASES: [&str; 3] = ["admin", "config", "local"];

fn is_system(db: &str) -> bool {
    SYSTEM_DATABASES.contains(&db)
}

/// Map of database name → collection names, for every non-system database.
pub async fn list_databases(store: &dyn DocumentStore) -> Result<BTreeMap<String, Vec<String>>> {
    let mut out = BTreeMap::new();
    for db in store.database_names().await? {
        if is_system(&db) {
            continue;
        }
        let collections = store.collection_names(&db).await?;
        out.insert(db, collections);
    }
    Ok(out)
}

/// Build the collection → database index by full enumeration.
///
/// On a name collision the later-enumerated database wins; a warning names
/// both sides. Enumeration failure propagates — at startup that is fatal.
pub async fn build_collection_index(store: &dyn DocumentStore) -> Result<HashMap<String, String>> {
    let mut index = HashMap::new();
    for db in store.database_names().await? {
        if is_system(&db) {
            continue;
        }
        for collection in store.collection_names(&db).await? {
            if let Some(previous) = index.insert(collection.clone(), db.clone()) {
                tracing::warn!(
                    "collection '{}' exists in both '{}' and '{}'; inference will use '{}'",
                    collection,
                    previous,
                    db,
                    db
                );
            }
        }
    }
    Ok(index)
}
