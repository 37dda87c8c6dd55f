//! Field-path and type discovery for a single document.
//!
//! Walks a document recursively and produces a map of dotted field path →
//! set of observed [`ValueKind`] tags. Nested documents contribute paths
//! under `parent.child`; an array whose first element is a document
//! contributes paths under `parent[].child` (only the first element is
//! sampled — it stands in for the array's shape). Arrays of scalars are
//! tagged at the parent path only.
//!
//! The result is a `BTreeMap` of `BTreeSet`s so output is sorted and
//! independent of document key iteration order.

use std::collections::{BTreeMap, BTreeSet};

use mongodb::bson::{Bson, Document};

use crate::kind::ValueKind;

/// Per-document mapping from field path to the set of observed type tags.
pub type PathTypes = BTreeMap<String, BTreeSet<&'static str>>;

/// Extract every field path in `doc` with its observed type tags. Pure and
/// idempotent; pass `""` as the prefix for a top-level document.
pub fn extract_paths(doc: &Document, prefix: &str) -> PathTypes {
    let mut paths = PathTypes::new();
    for (key, value) in doc {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        paths
            .entry(path.clone())
            .or_default()
            .insert(ValueKind::of(value).tag());

        match value {
            Bson::Document(nested) => {
                merge_paths(&mut paths, extract_paths(nested, &path));
            }
            Bson::Array(items) => {
                if let Some(Bson::Document(first)) = items.first() {
                    merge_paths(&mut paths, extract_paths(first, &format!("{}[]", path)));
                }
            }
            _ => {}
        }
    }
    paths
}

/// Union `other` into `target`, merging tag sets per path rather than
/// overwriting.
pub fn merge_paths(target: &mut PathTypes, other: PathTypes) {
    for (path, tags) in other {
        target.entry(path).or_default().extend(tags);
    }
}
