//! Aggregation execution with pre-flight diagnostics.
//!
//! An empty aggregation result is ambiguous: the collection may be empty,
//! the pipeline may be structurally wrong, or the `$match` may simply have
//! excluded everything. Those cases look identical as a bare `[]`, and an
//! agent on the other end will happily "fix" the wrong one. Before
//! executing, the gateway counts the collection and tests the first
//! `$match` filter on its own; a zero match count short-circuits into an
//! empty result carrying a diagnostic object instead.
//!
//! Both counts are advisory. A store that cannot count (federated sources)
//! degrades them to unknown and execution proceeds.

use std::collections::HashMap;

use mongodb::bson::{doc, Document};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::error::GatewayError;
use crate::normalize::normalize_document;
use crate::pipeline::{bind_ids, first_match_filter, parse_pipeline};
use crate::store::DocumentStore;

/// Hint returned alongside a zero-match diagnostic.
pub const NO_MATCH_MESSAGE: &str =
    "No documents matched the pipeline's $match — check the field path, type, or value.";

/// Why an aggregation returned nothing: the filter excluded every document.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDiagnostic {
    pub collection: String,
    pub db_name: String,
    /// Total documents in the collection; `None` when the store cannot count.
    pub total_docs: Option<u64>,
    pub match_docs: u64,
    pub match_filter: JsonValue,
    pub message: String,
}

/// Result of one aggregation call.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub results: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<MatchDiagnostic>,
}

/// Parse, resolve, diagnose, and execute one aggregation request.
pub async fn run_aggregate(
    store: &dyn DocumentStore,
    index: &HashMap<String, String>,
    config: &Config,
    db_name: Option<&str>,
    collection: &str,
    raw_pipeline: &JsonValue,
) -> Result<AggregateOutcome, GatewayError> {
    let pipeline: Vec<Document> = parse_pipeline(raw_pipeline)?.iter().map(bind_ids).collect();

    let target_db = resolve_database(db_name, collection, index, config)?;

    let total_docs = match store.count(&target_db, collection, doc! {}).await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(
                "count_documents failed (maybe unsupported by federation): {}",
                e
            );
            None
        }
    };

    if let Some(filter) = first_match_filter(&pipeline) {
        let match_docs = match store.count(&target_db, collection, filter.clone()).await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(
                    "count_documents on $match failed: {} — falling back to find_one()",
                    e
                );
                match store.find_one(&target_db, collection, filter.clone()).await {
                    Ok(found) => Some(u64::from(found.is_some())),
                    Err(e2) => {
                        tracing::warn!("find_one fallback failed: {}", e2);
                        None
                    }
                }
            }
        };

        if match_docs == Some(0) {
            let diagnostic = MatchDiagnostic {
                collection: collection.to_string(),
                db_name: target_db,
                total_docs,
                match_docs: 0,
                match_filter: normalize_document(filter),
                message: NO_MATCH_MESSAGE.to_string(),
            };
            tracing::info!(
                "aggregate diagnostic for '{}': total_docs={:?}, match_docs=0",
                diagnostic.collection,
                diagnostic.total_docs
            );
            return Ok(AggregateOutcome {
                results: Vec::new(),
                debug: Some(diagnostic),
            });
        }
    }

    let mut documents = store
        .aggregate(&target_db, collection, pipeline)
        .await
        .map_err(GatewayError::Store)?;

    if config.aggregate.result_limit > 0 {
        documents.truncate(config.aggregate.result_limit);
    }

    let results = documents.iter().map(normalize_document).collect();
    Ok(AggregateOutcome {
        results,
        debug: None,
    })
}

/// Explicit name, else the collection index, else the configured default.
fn resolve_database(
    explicit: Option<&str>,
    collection: &str,
    index: &HashMap<String, String>,
    config: &Config,
) -> Result<String, GatewayError> {
    if let Some(db) = explicit {
        return Ok(db.to_string());
    }
    if let Some(db) = index.get(collection) {
        return Ok(db.clone());
    }
    if let Some(db) = &config.mongodb.default_db {
        return Ok(db.clone());
    }
    Err(GatewayError::UnresolvedDatabase(collection.to_string()))
}
