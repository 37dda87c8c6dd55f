//! Pipeline parsing and identifier binding.
//!
//! Inbound pipelines arrive as JSON — either an array of stage objects or
//! an array of JSON-serialized stage strings (some agent frameworks can
//! only emit string lists). Both forms parse to BSON stage documents here.
//!
//! Callers express document ids as 24-char hex strings, but the store
//! compares ids in their canonical binary form, so an id filter written
//! naturally (`{"_id": "65a..."}`) matches nothing. [`bind_ids`] rewrites
//! string ids under `_id` keys — including `$in` member lists — to
//! canonical form. The transform is pure: it returns new documents and
//! never mutates caller input.

use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde_json::Value as JsonValue;

use crate::error::GatewayError;

/// Field name of the canonical per-document unique identifier.
pub const ID_FIELD: &str = "_id";

/// Parse a raw JSON pipeline into BSON stage documents.
///
/// Accepts stage objects and JSON-string stages (in any mix). Any
/// unparseable or non-object stage fails the whole call as a client error.
pub fn parse_pipeline(raw: &JsonValue) -> Result<Vec<Document>, GatewayError> {
    let stages = raw.as_array().ok_or_else(|| {
        GatewayError::InvalidRequest("pipeline must be an array of stages".to_string())
    })?;

    let mut pipeline = Vec::with_capacity(stages.len());
    for (i, stage) in stages.iter().enumerate() {
        let value = match stage {
            JsonValue::String(s) => serde_json::from_str::<JsonValue>(s).map_err(|e| {
                GatewayError::InvalidRequest(format!("pipeline stage {} is not valid JSON: {}", i, e))
            })?,
            other => other.clone(),
        };

        if !value.is_object() {
            return Err(GatewayError::InvalidRequest(format!(
                "pipeline stage {} must be an object",
                i
            )));
        }

        let doc = bson::to_document(&value).map_err(|e| {
            GatewayError::InvalidRequest(format!("pipeline stage {} is not a valid document: {}", i, e))
        })?;
        pipeline.push(doc);
    }

    Ok(pipeline)
}

/// Rewrite string-form ids in a stage to canonical [`ObjectId`]s,
/// returning a new document.
///
/// Under a key named `_id`: a valid hex string converts; a document with a
/// `$in` array has its valid-hex string members converted (other members
/// kept); any other document or array is walked recursively in case ids
/// sit deeper. Values under other keys are walked recursively too.
pub fn bind_ids(stage: &Document) -> Document {
    stage
        .iter()
        .map(|(key, value)| {
            let bound = if key == ID_FIELD {
                bind_id_value(value)
            } else {
                bind_nested(value)
            };
            (key.clone(), bound)
        })
        .collect()
}

fn bind_id_value(value: &Bson) -> Bson {
    match value {
        Bson::String(s) => match ObjectId::parse_str(s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => value.clone(),
        },
        Bson::Document(doc) if matches!(doc.get("$in"), Some(Bson::Array(_))) => {
            let converted = doc
                .iter()
                .map(|(key, val)| {
                    let new_val = if key == "$in" {
                        match val {
                            Bson::Array(items) => Bson::Array(
                                items.iter().map(|item| bind_id_value(item)).collect(),
                            ),
                            other => other.clone(),
                        }
                    } else {
                        bind_nested(val)
                    };
                    (key.clone(), new_val)
                })
                .collect();
            Bson::Document(converted)
        }
        other => bind_nested(other),
    }
}

fn bind_nested(value: &Bson) -> Bson {
    match value {
        Bson::Document(doc) => Bson::Document(bind_ids(doc)),
        Bson::Array(items) => Bson::Array(items.iter().map(bind_nested).collect()),
        other => other.clone(),
    }
}

/// The filter of the first stage carrying a `$match` whose payload is a
/// document, if any.
pub fn first_match_filter(pipeline: &[Document]) -> Option<&Document> {
    pipeline
        .iter()
        .find_map(|stage| stage.get_document("$match").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    const HEX: &str = "65a1b2c3d4e5f6a7b8c9d0e1";

    #[test]
    fn test_parse_object_stages() {
        let raw = json!([{"$match": {"a": 1}}, {"$limit": 5}]);
        let pipeline = parse_pipeline(&raw).unwrap();
        assert_eq!(pipeline.len(), 2);
        // JSON integers come through as 64-bit
        assert_eq!(pipeline[0], doc! {"$match": {"a": 1i64}});
    }

    #[test]
    fn test_parse_string_stages() {
        let raw = json!([r#"{"$match": {"a": 1}}"#, r#"{"$limit": 5}"#]);
        let pipeline = parse_pipeline(&raw).unwrap();
        assert_eq!(pipeline[1], doc! {"$limit": 5i64});
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_pipeline(&json!({"$match": {}})).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_parse_rejects_bad_stage_json() {
        let err = parse_pipeline(&json!(["{not json"])).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("stage 0"));
    }

    #[test]
    fn test_parse_rejects_non_object_stage() {
        let err = parse_pipeline(&json!([42])).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_bind_converts_id_string() {
        let stage = doc! {"$match": {"_id": HEX}};
        let bound = bind_ids(&stage);
        let id = bound.get_document("$match").unwrap().get(ID_FIELD).unwrap();
        assert_eq!(*id, Bson::ObjectId(ObjectId::parse_str(HEX).unwrap()));
    }

    #[test]
    fn test_bind_converts_in_members() {
        let stage = doc! {"$match": {"_id": {"$in": [HEX, "not-an-id"]}}};
        let bound = bind_ids(&stage);
        let members = bound
            .get_document("$match")
            .unwrap()
            .get_document(ID_FIELD)
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert_eq!(
            members[0],
            Bson::ObjectId(ObjectId::parse_str(HEX).unwrap())
        );
        assert_eq!(members[1], Bson::String("not-an-id".to_string()));
    }

    #[test]
    fn test_bind_leaves_invalid_hex_alone() {
        let stage = doc! {"$match": {"_id": "short"}};
        assert_eq!(bind_ids(&stage), stage);
    }

    #[test]
    fn test_bind_walks_other_keys_recursively() {
        let stage = doc! {"$match": {"$or": [{"_id": HEX}, {"status": "open"}]}};
        let bound = bind_ids(&stage);
        let or = bound.get_document("$match").unwrap().get_array("$or").unwrap();
        let first = or[0].as_document().unwrap();
        assert!(matches!(first.get(ID_FIELD), Some(Bson::ObjectId(_))));
        assert_eq!(or[1], Bson::Document(doc! {"status": "open"}));
    }

    #[test]
    fn test_bind_does_not_mutate_input() {
        let stage = doc! {"$match": {"_id": HEX}};
        let before = stage.clone();
        let _ = bind_ids(&stage);
        assert_eq!(stage, before);
    }

    #[test]
    fn test_first_match_filter() {
        let pipeline = vec![
            doc! {"$sort": {"a": 1}},
            doc! {"$match": {"status": "open"}},
            doc! {"$match": {"status": "closed"}},
        ];
        assert_eq!(
            first_match_filter(&pipeline),
            Some(&doc! {"status": "open"})
        );
        assert_eq!(first_match_filter(&[doc! {"$limit": 1}]), None);
    }

    #[test]
    fn test_first_match_skips_non_document_payload() {
        let pipeline = vec![doc! {"$match": 3}, doc! {"$match": {"a": 1}}];
        assert_eq!(first_match_filter(&pipeline), Some(&doc! {"a": 1}));
    }
}
