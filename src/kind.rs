//! Structural classification of document values.
//!
//! Collections in a schemaless store carry no declared types, so the gateway
//! names value kinds itself. [`ValueKind`] is a closed enumeration over the
//! categories a field can hold; [`ValueKind::of`] is total — every BSON
//! value maps to exactly one kind, with `Unknown` as the catch-all for
//! exotic types (Decimal128, regexes, JS code) that agents rarely query by.

use mongodb::bson::Bson;

/// The kind of a single document value, as reported in inferred schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Binary,
    Timestamp,
    ObjectId,
    Mapping,
    Sequence,
    Unknown,
}

impl ValueKind {
    /// Classify a BSON value. Total — never fails.
    pub fn of(value: &Bson) -> Self {
        match value {
            Bson::Null | Bson::Undefined => ValueKind::Null,
            Bson::Boolean(_) => ValueKind::Boolean,
            Bson::Int32(_) | Bson::Int64(_) => ValueKind::Integer,
            Bson::Double(_) => ValueKind::Double,
            Bson::String(_) | Bson::Symbol(_) => ValueKind::String,
            Bson::Binary(_) => ValueKind::Binary,
            Bson::DateTime(_) | Bson::Timestamp(_) => ValueKind::Timestamp,
            Bson::ObjectId(_) => ValueKind::ObjectId,
            Bson::Document(_) => ValueKind::Mapping,
            Bson::Array(_) => ValueKind::Sequence,
            _ => ValueKind::Unknown,
        }
    }

    /// Stable string tag used in schema responses. Wire format — do not
    /// rename without versioning the schema endpoint.
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Double => "floating-point",
            ValueKind::String => "string",
            ValueKind::Binary => "binary",
            ValueKind::Timestamp => "timestamp",
            ValueKind::ObjectId => "objectId",
            ValueKind::Mapping => "mapping",
            ValueKind::Sequence => "sequence",
            ValueKind::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime};

    #[test]
    fn test_primitives() {
        assert_eq!(ValueKind::of(&Bson::Null), ValueKind::Null);
        assert_eq!(ValueKind::of(&Bson::Boolean(true)), ValueKind::Boolean);
        assert_eq!(ValueKind::of(&Bson::Int32(1)), ValueKind::Integer);
        assert_eq!(ValueKind::of(&Bson::Int64(1)), ValueKind::Integer);
        assert_eq!(ValueKind::of(&Bson::Double(1.5)), ValueKind::Double);
        assert_eq!(
            ValueKind::of(&Bson::String("x".into())),
            ValueKind::String
        );
    }

    #[test]
    fn test_containers_and_store_types() {
        assert_eq!(
            ValueKind::of(&Bson::Document(doc! {"a": 1})),
            ValueKind::Mapping
        );
        assert_eq!(
            ValueKind::of(&Bson::Array(vec![Bson::Int32(1)])),
            ValueKind::Sequence
        );
        assert_eq!(
            ValueKind::of(&Bson::ObjectId(ObjectId::new())),
            ValueKind::ObjectId
        );
        assert_eq!(
            ValueKind::of(&Bson::DateTime(DateTime::from_millis(0))),
            ValueKind::Timestamp
        );
    }

    #[test]
    fn test_exotic_types_are_unknown() {
        let regex = Bson::RegularExpression(mongodb::bson::Regex {
            pattern: "^a".into(),
            options: "i".into(),
        });
        assert_eq!(ValueKind::of(&regex), ValueKind::Unknown);
    }

    #[test]
    fn test_tags_are_stable() {
        assert_eq!(ValueKind::Integer.tag(), "integer");
        assert_eq!(ValueKind::Double.tag(), "floating-point");
        assert_eq!(ValueKind::Timestamp.tag(), "timestamp");
        assert_eq!(ValueKind::ObjectId.tag(), "objectId");
    }
}
