//! JSON-safe value normalization.
//!
//! Documents leave the store carrying types JSON cannot express — object
//! ids, binary blobs, dates — and, when they were written through export
//! paths, wrapper objects like `{"$numberLong": "42"}` standing in for
//! native numbers. `normalize` converts any BSON value into a plain JSON
//! value: wrappers are decoded, ids become hex strings, binary becomes
//! base64, dates become ISO-8601 strings. The function is total — an
//! unrecognized leaf turns into a debug string rather than failing the
//! whole response.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Local, TimeZone};
use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// Convert a BSON value into a JSON-representable value. Never fails.
pub fn normalize(value: &Bson) -> JsonValue {
    match value {
        Bson::Document(doc) => normalize_document(doc),
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::Binary(bin) => JsonValue::String(STANDARD.encode(&bin.bytes)),
        Bson::DateTime(dt) => JsonValue::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| format!("{:?}", dt)),
        ),
        Bson::Array(items) => JsonValue::Array(items.iter().map(normalize).collect()),
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Int32(n) => JsonValue::from(*n),
        Bson::Int64(n) => JsonValue::from(*n),
        Bson::Double(f) => json_double(*f),
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Null => JsonValue::Null,
        Bson::Decimal128(d) => JsonValue::String(d.to_string()),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Convert a whole document. Wrapper decoding takes priority over generic
/// mapping handling.
pub fn normalize_document(doc: &Document) -> JsonValue {
    if let Some(number) = unwrap_number(doc) {
        return number;
    }
    if let Some(date) = unwrap_date(doc) {
        return date;
    }
    JsonValue::Object(
        doc.iter()
            .map(|(key, val)| (key.clone(), normalize(val)))
            .collect(),
    )
}

/// Decode `$numberInt` / `$numberLong` / `$numberDouble` wrappers into
/// native JSON numbers. Wrapper payloads are strings in canonical extended
/// JSON but show up as native numbers too; both are accepted. Returns
/// `None` when the payload doesn't decode, letting the caller fall back to
/// generic mapping handling.
fn unwrap_number(doc: &Document) -> Option<JsonValue> {
    if let Some(payload) = doc.get("$numberInt") {
        return match payload {
            Bson::String(s) => s.parse::<i32>().ok().map(JsonValue::from),
            Bson::Int32(n) => Some(JsonValue::from(*n)),
            Bson::Int64(n) => Some(JsonValue::from(*n)),
            _ => None,
        };
    }
    if let Some(payload) = doc.get("$numberLong") {
        return match payload {
            Bson::String(s) => s.parse::<i64>().ok().map(JsonValue::from),
            Bson::Int32(n) => Some(JsonValue::from(i64::from(*n))),
            Bson::Int64(n) => Some(JsonValue::from(*n)),
            _ => None,
        };
    }
    if let Some(payload) = doc.get("$numberDouble") {
        return match payload {
            Bson::String(s) => s.parse::<f64>().ok().map(json_double),
            Bson::Double(f) => Some(json_double(*f)),
            Bson::Int32(n) => Some(json_double(f64::from(*n))),
            Bson::Int64(n) => Some(json_double(*n as f64)),
            _ => None,
        };
    }
    None
}

/// Decode a `$date` wrapper carrying epoch milliseconds (native integer or
/// a nested `$numberLong`) into an ISO-8601 string in local time.
fn unwrap_date(doc: &Document) -> Option<JsonValue> {
    let millis = match doc.get("$date")? {
        Bson::Int64(ms) => *ms,
        Bson::Int32(ms) => i64::from(*ms),
        Bson::Double(ms) => *ms as i64,
        Bson::DateTime(dt) => dt.timestamp_millis(),
        Bson::Document(inner) => match inner.get("$numberLong") {
            Some(Bson::String(s)) => s.parse::<i64>().ok()?,
            Some(Bson::Int64(ms)) => *ms,
            _ => return None,
        },
        _ => return None,
    };
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| JsonValue::String(dt.to_rfc3339()))
}

/// NaN and infinities have no JSON number form; render those as strings.
fn json_double(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(f.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{bson, oid::ObjectId, spec::BinarySubtype, Binary, DateTime};
    use serde_json::json;

    #[test]
    fn test_primitives_unchanged() {
        assert_eq!(normalize(&bson!(7)), json!(7));
        assert_eq!(normalize(&bson!(2.5)), json!(2.5));
        assert_eq!(normalize(&bson!("hello")), json!("hello"));
        assert_eq!(normalize(&bson!(true)), json!(true));
        assert_eq!(normalize(&Bson::Null), JsonValue::Null);
    }

    #[test]
    fn test_object_id_to_hex() {
        let oid = ObjectId::new();
        assert_eq!(normalize(&Bson::ObjectId(oid)), json!(oid.to_hex()));
    }

    #[test]
    fn test_object_id_round_trip() {
        let oid = ObjectId::new();
        let JsonValue::String(hex) = normalize(&Bson::ObjectId(oid)) else {
            panic!("expected string");
        };
        assert_eq!(ObjectId::parse_str(&hex).unwrap(), oid);
    }

    #[test]
    fn test_binary_to_base64() {
        let bin = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: b"hi".to_vec(),
        });
        assert_eq!(normalize(&bin), json!("aGk="));
    }

    #[test]
    fn test_datetime_to_iso() {
        let v = normalize(&Bson::DateTime(DateTime::from_millis(0)));
        assert_eq!(v, json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_number_wrappers_decoded() {
        assert_eq!(normalize(&bson!({"$numberInt": "42"})), json!(42));
        assert_eq!(
            normalize(&bson!({"$numberLong": "9000000000"})),
            json!(9000000000i64)
        );
        assert_eq!(normalize(&bson!({"$numberDouble": "1.5"})), json!(1.5));
        // Native payloads are accepted too
        assert_eq!(normalize(&bson!({"$numberLong": 3i64})), json!(3));
    }

    #[test]
    fn test_date_wrapper_decoded_to_local_iso() {
        let expected = Local
            .timestamp_millis_opt(86_400_000)
            .single()
            .unwrap()
            .to_rfc3339();
        assert_eq!(
            normalize(&bson!({"$date": 86_400_000i64})),
            json!(expected)
        );
        assert_eq!(
            normalize(&bson!({"$date": {"$numberLong": "86400000"}})),
            json!(expected)
        );
    }

    #[test]
    fn test_undecodable_wrapper_falls_back_to_mapping() {
        let v = normalize(&bson!({"$numberInt": "not a number"}));
        assert_eq!(v, json!({"$numberInt": "not a number"}));
    }

    #[test]
    fn test_nested_structures_normalized_recursively() {
        let v = normalize(&bson!({
            "n": {"$numberInt": "1"},
            "items": [{"$numberDouble": "0.5"}, "plain"],
        }));
        assert_eq!(v, json!({"n": 1, "items": [0.5, "plain"]}));
    }

    #[test]
    fn test_unrecognized_leaf_becomes_string() {
        let ts = Bson::Timestamp(mongodb::bson::Timestamp {
            time: 1,
            increment: 2,
        });
        assert!(matches!(normalize(&ts), JsonValue::String(_)));
    }

    #[test]
    fn test_non_finite_double_becomes_string() {
        assert_eq!(normalize(&bson!(f64::NAN)), json!("NaN"));
    }
}
