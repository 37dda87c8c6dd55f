//! Array un-nesting.
//!
//! Export tooling and careless writers produce arrays of arrays
//! (`[[{...}], [{...}]]`) where a flat array was meant. Schema extraction
//! only samples the first element of an array, so a nested wrapper would
//! hide every field behind it. `flatten` collapses nesting before
//! extraction: elements are flattened bottom-up, then any arrays appearing
//! directly inside an array are spliced in place. Because children are
//! already flat when the splice happens, one splice per level fully
//! flattens arbitrarily deep nesting.

use mongodb::bson::{Bson, Document};

/// Recursively flatten nested arrays within a value. Documents are
/// flattened value-wise; scalars pass through untouched.
pub fn flatten(value: &Bson) -> Bson {
    match value {
        Bson::Array(items) => {
            let items: Vec<Bson> = items.iter().map(flatten).collect();
            if items.iter().any(|v| matches!(v, Bson::Array(_))) {
                let mut spliced = Vec::new();
                for item in items {
                    match item {
                        Bson::Array(inner) => spliced.extend(inner),
                        other => spliced.push(other),
                    }
                }
                Bson::Array(spliced)
            } else {
                Bson::Array(items)
            }
        }
        Bson::Document(doc) => Bson::Document(flatten_document(doc)),
        other => other.clone(),
    }
}

/// Flatten every value of a document, keeping keys and their order.
pub fn flatten_document(doc: &Document) -> Document {
    doc.iter()
        .map(|(key, value)| (key.clone(), flatten(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{bson, doc};

    #[test]
    fn test_flat_array_unchanged() {
        let v = bson!([1, "two", 3.0]);
        assert_eq!(flatten(&v), v);
    }

    #[test]
    fn test_one_level_nesting_collapses() {
        let v = bson!([[1, 2], [3], 4]);
        assert_eq!(flatten(&v), bson!([1, 2, 3, 4]));
    }

    #[test]
    fn test_deep_nesting_fully_collapses() {
        let v = bson!([[[1]], [[2, [3]]]]);
        assert_eq!(flatten(&v), bson!([1, 2, 3]));
    }

    #[test]
    fn test_documents_flattened_value_wise() {
        let v = bson!({"tags": [["a"], ["b", "c"]], "n": 1});
        assert_eq!(flatten(&v), bson!({"tags": ["a", "b", "c"], "n": 1}));
    }

    #[test]
    fn test_nested_document_inside_array_kept() {
        let v = bson!([[{"a": [[1], 2]}]]);
        assert_eq!(flatten(&v), bson!([{"a": [1, 2]}]));
    }

    #[test]
    fn test_idempotent() {
        let v = bson!([[1, [2]], {"k": [[3]]}]);
        let once = flatten(&v);
        assert_eq!(flatten(&once), once);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(flatten(&bson!(42)), bson!(42));
        assert_eq!(flatten(&Bson::Null), Bson::Null);
    }

    #[test]
    fn test_flatten_document_keeps_key_order() {
        let d = doc! {"b": [[1]], "a": 2};
        let flat = flatten_document(&d);
        let keys: Vec<&str> = flat.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
