//! Folding `{"data": [...]}` documents into one
use crate::error::{ExportError, Result};
use serde_json::{Value, json};

/// An empty merged result
#[must_use]
pub fn empty_result() -> Value {
    json!({ "data": [] })
}

/// Concatenate two `{"data": [...]}` documents.
///
/// `None` stands for "no prior result" and acts as the identity on either
/// side. When both sides are present, each must carry a `data` field; a
/// non-array `data` is treated as a single-element array, and the result is
/// `{"data": left.data ++ right.data}` with order preserved.
///
/// # Errors
///
/// Returns [`ExportError::Schema`] if a present side is not a JSON object
/// or lacks the `data` field.
pub fn concat_data(left: Option<Value>, right: Option<Value>) -> Result<Option<Value>> {
    match (left, right) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => Ok(Some(only)),
        (Some(left), Some(right)) => {
            let mut items = take_data(left)?;
            items.append(&mut take_data(right)?);
            Ok(Some(json!({ "data": items })))
        }
    }
}

/// Pull the `data` field out of a document as a list of entries
fn take_data(document: Value) -> Result<Vec<Value>> {
    let Value::Object(mut fields) = document else {
        return Err(ExportError::Schema(
            "merge input is not a JSON object".to_string(),
        ));
    };

    match fields.remove("data") {
        Some(Value::Array(items)) => Ok(items),
        // An explicit null counts as empty, not as one null entry
        Some(Value::Null) => Ok(Vec::new()),
        Some(single) => Ok(vec![single]),
        None => Err(ExportError::Schema(
            "merge input has no `data` field".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(items: Vec<i64>) -> Value {
        json!({ "data": items })
    }

    #[test]
    fn test_nil_identities() {
        assert_eq!(concat_data(None, None).unwrap(), None);

        let result = concat_data(Some(doc(vec![1])), None).unwrap();
        assert_eq!(result, Some(doc(vec![1])));

        let result = concat_data(None, Some(doc(vec![2]))).unwrap();
        assert_eq!(result, Some(doc(vec![2])));
    }

    #[test]
    fn test_concatenation_preserves_order() {
        let result = concat_data(Some(doc(vec![1, 2])), Some(doc(vec![3])))
            .unwrap()
            .unwrap();
        assert_eq!(result, doc(vec![1, 2, 3]));
    }

    #[test]
    fn test_associativity() {
        let (a, b, c) = (doc(vec![1]), doc(vec![2, 3]), doc(vec![4]));

        let left_first = concat_data(
            concat_data(Some(a.clone()), Some(b.clone())).unwrap(),
            Some(c.clone()),
        )
        .unwrap();
        let right_first =
            concat_data(Some(a), concat_data(Some(b), Some(c)).unwrap()).unwrap();

        assert_eq!(left_first, right_first);
    }

    #[test]
    fn test_single_object_data_is_wrapped() {
        let single = json!({ "data": { "event-id": "e1" } });
        let result = concat_data(Some(single), Some(doc(vec![7])))
            .unwrap()
            .unwrap();
        assert_eq!(result, json!({ "data": [{ "event-id": "e1" }, 7] }));
    }

    #[test]
    fn test_null_data_counts_as_empty() {
        let result = concat_data(Some(json!({ "data": null })), Some(doc(vec![1])))
            .unwrap()
            .unwrap();
        assert_eq!(result, doc(vec![1]));
    }

    #[test]
    fn test_missing_data_field_is_schema_error() {
        let result = concat_data(Some(json!({ "items": [] })), Some(doc(vec![1])));
        assert!(matches!(result, Err(ExportError::Schema(_))));
    }

    #[test]
    fn test_non_object_input_is_schema_error() {
        let result = concat_data(Some(json!([1, 2])), Some(doc(vec![1])));
        assert!(matches!(result, Err(ExportError::Schema(_))));
    }

    #[test]
    fn test_empty_sides_merge_to_empty() {
        let result = concat_data(Some(empty_result()), Some(empty_result()))
            .unwrap()
            .unwrap();
        assert_eq!(result, empty_result());
    }
}
