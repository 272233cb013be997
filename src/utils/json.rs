use bson::{Bson, Document as BsonDocument};
use serde_json::Value;

use crate::errors::AggError;

/// Converts a JSON value to BSON. Integers that fit in 32 bits become `Int32`,
/// wider integers `Int64`, everything else numeric `Double`.
#[must_use]
pub fn json_to_bson(val: &Value) -> Bson {
    match val {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter().map(|(k, v)| (k.clone(), json_to_bson(v))).collect::<BsonDocument>(),
        ),
    }
}

/// Convert a `serde_json::Value` that must be an object into a `bson::Document`.
///
/// # Errors
/// Returns `Decode` when the value is not a JSON object.
pub fn json_value_to_bson_document(val: &Value) -> Result<BsonDocument, AggError> {
    match json_to_bson(val) {
        Bson::Document(d) => Ok(d),
        _ => Err(AggError::Decode("expected JSON object".into())),
    }
}

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
///
/// # Errors
/// Returns `Json` on malformed input and `Decode` for non-object values.
pub fn parse_json_to_bson_document(json: &str) -> Result<BsonDocument, AggError> {
    let val: Value = serde_json::from_str(json)?;
    json_value_to_bson_document(&val)
}

/// Serializes a document on one line, the way NDJSON output is written.
///
/// # Errors
/// Returns `Json` if serialization fails.
pub fn document_to_json_line(doc: &BsonDocument) -> Result<String, AggError> {
    Ok(serde_json::to_string(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_bson_success() {
        let d = parse_json_to_bson_document("{\"a\":1,\"b\":\"x\",\"c\":{\"d\":2.5}}").unwrap();
        assert_eq!(d.get_i32("a").unwrap(), 1);
        assert_eq!(d.get_str("b").unwrap(), "x");
        assert_eq!(d.get_document("c").unwrap().get_f64("d").unwrap(), 2.5);
    }

    #[test]
    fn wide_integers_become_int64() {
        let d = parse_json_to_bson_document("{\"n\":9000000000}").unwrap();
        assert_eq!(d.get_i64("n").unwrap(), 9_000_000_000);
    }

    #[test]
    fn json_to_bson_rejects_array() {
        let e = parse_json_to_bson_document("[1,2,3]").unwrap_err();
        assert!(matches!(e, AggError::Decode(_)));
    }

    #[test]
    fn document_line_is_compact() {
        let line = document_to_json_line(&bson::doc! {"_id": "Fiction", "count": 2_i64}).unwrap();
        assert_eq!(line, "{\"_id\":\"Fiction\",\"count\":2}");
    }
}
