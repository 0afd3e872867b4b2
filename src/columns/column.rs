//! Column definitions and per-column conversion

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// A column as declared on the foreign table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Base type name as reported by the host, e.g. `text` or `jsonb`
    pub type_name: String,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Whether the host stores this column as JSON
    pub fn is_json(&self) -> bool {
        self.type_name.eq_ignore_ascii_case("json") || self.type_name.eq_ignore_ascii_case("jsonb")
    }
}

/// Role a column plays when mapped onto a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "name", rename_all = "lowercase")]
pub enum ColumnSpec {
    /// The document identity, carried outside the field map
    Identity(String),
    /// The relevance score of a search hit
    Score(String),
    /// JSON-typed column; structured values are exchanged as JSON text
    Json(String),
    /// Any other column; values are copied verbatim
    Plain(String),
}

impl ColumnSpec {
    pub fn name(&self) -> &str {
        match self {
            ColumnSpec::Identity(name)
            | ColumnSpec::Score(name)
            | ColumnSpec::Json(name)
            | ColumnSpec::Plain(name) => name,
        }
    }

    /// Whether the column is backed by a field in the document body
    pub fn is_field(&self) -> bool {
        matches!(self, ColumnSpec::Json(_) | ColumnSpec::Plain(_))
    }

    /// Extract this column's value from a document
    ///
    /// Returns `None` when a field-backed column is absent from the document.
    pub fn deserialize(&self, document: &Document) -> Option<Value> {
        match self {
            ColumnSpec::Identity(_) => Some(Value::String(document.id.clone())),
            ColumnSpec::Score(_) => Some(document.score.map(Value::from).unwrap_or(Value::Null)),
            ColumnSpec::Plain(name) => document.source.get(name).cloned(),
            ColumnSpec::Json(name) => document.source.get(name).map(encode_json),
        }
    }

    /// Convert a row value into its document representation
    ///
    /// Returns `None` for identity and score, which never travel in the body.
    pub fn serialize(&self, value: Value) -> Option<Value> {
        match self {
            ColumnSpec::Identity(_) | ColumnSpec::Score(_) => None,
            ColumnSpec::Plain(_) => Some(value),
            ColumnSpec::Json(_) => Some(decode_json(value)),
        }
    }
}

/// Lists, maps, strings and null become JSON text; numbers and bools pass through
fn encode_json(value: &Value) -> Value {
    match value {
        Value::Number(_) | Value::Bool(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

/// JSON text is parsed back into structured JSON
///
/// Text that does not parse is kept as a plain string.
fn decode_json(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn document() -> Document {
        let source = json!({"title": "hi", "tags": ["a", "b"], "meta": {"k": 1}, "n": 3});
        let Value::Object(source) = source else { unreachable!() };
        Document::new("7", source).with_score(0.5)
    }

    #[test]
    fn test_json_type_detection() {
        assert!(ColumnDefinition::new("a", "json").is_json());
        assert!(ColumnDefinition::new("a", "JSONB").is_json());
        assert!(!ColumnDefinition::new("a", "text").is_json());
        assert!(!ColumnDefinition::new("a", "jsonpath").is_json());
    }

    #[test]
    fn test_reserved_columns_read_slots() {
        let doc = document();
        assert_eq!(ColumnSpec::Identity("id".into()).deserialize(&doc), Some(json!("7")));
        assert_eq!(ColumnSpec::Score("score".into()).deserialize(&doc), Some(json!(0.5)));

        let unscored = Document::new("8", Map::new());
        assert_eq!(
            ColumnSpec::Score("score".into()).deserialize(&unscored),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_json_column_encodes_structures_only() {
        let doc = document();
        assert_eq!(
            ColumnSpec::Json("tags".into()).deserialize(&doc),
            Some(json!("[\"a\",\"b\"]"))
        );
        assert_eq!(
            ColumnSpec::Json("meta".into()).deserialize(&doc),
            Some(json!("{\"k\":1}"))
        );
        assert_eq!(ColumnSpec::Json("n".into()).deserialize(&doc), Some(json!(3)));
        assert_eq!(ColumnSpec::Json("absent".into()).deserialize(&doc), None);
    }

    #[test]
    fn test_json_column_scalar_text_survives_round_trip() {
        let column = ColumnSpec::Json("payload".into());
        for text in ["\"hi\"", "null", "\"\"", "[]"] {
            let Some(stored) = column.serialize(json!(text)) else {
                panic!("json column must serialize");
            };
            let mut source = Map::new();
            source.insert("payload".into(), stored);
            let doc = Document::new("7", source);
            assert_eq!(column.deserialize(&doc), Some(json!(text)), "text {}", text);
        }

        let mut source = Map::new();
        source.insert("payload".into(), json!(true));
        let doc = Document::new("7", source);
        assert_eq!(column.deserialize(&doc), Some(json!(true)));
    }

    #[test]
    fn test_plain_column_is_verbatim() {
        let doc = document();
        assert_eq!(
            ColumnSpec::Plain("tags".into()).deserialize(&doc),
            Some(json!(["a", "b"]))
        );
        assert_eq!(
            ColumnSpec::Plain("tags".into()).serialize(json!(["x"])),
            Some(json!(["x"]))
        );
    }

    #[test]
    fn test_json_serialize_parses_text() {
        let column = ColumnSpec::Json("tags".into());
        assert_eq!(column.serialize(json!("[\"a\",\"b\"]")), Some(json!(["a", "b"])));
        assert_eq!(column.serialize(json!("not json")), Some(json!("not json")));
        assert_eq!(column.serialize(json!({"k": 1})), Some(json!({"k": 1})));
    }

    #[test]
    fn test_reserved_columns_never_serialize() {
        assert_eq!(ColumnSpec::Identity("id".into()).serialize(json!("7")), None);
        assert_eq!(ColumnSpec::Score("s".into()).serialize(json!(1.0)), None);
    }
}
