//! Wire-level documents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single hit as returned by the store
///
/// The identity travels out-of-band from the field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            score: None,
            source,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// One page of a scrolled search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    /// Token continuing this search, if the store opened a cursor
    pub cursor: Option<String>,
    pub hits: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_hit() {
        let doc: Document = serde_json::from_value(json!({
            "_index": "articles",
            "_id": "7",
            "_score": 1.5,
            "_source": {"title": "hi"}
        }))
        .unwrap();
        assert_eq!(doc.id, "7");
        assert_eq!(doc.score, Some(1.5));
        assert_eq!(doc.source["title"], "hi");
    }

    #[test]
    fn test_decode_sorted_hit_without_score() {
        let doc: Document =
            serde_json::from_value(json!({"_id": "7", "_score": null, "_source": {}})).unwrap();
        assert_eq!(doc.score, None);
    }
}
