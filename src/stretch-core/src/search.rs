use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A single search hit or stored document
pub type Document = Map<String, Value>;

/// Hit metadata copied onto every normalized result
const HIT_METADATA: [&str; 4] = ["_score", "_id", "_index", "_type"];

/// Search response with hits flattened into documents.
///
/// Each result is the hit's `_source` (or its `fields` when the source was
/// not loaded) merged with the hit metadata and, if the query asked for
/// highlighting, a `_highlight` map. Hit order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    raw: Value,
    total: u64,
    results: Vec<Document>,
}

impl SearchResults {
    pub fn new(raw: Value) -> Self {
        let hits = raw.get("hits");

        let total = hits
            .and_then(|h| h.get("total"))
            .map(read_total)
            .unwrap_or(0);

        let results = hits
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(normalize_hit).collect())
            .unwrap_or_default();

        Self {
            raw,
            total,
            results,
        }
    }

    /// Total number of matching documents reported by the server
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn facets(&self) -> Option<&Value> {
        self.raw.get("facets")
    }

    pub fn aggregations(&self) -> Option<&Value> {
        self.raw.get("aggregations")
    }

    pub fn took(&self) -> Option<u64> {
        self.raw.get("took").and_then(Value::as_u64)
    }

    pub fn max_score(&self) -> Option<f64> {
        self.raw
            .get("hits")
            .and_then(|h| h.get("max_score"))
            .and_then(Value::as_f64)
    }

    /// Per-query failure inside a multi-search response
    pub fn error(&self) -> Option<&Value> {
        self.raw.get("error")
    }

    pub fn results(&self) -> &[Document] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Document> {
        self.results
    }

    /// Deserializes every normalized result into `T`
    pub fn results_as<T: DeserializeOwned>(&self) -> serde_json::Result<Vec<T>> {
        self.results
            .iter()
            .map(|doc| serde_json::from_value(Value::Object(doc.clone())))
            .collect()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl From<Value> for SearchResults {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

// Older servers send a bare number, newer ones `{"value": n, "relation": "eq"}`
fn read_total(total: &Value) -> u64 {
    match total {
        Value::Object(obj) => obj.get("value").and_then(Value::as_u64).unwrap_or(0),
        other => other.as_u64().unwrap_or(0),
    }
}

fn normalize_hit(hit: &Value) -> Document {
    let mut doc = hit
        .get("_source")
        .and_then(Value::as_object)
        .or_else(|| hit.get("fields").and_then(Value::as_object))
        .cloned()
        .unwrap_or_default();

    for key in HIT_METADATA {
        if let Some(value) = hit.get(key) {
            doc.insert(key.to_string(), value.clone());
        }
    }

    if let Some(highlight) = hit.get("highlight") {
        doc.insert("_highlight".to_string(), highlight.clone());
    }

    doc
}
