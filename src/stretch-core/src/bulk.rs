//! NDJSON bodies for the `_bulk` and `_msearch` endpoints.

use serde_json::{json, Map, Value};

use crate::search::Document;

/// Document keys that describe the bulk action rather than the source
const ACTION_KEYS: [&str; 4] = ["_type", "_id", "_parent", "_routing"];

/// Builds a `_bulk` body that indexes every document into `index`.
///
/// The target type and id come from each document's `_type` and `_id` (or
/// `id`) keys; `_parent` and `_routing` are carried into the action line.
/// Action keys are stripped from the source line.
pub fn bulk_index_body(index: &str, docs: &[Document]) -> serde_json::Result<String> {
    let mut body = String::new();
    for doc in docs {
        let action = json!({ "index": action_meta(index, doc) });
        push_line(&mut body, &action)?;

        let source: Map<String, Value> = doc
            .iter()
            .filter(|(k, _)| !ACTION_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        push_line(&mut body, &Value::Object(source))?;
    }
    tracing::debug!(index, docs = docs.len(), bytes = body.len(), "built bulk index body");
    Ok(body)
}

/// Builds a `_bulk` body that deletes every document from `index`
pub fn bulk_delete_body(index: &str, docs: &[Document]) -> serde_json::Result<String> {
    let mut body = String::new();
    for doc in docs {
        push_line(&mut body, &json!({ "delete": action_meta(index, doc) }))?;
    }
    tracing::debug!(index, docs = docs.len(), "built bulk delete body");
    Ok(body)
}

/// One JSON value per line, each terminated by `\n`
pub fn msearch_body(items: &[Value]) -> serde_json::Result<String> {
    let mut body = String::new();
    for item in items {
        push_line(&mut body, item)?;
    }
    Ok(body)
}

/// Puts an `{"index": <name>}` header before each query
pub fn index_msearch_items(index: &str, queries: &[Value]) -> Vec<Value> {
    queries
        .iter()
        .flat_map(|q| [json!({ "index": index }), q.clone()])
        .collect()
}

fn action_meta(index: &str, doc: &Document) -> Value {
    let mut meta = Map::new();
    meta.insert("_index".to_string(), Value::String(index.to_string()));

    if let Some(doc_type) = doc.get("_type").filter(|v| !v.is_null()) {
        meta.insert("_type".to_string(), doc_type.clone());
    }

    let id = doc
        .get("_id")
        .filter(|v| !v.is_null())
        .or_else(|| doc.get("id").filter(|v| !v.is_null()));
    if let Some(id) = id {
        meta.insert("_id".to_string(), Value::String(id_text(id)));
    }

    for key in ["_parent", "_routing"] {
        if let Some(value) = doc.get(key).filter(|v| !v.is_null()) {
            meta.insert(key.to_string(), value.clone());
        }
    }

    Value::Object(meta)
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_line(body: &mut String, value: &Value) -> serde_json::Result<()> {
    body.push_str(&serde_json::to_string(value)?);
    body.push('\n');
    Ok(())
}
