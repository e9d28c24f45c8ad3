//! Operations shared by `Index` and `IndexType`, parameterised by the
//! resource path they are scoped to.

use reqwest::Method;
use serde_json::{json, Value};
use stretch_core::{Params, SearchResults};

use crate::{RequestBody, Result, Server};

pub(crate) async fn search(
    server: &Server,
    scope: &[&str],
    params: &Params,
    body: &Value,
) -> Result<SearchResults> {
    let mut segments = scope.to_vec();
    segments.push("_search");

    let url = server.url_for(&segments, params)?;
    tracing::info!("search: curl -XGET '{}' -d '{}'", url, body);

    let response = server
        .request(Method::GET, &segments, params, RequestBody::Json(body))
        .await?;
    let results = SearchResults::new(response);
    tracing::debug!(total = results.total(), returned = results.results().len(), "search finished");
    Ok(results)
}

/// Deletes every document under `scope` matching `query`.
///
/// A bare query is wrapped as `{"query": ...}`; a body that already has a
/// top-level `query` key is sent unchanged.
pub(crate) async fn delete_query(server: &Server, scope: &[&str], query: &Value) -> Result<Value> {
    let mut segments = scope.to_vec();
    segments.push("_query");

    let wrapped;
    let body = if query.get("query").is_some() {
        query
    } else {
        wrapped = json!({ "query": query });
        &wrapped
    };

    server
        .request(Method::DELETE, &segments, &Params::new(), RequestBody::Json(body))
        .await
}
