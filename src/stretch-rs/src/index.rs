use reqwest::Method;
use serde_json::Value;
use stretch_core::{bulk, Document, Params, SearchResults};
use url::Url;

use crate::{component, IndexType, RequestBody, Result, Server};

/// Handle for one index on a [`Server`].
///
/// Created with [`Server::index`]; holds no remote state.
#[derive(Debug, Clone)]
pub struct Index<'a> {
    server: &'a Server,
    name: String,
}

impl<'a> Index<'a> {
    pub(crate) fn new(server: &'a Server, name: String) -> Self {
        Self { server, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server(&self) -> &'a Server {
        self.server
    }

    /// Handle for the type `name` within this index
    pub fn doc_type(&self, name: impl Into<String>) -> IndexType<'a> {
        IndexType::new(self.clone(), name.into())
    }

    /// Full URL of this index, or of `path` below it (`"_stats"`, `"bar/_mapping"`)
    pub fn path_uri(&self, path: Option<&str>) -> Result<Url> {
        let mut segments = vec![self.name.as_str()];
        if let Some(path) = path {
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        self.server.path_uri(&segments)
    }

    async fn request(
        &self,
        method: Method,
        leaf: Option<&str>,
        body: RequestBody<'_>,
    ) -> Result<Value> {
        let mut segments = vec![self.name.as_str()];
        segments.extend(leaf);
        self.server
            .request(method, &segments, &Params::new(), body)
            .await
    }

    /// Creates the index; `options` usually carries `settings` and `mappings`
    #[tracing::instrument(skip(self, options), fields(index = %self.name))]
    pub async fn create(&self, options: &Value) -> Result<Value> {
        self.request(Method::PUT, None, RequestBody::Json(options)).await
    }

    #[tracing::instrument(skip(self), fields(index = %self.name))]
    pub async fn delete(&self) -> Result<Value> {
        self.request(Method::DELETE, None, RequestBody::Empty).await
    }

    /// True unless the server answers 404
    pub async fn exists(&self) -> Result<bool> {
        match self.request(Method::HEAD, None, RequestBody::Empty).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Document and store statistics for this index
    pub async fn stats(&self) -> Result<Value> {
        self.request(Method::GET, Some("_stats"), RequestBody::Empty).await
    }

    /// Shard and index status
    pub async fn status(&self) -> Result<Value> {
        self.request(Method::GET, Some("_status"), RequestBody::Empty).await
    }

    /// Mappings of every type in this index
    pub async fn get_mapping(&self) -> Result<Value> {
        self.request(Method::GET, Some("_mapping"), RequestBody::Empty).await
    }

    pub async fn get_settings(&self) -> Result<Value> {
        self.request(Method::GET, Some("_settings"), RequestBody::Empty).await
    }

    pub async fn update_settings(&self, settings: &Value) -> Result<Value> {
        self.request(Method::PUT, Some("_settings"), RequestBody::Json(settings))
            .await
    }

    /// Makes recent writes visible to search
    pub async fn refresh(&self) -> Result<Value> {
        self.request(Method::POST, Some("_refresh"), RequestBody::Empty).await
    }

    /// Searches this index with `body` as the query DSL
    pub async fn search(&self, body: &Value) -> Result<SearchResults> {
        self.search_with_params(&Params::new(), body).await
    }

    /// Like [`Index::search`], with `params` (`size`, `from`, `routing`...) in the query string.
    #[tracing::instrument(skip(self, params, body), fields(index = %self.name))]
    pub async fn search_with_params(&self, params: &Params, body: &Value) -> Result<SearchResults> {
        component::search(self.server, &[self.name.as_str()], params, body).await
    }

    /// Runs several queries against this index in one `_msearch` call.
    ///
    /// Only the query bodies are given; the per-query `{"index": ...}` headers
    /// are added here.
    pub async fn msearch(&self, queries: &[Value]) -> Result<Vec<SearchResults>> {
        let items = bulk::index_msearch_items(&self.name, queries);
        self.server.msearch(&items).await
    }

    pub async fn analyze(&self, text: &str, params: &Params) -> Result<Value> {
        self.server
            .request(
                Method::GET,
                &[self.name.as_str(), "_analyze"],
                params,
                RequestBody::Text(text),
            )
            .await
    }

    /// Indexes `docs` in one bulk request.
    ///
    /// Each document names its type with `_type` and its id with `_id` or `id`.
    #[tracing::instrument(skip(self, docs), fields(index = %self.name, docs = docs.len()))]
    pub async fn bulk_index(&self, docs: &[Document]) -> Result<Value> {
        let body = bulk::bulk_index_body(&self.name, docs)?;
        self.server.bulk(&body).await
    }

    /// Deletes `docs` (identified by `_type` and `_id`) in one bulk request
    #[tracing::instrument(skip(self, docs), fields(index = %self.name, docs = docs.len()))]
    pub async fn bulk_delete(&self, docs: &[Document]) -> Result<Value> {
        let body = bulk::bulk_delete_body(&self.name, docs)?;
        self.server.bulk(&body).await
    }

    /// Deletes every document in this index matching `query`
    pub async fn delete_query(&self, query: &Value) -> Result<Value> {
        component::delete_query(self.server, &[self.name.as_str()], query).await
    }
}
