use reqwest::Method;
use serde_json::{json, Value};
use stretch_core::{Params, SearchResults};
use url::Url;

use crate::{component, Index, RequestBody, Result};

/// Options for [`IndexType::get_with`]
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Stored fields to load instead of `_source`
    pub fields: Vec<String>,
    /// Return the whole response (`_id`, `_version`, `_source`...) rather than the document
    pub raw: bool,
    pub params: Params,
}

impl GetOptions {
    pub fn raw() -> Self {
        Self {
            raw: true,
            ..Self::default()
        }
    }

    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Handle for a document type within an [`Index`].
///
/// Created with [`Index::doc_type`].
#[derive(Debug, Clone)]
pub struct IndexType<'a> {
    index: Index<'a>,
    name: String,
}

impl<'a> IndexType<'a> {
    pub(crate) fn new(index: Index<'a>, name: String) -> Self {
        Self { index, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &Index<'a> {
        &self.index
    }

    /// Full URL of this type, or of `path` below it (`"987"`, `"987/_explain"`)
    pub fn path_uri(&self, path: Option<&str>) -> Result<Url> {
        let mut segments = self.segments(&[]);
        if let Some(path) = path {
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        self.index.server().path_uri(&segments)
    }

    fn segments<'s>(&'s self, rest: &[&'s str]) -> Vec<&'s str> {
        let mut segments = vec![self.index.name(), self.name.as_str()];
        segments.extend_from_slice(rest);
        segments
    }

    async fn request(
        &self,
        method: Method,
        rest: &[&str],
        params: &Params,
        body: RequestBody<'_>,
    ) -> Result<Value> {
        self.index
            .server()
            .request(method, &self.segments(rest), params, body)
            .await
    }

    /// Fetches the `_source` of document `id`.
    ///
    /// A missing document is a `RequestError::NotFound`.
    pub async fn get(&self, id: impl AsRef<str>) -> Result<Value> {
        self.get_with(id, &GetOptions::default()).await
    }

    /// Fetches document `id`.
    ///
    /// Returns `_source`, or the loaded `fields` when the source was not
    /// requested, or the full response when `options.raw` is set.
    #[tracing::instrument(
        skip(self, id, options),
        fields(index = %self.index.name(), doc_type = %self.name, id = %id.as_ref())
    )]
    pub async fn get_with(&self, id: impl AsRef<str>, options: &GetOptions) -> Result<Value> {
        let mut params = Params::new();
        if !options.fields.is_empty() {
            params.insert("fields", options.fields.join(","));
        }
        params.extend(&options.params);

        let mut response = self
            .request(Method::GET, &[id.as_ref()], &params, RequestBody::Empty)
            .await?;
        if options.raw {
            return Ok(response);
        }

        let source = response
            .get_mut("_source")
            .map(Value::take)
            .filter(|v| !v.is_null());
        Ok(source
            .or_else(|| response.get_mut("fields").map(Value::take))
            .unwrap_or(Value::Null))
    }

    /// Fetches several documents of this type by id
    pub async fn mget<S: AsRef<str>>(&self, ids: &[S]) -> Result<Value> {
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        let body = json!({ "ids": ids });
        self.request(Method::GET, &["_mget"], &Params::new(), RequestBody::Json(&body))
            .await
    }

    /// Explains how `query` scores document `id`
    pub async fn explain(&self, id: impl AsRef<str>, query: &Value) -> Result<Value> {
        self.request(
            Method::GET,
            &[id.as_ref(), "_explain"],
            &Params::new(),
            RequestBody::Json(query),
        )
        .await
    }

    /// Indexes `source` under `id`
    pub async fn put(&self, id: impl AsRef<str>, source: &Value) -> Result<Value> {
        self.put_with_params(id, source, &Params::new()).await
    }

    /// Indexes `source` under `id` with extra query parameters (`refresh`, `routing`...)
    #[tracing::instrument(
        skip(self, id, source, params),
        fields(index = %self.index.name(), doc_type = %self.name, id = %id.as_ref())
    )]
    pub async fn put_with_params(
        &self,
        id: impl AsRef<str>,
        source: &Value,
        params: &Params,
    ) -> Result<Value> {
        self.request(Method::PUT, &[id.as_ref()], params, RequestBody::Json(source))
            .await
    }

    /// Indexes `source` with a server-generated id
    pub async fn post(&self, source: &Value) -> Result<Value> {
        self.request(Method::POST, &[], &Params::new(), RequestBody::Json(source))
            .await
    }

    /// Partial update through `_update`, e.g. `{"script": "ctx._source.message = 'Updated!'"}`.
    ///
    /// `params` can carry `fields`, `routing`, `retry_on_conflict`...
    pub async fn update(
        &self,
        id: impl AsRef<str>,
        body: &Value,
        params: &Params,
    ) -> Result<Value> {
        self.request(
            Method::POST,
            &[id.as_ref(), "_update"],
            params,
            RequestBody::Json(body),
        )
        .await
    }

    /// Deletes document `id`; `None` if it did not exist
    #[tracing::instrument(
        skip(self, id),
        fields(index = %self.index.name(), doc_type = %self.name, id = %id.as_ref())
    )]
    pub async fn delete(&self, id: impl AsRef<str>) -> Result<Option<Value>> {
        match self
            .request(Method::DELETE, &[id.as_ref()], &Params::new(), RequestBody::Empty)
            .await
        {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Mapping of this type
    pub async fn get_mapping(&self) -> Result<Value> {
        self.request(Method::GET, &["_mapping"], &Params::new(), RequestBody::Empty)
            .await
    }

    /// Creates or extends the mapping; `mapping` is keyed by the type name
    pub async fn put_mapping(&self, mapping: &Value) -> Result<Value> {
        self.request(Method::PUT, &["_mapping"], &Params::new(), RequestBody::Json(mapping))
            .await
    }

    /// Deletes the mapping and with it every document of this type
    pub async fn delete_mapping(&self) -> Result<Value> {
        self.request(Method::DELETE, &["_mapping"], &Params::new(), RequestBody::Empty)
            .await
    }

    /// True if this type is defined on the server
    pub async fn exists(&self) -> Result<bool> {
        self.head(&[]).await
    }

    pub async fn doc_exists(&self, id: impl AsRef<str>) -> Result<bool> {
        self.head(&[id.as_ref()]).await
    }

    async fn head(&self, rest: &[&str]) -> Result<bool> {
        match self
            .request(Method::HEAD, rest, &Params::new(), RequestBody::Empty)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Deletes documents of this type matching `query`
    pub async fn delete_query(&self, query: &Value) -> Result<Value> {
        component::delete_query(self.index.server(), &self.segments(&[]), query).await
    }

    /// Searches documents of this type only
    pub async fn search(&self, body: &Value) -> Result<SearchResults> {
        self.search_with_params(&Params::new(), body).await
    }

    #[tracing::instrument(
        skip(self, params, body),
        fields(index = %self.index.name(), doc_type = %self.name)
    )]
    pub async fn search_with_params(&self, params: &Params, body: &Value) -> Result<SearchResults> {
        component::search(self.index.server(), &self.segments(&[]), params, body).await
    }
}
