use crate::{ClientError, Index, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde_json::{json, Value};
use stretch_core::{bulk, ClientConfig, Params, SearchResults};
use url::Url;

use crate::RequestError;

/// Body of an outgoing request
#[derive(Debug, Clone, Copy)]
pub enum RequestBody<'a> {
    Empty,
    Json(&'a Value),
    /// Plain text, e.g. the input of `_analyze`
    Text(&'a str),
    /// Newline-delimited JSON for `_bulk` and `_msearch`
    Ndjson(&'a str),
}

/// Connection to a search server, the root of the resource hierarchy
#[derive(Debug)]
pub struct Server {
    base_url: Url,
    http: HttpClient,
    config: ClientConfig,
}

impl Server {
    /// Connect to `url` with default settings
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(ClientConfig::with_url(url))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.url.clone()));
        }

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()?;

        Ok(Self {
            base_url,
            http,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle for the index `name`; nothing is sent to the server
    pub fn index(&self, name: impl Into<String>) -> Index<'_> {
        Index::new(self, name.into())
    }

    /// Base URL with `segments` appended, each one percent-encoded
    pub fn path_uri(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn url_for(&self, segments: &[&str], params: &Params) -> Result<Url> {
        let mut url = self.path_uri(segments)?;
        if !params.is_empty() {
            url.set_query(Some(&params.to_query_string()));
        }
        Ok(url)
    }

    /// Sends one request and parses the JSON reply.
    ///
    /// A 404 becomes [`RequestError::NotFound`], any other non-2xx status
    /// [`RequestError::Status`]. An empty reply body (HEAD) parses as
    /// `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        params: &Params,
        body: RequestBody<'_>,
    ) -> Result<Value> {
        let url = self.url_for(segments, params)?;
        tracing::debug!(%method, %url, "sending request");

        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text.to_string()),
            RequestBody::Ndjson(text) => builder
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(text.to_string()),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(
            %method,
            %url,
            status = status.as_u16(),
            bytes = text.len(),
            "received response"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(RequestError::NotFound {
                method: method.to_string(),
                url: url.to_string(),
                body: text,
            }
            .into());
        }

        if !status.is_success() {
            tracing::warn!(%method, %url, status = status.as_u16(), "request rejected");
            return Err(RequestError::Status {
                status: status.as_u16(),
                method: method.to_string(),
                url: url.to_string(),
                body: text,
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, segments: &[&str]) -> Result<Value> {
        self.request(Method::GET, segments, &Params::new(), RequestBody::Empty)
            .await
    }

    /// Server banner (`GET /`)
    pub async fn info(&self) -> Result<Value> {
        self.get(&[]).await
    }

    /// True if the server answers `GET /` successfully
    pub async fn is_up(&self) -> bool {
        match self.info().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "server is down");
                false
            }
        }
    }

    /// Index status for the whole server
    pub async fn status(&self) -> Result<Value> {
        self.get(&["_status"]).await
    }

    /// Statistics for every index
    pub async fn stats(&self) -> Result<Value> {
        self.get(&["_stats"]).await
    }

    /// `GET /_cluster/health`
    pub async fn cluster_health(&self) -> Result<Value> {
        self.get(&["_cluster", "health"]).await
    }

    /// Refreshes every index
    pub async fn refresh(&self) -> Result<Value> {
        self.request(Method::POST, &["_refresh"], &Params::new(), RequestBody::Empty)
            .await
    }

    /// Posts a prebuilt NDJSON body to `_bulk`.
    ///
    /// An empty body is answered locally with an empty item list.
    #[tracing::instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn bulk(&self, body: &str) -> Result<Value> {
        if body.is_empty() {
            return Ok(json!({ "took": 0, "errors": false, "items": [] }));
        }

        let response = self
            .request(Method::POST, &["_bulk"], &Params::new(), RequestBody::Ndjson(body))
            .await?;
        if response.get("errors").and_then(Value::as_bool) == Some(true) {
            tracing::warn!("bulk request completed with item errors");
        }
        Ok(response)
    }

    /// Runs header/query pairs through `_msearch`, one result per query.
    ///
    /// An empty list returns no results without contacting the server.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn msearch(&self, items: &[Value]) -> Result<Vec<SearchResults>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let body = bulk::msearch_body(items)?;
        let mut response = self
            .request(Method::GET, &["_msearch"], &Params::new(), RequestBody::Ndjson(&body))
            .await?;

        match response.get_mut("responses").map(Value::take) {
            Some(Value::Array(responses)) => {
                Ok(responses.into_iter().map(SearchResults::new).collect())
            }
            _ => Err(ClientError::InvalidResponse(
                "msearch reply has no responses array".to_string(),
            )),
        }
    }

    /// Multi-get across indices; each doc names its `_index`, `_type` and `_id`
    pub async fn mget(&self, docs: &[Value]) -> Result<Value> {
        let body = json!({ "docs": docs });
        self.request(Method::GET, &["_mget"], &Params::new(), RequestBody::Json(&body))
            .await
    }

    /// Analyzes `text` with the analyzer named in `params`
    pub async fn analyze(&self, text: &str, params: &Params) -> Result<Value> {
        self.request(Method::GET, &["_analyze"], params, RequestBody::Text(text))
            .await
    }

    pub async fn get_aliases(&self) -> Result<Value> {
        self.get(&["_aliases"]).await
    }

    /// Applies alias `actions` (`{"actions": [{"add": {...}}]}`)
    pub async fn update_aliases(&self, actions: &Value) -> Result<Value> {
        self.request(Method::POST, &["_aliases"], &Params::new(), RequestBody::Json(actions))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{basic_auth, body_json, body_string, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_path_uri_encodes_segments() {
        let server = Server::new("http://localhost:9200").unwrap();
        assert_eq!(
            server.path_uri(&["foo", "bar", "a b/c"]).unwrap().as_str(),
            "http://localhost:9200/foo/bar/a%20b%2Fc"
        );
        assert_eq!(server.path_uri(&[]).unwrap().as_str(), "http://localhost:9200/");
    }

    #[test]
    fn test_path_uri_keeps_prefix() {
        let server = Server::new("http://proxy.local/es/").unwrap();
        assert_eq!(
            server.path_uri(&["foo", "_search"]).unwrap().as_str(),
            "http://proxy.local/es/foo/_search"
        );
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(Server::new("not a url"), Err(ClientError::Url(_))));
        assert!(matches!(
            Server::new("mailto:ops@example.com"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_url_for_appends_query() {
        let server = Server::new("http://localhost:9200").unwrap();
        let url = server
            .url_for(&["foo", "_search"], &Params::new().with("size", 12))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/foo/_search?size=12");
    }

    #[tokio::test]
    async fn test_info_and_is_up() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "status": 200})),
            )
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert_eq!(server.info().await.unwrap()["status"], json!(200));
        assert!(server.is_up().await);
    }

    #[tokio::test]
    async fn test_is_up_false_on_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert!(!server.is_up().await);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_stats"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();

        let err = server.status().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_not_found());
        match err {
            ClientError::Request(e) => assert_eq!(e.body(), "boom"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(server.stats().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_json_reply() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_cluster/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert!(matches!(
            server.cluster_health().await,
            Err(ClientError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_basic_auth_sent_when_configured() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_cluster/health"))
            .and(basic_auth("elastic", "changeme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "green"})))
            .mount(&mock_server)
            .await;

        let config = ClientConfig {
            username: Some("elastic".to_string()),
            password: Some("changeme".to_string()),
            ..ClientConfig::with_url(mock_server.uri())
        };
        let server = Server::from_config(config).unwrap();
        assert_eq!(server.cluster_health().await.unwrap()["status"], json!("green"));
    }

    #[tokio::test]
    async fn test_bulk_posts_ndjson() {
        let mock_server = MockServer::start().await;
        let body = "{\"index\":{\"_index\":\"foo\"}}\n{\"a\":1}\n";
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("content-type", "application/x-ndjson"))
            .and(body_string(body))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"took": 3, "errors": false, "items": []})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        let res = server.bulk(body).await.unwrap();
        assert_eq!(res["errors"], json!(false));
    }

    #[tokio::test]
    async fn test_msearch_splits_responses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_msearch"))
            .and(body_string("{\"index\":\"foo\"}\n{\"query\":{\"match_all\":{}}}\n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responses": [
                    {"hits": {"total": 1, "hits": [{"_id": "1", "_source": {"text": "a"}}]}},
                    {"error": "IndexMissingException[[bar] missing]"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        let results = server
            .msearch(&[json!({"index": "foo"}), json!({"query": {"match_all": {}}})])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].total(), 1);
        assert_eq!(results[0].results()[0]["text"], json!("a"));
        assert!(results[1].error().is_some());
    }

    #[tokio::test]
    async fn test_msearch_empty_skips_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert!(server.msearch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_msearch_without_responses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_msearch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert!(matches!(
            server.msearch(&[json!({}), json!({})]).await,
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_mget_and_analyze() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_mget"))
            .and(body_json(json!({"docs": [{"_index": "foo", "_type": "bar", "_id": "1"}]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"docs": [{"_id": "1", "exists": true}]})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_analyze"))
            .and(query_param("analyzer", "snowball"))
            .and(header("content-type", "text/plain; charset=utf-8"))
            .and(body_string("Candles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokens": [{"token": "candl", "start_offset": 0, "end_offset": 7, "position": 1}]
            })))
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        let docs = server
            .mget(&[json!({"_index": "foo", "_type": "bar", "_id": "1"})])
            .await
            .unwrap();
        assert_eq!(docs["docs"][0]["exists"], json!(true));

        let tokens = server
            .analyze("Candles", &Params::new().with("analyzer", "snowball"))
            .await
            .unwrap();
        assert_eq!(tokens["tokens"][0]["token"], json!("candl"));
    }

    #[tokio::test]
    async fn test_aliases() {
        let mock_server = MockServer::start().await;
        let actions = json!({"actions": [{"add": {"index": "foo", "alias": "foo-live"}}]});
        Mock::given(method("POST"))
            .and(path("/_aliases"))
            .and(body_json(actions.clone()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "acknowledged": true})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_aliases"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"foo": {"aliases": {"foo-live": {}}}})),
            )
            .mount(&mock_server)
            .await;

        let server = Server::new(&mock_server.uri()).unwrap();
        assert_eq!(server.update_aliases(&actions).await.unwrap()["acknowledged"], json!(true));
        assert!(server.get_aliases().await.unwrap()["foo"]["aliases"]
            .get("foo-live")
            .is_some());
    }
}
