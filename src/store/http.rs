//! Blocking REST client for a search cluster

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::observability::{log_debug, Event};
use crate::options::{ConnectionSettings, Credentials, TargetArguments};
use crate::request::{DeleteRequest, IndexRequest, QueryArguments, QueryBody, SearchRequest};

use super::document::{Document, SearchPage};
use super::errors::{StoreError, StoreResult};
use super::DocumentStore;

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

/// `DocumentStore` backed by the cluster's REST API
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl HttpStore {
    /// Build a client from resolved connection settings
    ///
    /// `verify_certs=false` among the extras disables certificate checks;
    /// other extras are not understood by this client and are skipped.
    pub fn connect(settings: &ConnectionSettings) -> StoreResult<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(settings.timeout_secs));

        for (key, value) in &settings.extras {
            match key.as_str() {
                "verify_certs" => {
                    builder = builder.danger_accept_invalid_certs(value.eq_ignore_ascii_case("false"));
                }
                _ => log_debug!(
                    event = %Event::ConnectionOptionIgnored,
                    option = %key,
                    "ignoring unsupported connection option"
                ),
            }
        }

        let client = builder
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let base_url = Url::parse(&settings.base_url())
            .map_err(|e| StoreError::InvalidRequest(format!("bad store address: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials: settings.credentials.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidRequest(format!("{} cannot be a base URL", self.base_url)))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    fn target_url(&self, target: &TargetArguments, endpoint: &str) -> StoreResult<Url> {
        match &target.doc_type {
            Some(doc_type) => self.url(&[&target.index, doc_type, endpoint]),
            None => self.url(&[&target.index, endpoint]),
        }
    }

    /// `/{index}/_doc/{id}` for typeless stores, `/{index}/{type}/{id}` otherwise
    fn document_url(&self, target: &TargetArguments, id: &str) -> StoreResult<Url> {
        let doc_type = target.doc_type.as_deref().unwrap_or("_doc");
        self.url(&[&target.index, doc_type, id])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => request,
        }
    }

    /// Attach a query either as `q` or as the JSON body
    fn with_query(request: RequestBuilder, query: Option<&QueryBody>) -> RequestBuilder {
        match query {
            None => request,
            Some(QueryBody::QueryString(text)) => request.query(&[("q", text)]),
            Some(QueryBody::Structured(body)) => request.json(body),
        }
    }

    fn send(request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn decode<T: DeserializeOwned>(request: RequestBuilder) -> StoreResult<T> {
        Self::send(request)?
            .json()
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    // Request construction, one helper per store operation. Nothing is sent
    // until the builder reaches `send` or `decode`.

    fn count_request(&self, request: &QueryArguments) -> StoreResult<RequestBuilder> {
        let url = self.target_url(&request.target, "_count")?;
        Ok(Self::with_query(self.request(Method::POST, url), request.query.as_ref()))
    }

    fn search_request(&self, request: &SearchRequest) -> StoreResult<RequestBuilder> {
        let url = self.target_url(&request.query.target, "_search")?;
        let pagination = &request.pagination;
        let mut http = self.request(Method::POST, url).query(&[
            ("scroll", pagination.scroll.clone()),
            ("size", pagination.size.to_string()),
        ]);
        if let Some(sort) = &pagination.sort {
            http = http.query(&[("sort", sort)]);
        }
        Ok(Self::with_query(http, request.query.query.as_ref()))
    }

    fn scroll_request(&self, cursor: &str, lifetime: &str) -> StoreResult<RequestBuilder> {
        let url = self.url(&["_search", "scroll"])?;
        Ok(self
            .request(Method::POST, url)
            .json(&json!({ "scroll": lifetime, "scroll_id": cursor })))
    }

    fn clear_scroll_request(&self, cursor: &str) -> StoreResult<RequestBuilder> {
        let url = self.url(&["_search", "scroll"])?;
        Ok(self
            .request(Method::DELETE, url)
            .json(&json!({ "scroll_id": cursor })))
    }

    fn lookup_request(&self, request: &QueryArguments) -> StoreResult<RequestBuilder> {
        let url = self.target_url(&request.target, "_search")?;
        Ok(Self::with_query(self.request(Method::POST, url), request.query.as_ref()))
    }

    fn index_request(&self, request: &IndexRequest) -> StoreResult<RequestBuilder> {
        let url = self.document_url(&request.target, &request.id)?;
        Ok(self
            .request(Method::PUT, url)
            .query(&[("refresh", request.refresh.as_param())])
            .json(&Value::Object(request.body.clone())))
    }

    fn delete_request(&self, request: &DeleteRequest) -> StoreResult<RequestBuilder> {
        let url = self.document_url(&request.target, &request.id)?;
        Ok(self
            .request(Method::DELETE, url)
            .query(&[("refresh", request.refresh.as_param())]))
    }
}

fn transport(error: reqwest::Error) -> StoreError {
    if error.is_decode() {
        StoreError::Malformed(error.to_string())
    } else {
        StoreError::Transport(error.to_string())
    }
}

impl DocumentStore for HttpStore {
    fn count(&self, request: &QueryArguments) -> StoreResult<u64> {
        let response: CountResponse = Self::decode(self.count_request(request)?)?;
        Ok(response.count)
    }

    fn search(&self, request: &SearchRequest) -> StoreResult<SearchPage> {
        let response: SearchResponse = Self::decode(self.search_request(request)?)?;
        Ok(SearchPage {
            cursor: response.scroll_id,
            hits: response.hits.hits,
        })
    }

    fn scroll(&self, cursor: &str, lifetime: &str) -> StoreResult<SearchPage> {
        let response: SearchResponse = Self::decode(self.scroll_request(cursor, lifetime)?)?;
        Ok(SearchPage {
            cursor: response.scroll_id,
            hits: response.hits.hits,
        })
    }

    fn clear_scroll(&self, cursor: &str) -> StoreResult<()> {
        Self::send(self.clear_scroll_request(cursor)?)?;
        Ok(())
    }

    fn lookup(&self, request: &QueryArguments) -> StoreResult<Vec<Document>> {
        let response: SearchResponse = Self::decode(self.lookup_request(request)?)?;
        Ok(response.hits.hits)
    }

    fn index(&self, request: &IndexRequest) -> StoreResult<String> {
        let response: IndexResponse = Self::decode(self.index_request(request)?)?;
        Ok(response.id)
    }

    fn delete(&self, request: &DeleteRequest) -> StoreResult<()> {
        Self::send(self.delete_request(request)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use reqwest::blocking::Request;
    use reqwest::header::AUTHORIZATION;
    use serde_json::Map;

    use crate::options::WriteVisibility;
    use crate::request::PaginationArguments;

    fn store() -> HttpStore {
        HttpStore::connect(&ConnectionSettings::default()).unwrap()
    }

    fn built(request: StoreResult<RequestBuilder>) -> Request {
        request.unwrap().build().unwrap()
    }

    fn body_json(request: &Request) -> Value {
        let bytes = request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("request has an in-memory body");
        serde_json::from_slice(bytes).unwrap()
    }

    fn query_arguments(query: Option<QueryBody>) -> QueryArguments {
        QueryArguments {
            target: TargetArguments::new("articles", None),
            query,
        }
    }

    fn search(query: Option<QueryBody>, sort: Option<&str>) -> SearchRequest {
        SearchRequest {
            query: query_arguments(query),
            pagination: PaginationArguments {
                sort: sort.map(str::to_string),
                size: 500,
                scroll: "10m".into(),
            },
        }
    }

    #[test]
    fn test_target_urls() {
        let store = store();
        let typeless = TargetArguments::new("articles", None);
        assert_eq!(
            store.target_url(&typeless, "_search").unwrap().as_str(),
            "http://localhost:9200/articles/_search"
        );
        assert_eq!(
            store.document_url(&typeless, "7").unwrap().as_str(),
            "http://localhost:9200/articles/_doc/7"
        );

        let typed = TargetArguments::new("articles", Some("article".into()));
        assert_eq!(
            store.target_url(&typed, "_count").unwrap().as_str(),
            "http://localhost:9200/articles/article/_count"
        );
        assert_eq!(
            store.document_url(&typed, "7").unwrap().as_str(),
            "http://localhost:9200/articles/article/7"
        );
    }

    #[test]
    fn test_document_ids_are_escaped() {
        let url = store()
            .document_url(&TargetArguments::new("articles", None), "a/b c")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/articles/_doc/a%2Fb%20c");
    }

    #[test]
    fn test_scheme_and_port_from_settings() {
        let settings = ConnectionSettings {
            host: "search.internal".into(),
            port: 9243,
            scheme: Some("https".into()),
            ..ConnectionSettings::default()
        };
        let store = HttpStore::connect(&settings).unwrap();
        assert_eq!(
            store.url(&["_search", "scroll"]).unwrap().as_str(),
            "https://search.internal:9243/_search/scroll"
        );
    }

    // =========================================================================
    // Wire format
    // =========================================================================

    #[test]
    fn test_query_string_goes_in_q_parameter() {
        let request = built(
            store().count_request(&query_arguments(Some(QueryBody::QueryString("title:foo".into())))),
        );
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().path(), "/articles/_count");
        assert_eq!(request.url().query(), Some("q=title%3Afoo"));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_structured_query_goes_in_body() {
        let dsl = json!({"query": {"match": {"title": "foo"}}});
        let request = built(store().lookup_request(&query_arguments(Some(QueryBody::Structured(dsl.clone())))));
        assert_eq!(request.url().path(), "/articles/_search");
        assert_eq!(request.url().query(), None);
        assert_eq!(body_json(&request), dsl);
    }

    #[test]
    fn test_search_carries_pagination_params() {
        let request = built(store().search_request(&search(None, Some("title:desc"))));
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().path(), "/articles/_search");
        assert_eq!(
            request.url().query(),
            Some("scroll=10m&size=500&sort=title%3Adesc")
        );
        assert!(request.body().is_none());

        let request = built(store().search_request(&search(None, None)));
        assert_eq!(request.url().query(), Some("scroll=10m&size=500"));
    }

    #[test]
    fn test_scroll_and_clear_scroll() {
        let store = store();

        let request = built(store.scroll_request("cursor-1", "10m"));
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().path(), "/_search/scroll");
        assert_eq!(body_json(&request), json!({"scroll": "10m", "scroll_id": "cursor-1"}));

        let request = built(store.clear_scroll_request("cursor-1"));
        assert_eq!(*request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/_search/scroll");
        assert_eq!(body_json(&request), json!({"scroll_id": "cursor-1"}));
    }

    #[test]
    fn test_writes_carry_refresh() {
        let store = store();
        let target = TargetArguments::new("articles", None);
        let mut body = Map::new();
        body.insert("title".into(), json!("hi"));

        let request = built(store.index_request(&IndexRequest {
            target: target.clone(),
            id: "7".into(),
            body,
            refresh: WriteVisibility::WaitFor,
        }));
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.url().path(), "/articles/_doc/7");
        assert_eq!(request.url().query(), Some("refresh=wait_for"));
        assert_eq!(body_json(&request), json!({"title": "hi"}));

        let request = built(store.delete_request(&DeleteRequest {
            target,
            id: "7".into(),
            refresh: WriteVisibility::Deferred,
        }));
        assert_eq!(*request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/articles/_doc/7");
        assert_eq!(request.url().query(), Some("refresh=false"));
    }

    #[test]
    fn test_basic_auth_only_with_credentials() {
        let request = built(store().count_request(&query_arguments(None)));
        assert!(request.headers().get(AUTHORIZATION).is_none());

        let settings = ConnectionSettings {
            credentials: Some(Credentials {
                username: "elastic".into(),
                password: "secret".into(),
            }),
            ..ConnectionSettings::default()
        };
        let store = HttpStore::connect(&settings).unwrap();
        let request = built(store.count_request(&query_arguments(None)));
        // base64("elastic:secret")
        assert_eq!(
            request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Basic ZWxhc3RpYzpzZWNyZXQ=")
        );
    }

    // =========================================================================
    // Connection options
    // =========================================================================

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unknown_connection_options_are_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut settings = ConnectionSettings::default();
        settings.extras.insert("sniff_on_start".into(), "true".into());
        tracing::subscriber::with_default(subscriber, || {
            HttpStore::connect(&settings).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("CONNECTION_OPTION_IGNORED"), "{}", output);
        assert!(output.contains("sniff_on_start"), "{}", output);
    }
}
