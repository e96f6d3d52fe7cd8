//! JSON REST client for the proxy service API.
//!
//! Every request carries the configured API key as the `api_key` query
//! parameter. Responses are parsed as JSON; anything other than a 2xx status
//! is returned as [`ApiError::Status`]. There is no retry layer: a failed call
//! fails the request that issued it.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::net::HttpClient;

/// A single API object, kept opaque.
pub type Record = Map<String, Value>;

/// Window size used when walking a whole collection with [`RestClient::list_all`].
pub const LIST_ALL_CHUNK: u64 = 100;

/// Errors raised by the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected API response shape: {0}")]
    Shape(String),
}

/// Parameters for a GET request.
///
/// With an `id` the request addresses `<endpoint>/<id>`; without one it
/// addresses the collection and may carry an offset/limit window plus
/// arbitrary filter parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    id: Option<i64>,
    offset: Option<u64>,
    limit: Option<u64>,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// A page of a collection: `{"total": n, "data": [...]}`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Listing {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub data: Vec<Record>,
}

/// Client for the remote proxy service API.
#[derive(Debug, Clone)]
pub struct RestClient {
    base: Url,
    api_key: String,
    http: HttpClient,
}

impl RestClient {
    /// Build a client for `base_url`. A trailing slash is added when missing
    /// so that endpoints join below the base path instead of replacing its
    /// last segment.
    pub fn new(base_url: &str, api_key: impl Into<String>, http: HttpClient) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            api_key: api_key.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the URL for `endpoint` (and optionally one resource below it),
    /// without the API key.
    pub fn endpoint_url(&self, endpoint: &str, id: Option<i64>) -> Result<Url, ApiError> {
        let mut url = self.base.join(endpoint.trim_start_matches('/'))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|()| ApiError::Shape(format!("base URL cannot carry a path: {}", self.base)))?
                .pop_if_empty()
                .push(&id.to_string());
        }
        Ok(url)
    }

    /// GET a resource or a collection window.
    pub async fn get(&self, endpoint: &str, query: &Query) -> Result<Value, ApiError> {
        let mut url = self.endpoint_url(endpoint, query.id)?;
        {
            let mut pairs = url.query_pairs_mut();
            if query.id.is_none() {
                if let Some(offset) = query.offset {
                    pairs.append_pair("offset", &offset.to_string());
                }
                if let Some(limit) = query.limit {
                    pairs.append_pair("limit", &limit.to_string());
                }
            }
            for (key, value) in &query.params {
                pairs.append_pair(key, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.send(Method::GET, url, None).await
    }

    pub async fn post(&self, endpoint: &str, data: &Value) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint, None)?;
        self.send(Method::POST, url, Some(data)).await
    }

    pub async fn put(&self, endpoint: &str, id: i64, data: &Value) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint, Some(id))?;
        self.send(Method::PUT, url, Some(data)).await
    }

    pub async fn delete(&self, endpoint: &str, id: i64) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint, Some(id))?;
        self.send(Method::DELETE, url, None).await
    }

    /// Fetch one window of a collection.
    pub async fn list(&self, endpoint: &str, query: &Query) -> Result<Listing, ApiError> {
        let body = self.get(endpoint, query).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetch every record of a collection by walking offset/limit windows.
    pub async fn list_all(&self, endpoint: &str, params: &[(String, String)]) -> Result<Vec<Record>, ApiError> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let mut query = Query::new().window(offset, LIST_ALL_CHUNK);
            for (key, value) in params {
                query = query.param(key.clone(), value);
            }
            let page = self.list(endpoint, &query).await?;
            let received = page.data.len() as u64;
            records.extend(page.data);
            offset += received;
            if received == 0 || offset >= page.total {
                break;
            }
        }
        Ok(records)
    }

    /// Fetch a single record, unwrapping the `{"data": {...}}` envelope.
    pub async fn fetch(&self, endpoint: &str, id: i64) -> Result<Record, ApiError> {
        let body = self.get(endpoint, &Query::new().id(id)).await?;
        unwrap_record(body)
            .ok_or_else(|| ApiError::Shape(format!("`{endpoint}/{id}` did not return a `data` object")))
    }

    async fn send(&self, method: Method, mut url: Url, body: Option<&Value>) -> Result<Value, ApiError> {
        match body {
            Some(data) => tracing::info!(method = %method, url = %url, data = %data, "API request"),
            None => tracing::info!(method = %method, url = %url, "API request"),
        }
        set_api_key(&mut url, &self.api_key);

        let mut request = self.http.inner().request(method, url);
        if let Some(data) = body {
            request = request.json(data);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::error!(status = status.as_u16(), body = %body, "API call failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Add or replace the `api_key` query parameter.
fn set_api_key(url: &mut Url, api_key: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "api_key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("api_key", api_key);
}

/// Extract the object under `data`, or accept a bare object.
pub fn unwrap_record(body: Value) -> Option<Record> {
    match body {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Object(inner)) => Some(inner),
            Some(_) => None,
            None => Some(obj),
        },
        _ => None,
    }
}

/// Parse an id out of a record field that may be a number or a numeric string.
pub fn record_id(record: &Record, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
