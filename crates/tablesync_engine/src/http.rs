//! HTTP resource client.
//!
//! [`HttpResource`] speaks the REST surface of one entity resource:
//!
//! ```text
//! GET    /api/<resource>/                 -> array of records
//! POST   /api/<resource>/                 -> created record
//! PUT    /api/<resource>/<key-segments>   -> updated record
//! DELETE /api/<resource>/<key-segments>   -> 2xx
//! ```
//!
//! The wire itself is abstracted by [`HttpClient`] so the same resource
//! logic runs over `ureq` in production and over an in-process loopback in
//! tests.

use crate::config::ClientConfig;
use crate::error::{TableError, TableResult};
use crate::transport::ResourceClient;
use std::fmt;
use tablesync_schema::{EntitySchema, KeyTuple, Record};
use tracing::{debug, warn};
use url::Url;

/// HTTP method of a resource request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

/// A response as received, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. `Err` means
/// no response was received at all (connection refused, timeout); any
/// response, including 4xx and 5xx, is `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// REST client for one entity resource.
pub struct HttpResource<C: HttpClient> {
    resource: String,
    collection: Url,
    client: C,
}

impl<C: HttpClient> HttpResource<C> {
    /// Creates a client for `schema`'s resource under `config`'s server.
    pub fn new(config: &ClientConfig, schema: &EntitySchema, client: C) -> TableResult<Self> {
        let url = config.collection_url(schema.resource());
        let collection = Url::parse(&url)
            .map_err(|e| TableError::transport(format!("invalid resource URL {url}: {e}")))?;
        if collection.cannot_be_a_base() {
            return Err(TableError::transport(format!(
                "resource URL {url} cannot carry key segments"
            )));
        }

        Ok(Self {
            resource: schema.resource().to_string(),
            collection,
            client,
        })
    }

    /// Collection URL (`.../api/<resource>/`).
    pub fn collection_url(&self) -> &str {
        self.collection.as_str()
    }

    /// URL of one record: key values as percent-encoded path segments.
    ///
    /// Blank, `.` and `..` key values cannot be addressed in a path.
    pub fn item_url(&self, key: &KeyTuple) -> TableResult<String> {
        let segments = key.segments();
        if segments.iter().any(|s| matches!(s.as_str(), "" | "." | "..")) {
            return Err(TableError::transport(format!(
                "key {key} cannot be addressed in a URL"
            )));
        }

        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| TableError::transport(format!("{} cannot carry key segments", self.collection)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn send(
        &self,
        method: Method,
        url: String,
        record: Option<&Record>,
        key: Option<&KeyTuple>,
    ) -> TableResult<Vec<u8>> {
        let body = record
            .map(|r| serde_json::to_vec(&r.to_json()))
            .transpose()
            .map_err(|e| TableError::Protocol(format!("failed to encode record: {e}")))?;

        debug!(resource = %self.resource, %method, %url, "sending request");
        self.client
            .send(HttpRequest { method, url, body })
            .map_err(TableError::transport)
            .and_then(|response| check_response(response, key))
            .inspect_err(|e| {
                warn!(resource = %self.resource, %method, error = %e, "request failed");
            })
    }
}

impl<C: HttpClient> ResourceClient for HttpResource<C> {
    fn list(&self) -> TableResult<Vec<Record>> {
        let body = self.send(Method::Get, self.collection.to_string(), None, None)?;
        serde_json::from_slice::<Vec<Record>>(&body)
            .map_err(|e| TableError::Protocol(format!("invalid record list: {e}")))
    }

    fn create(&self, record: &Record) -> TableResult<Record> {
        let body = self.send(Method::Post, self.collection.to_string(), Some(record), None)?;
        decode_record(&body)
    }

    fn update(&self, key: &KeyTuple, record: &Record) -> TableResult<Record> {
        let body = self.send(Method::Put, self.item_url(key)?, Some(record), Some(key))?;
        decode_record(&body)
    }

    fn delete(&self, key: &KeyTuple) -> TableResult<()> {
        self.send(Method::Delete, self.item_url(key)?, None, Some(key))
            .map(|_| ())
    }
}

fn decode_record(body: &[u8]) -> TableResult<Record> {
    serde_json::from_slice::<Record>(body)
        .map_err(|e| TableError::Protocol(format!("invalid record: {e}")))
}

/// Maps a response onto the error taxonomy.
///
/// 404 on a keyed request means the record is gone; any other non-2xx is a
/// validation error when the server said why, and a transport error when
/// it did not.
fn check_response(response: HttpResponse, key: Option<&KeyTuple>) -> TableResult<Vec<u8>> {
    if response.is_success() {
        return Ok(response.body);
    }
    if let (404, Some(key)) = (response.status, key) {
        return Err(TableError::NotFound {
            key: key.to_string(),
        });
    }
    match server_reason(&response.body) {
        Some(reason) => Err(TableError::Validation {
            status: response.status,
            reason,
        }),
        None => Err(TableError::status(response.status)),
    }
}

const MAX_REASON_CHARS: usize = 500;

/// Extracts a human readable reason from an error body.
///
/// JSON bodies are searched for `detail`, `error` or `message`; anything
/// else is used as plain text.
fn server_reason(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let reason = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => ["detail", "error", "message"]
            .iter()
            .find_map(|k| map.get(*k))
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| text.to_string()),
        _ => text.to_string(),
    };
    Some(reason.chars().take(MAX_REASON_CHARS).collect())
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request addressed to `path` (origin stripped).
    fn handle(&self, method: Method, path: &str, body: &[u8]) -> HttpResponse;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for std::sync::Arc<S> {
    fn handle(&self, method: Method, path: &str, body: &[u8]) -> HttpResponse {
        (**self).handle(method, path, body)
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let path = origin_relative(&request.url);
        let body = request.body.unwrap_or_default();
        Ok(self.server.handle(request.method, path, &body))
    }
}

fn origin_relative(url: &str) -> &str {
    match url.find("://") {
        Some(i) => {
            let rest = &url[i + 3..];
            rest.find('/').map(|j| &rest[j..]).unwrap_or("/")
        }
        None => url,
    }
}
