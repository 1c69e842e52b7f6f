//! Main resource server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler, ServerResponse};
use parking_lot::Mutex;
use tablesync_schema::{Catalog, EntitySchema, Record};
use tracing::{debug, warn};

/// A request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    /// Method, upper-case.
    pub method: String,
    /// Path as received.
    pub path: String,
    /// Status of the response.
    pub status: u16,
}

/// The resource server.
///
/// Serves `GET`/`POST` on `/<prefix>/<resource>/` and `PUT`/`DELETE` on
/// `/<prefix>/<resource>/<key-segments>` for every registered schema,
/// holding records in memory.
///
/// # Example
///
/// ```
/// use tablesync_schema::Catalog;
/// use tablesync_server::{ResourceServer, ServerConfig};
///
/// let catalog = Catalog::standard().unwrap();
/// let server = ResourceServer::from_catalog(ServerConfig::default(), &catalog);
///
/// let response = server.handle("POST", "/api/countries/", br#"{"cname":"Italy","population":"59"}"#);
/// assert_eq!(response.status, 201);
///
/// let response = server.handle("GET", "/api/countries/", b"");
/// assert_eq!(response.body_json().unwrap()[0]["population"], 59);
/// ```
pub struct ResourceServer {
    context: HandlerContext,
    fail_next: Mutex<Option<ServerResponse>>,
    requests: Mutex<Vec<RequestLogEntry>>,
}

impl ResourceServer {
    /// Creates a server for the given schemas.
    pub fn new(config: ServerConfig, schemas: impl IntoIterator<Item = EntitySchema>) -> Self {
        Self {
            context: HandlerContext::new(config, schemas),
            fail_next: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a server for every table of a catalog.
    pub fn from_catalog(config: ServerConfig, catalog: &Catalog) -> Self {
        Self::new(config, catalog.schemas().cloned())
    }

    /// Handles one request. Never fails; errors become error responses.
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> ServerResponse {
        let response = match self.fail_next.lock().take() {
            Some(injected) => {
                debug!(method, path, status = injected.status, "injected failure");
                injected
            }
            None => match RequestHandler::new(&self.context).handle(method, path, body) {
                Ok(response) => response,
                Err(e) => {
                    warn!(method, path, status = e.status(), error = %e, "request rejected");
                    ServerResponse::error(&e)
                }
            },
        };

        self.requests.lock().push(RequestLogEntry {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status: response.status,
        });
        response
    }

    /// Inserts records directly, as if created through the API.
    pub fn seed(&self, resource: &str, records: impl IntoIterator<Item = Record>) -> ServerResult<usize> {
        let config = &self.context.config;
        self.context.with_table(resource, |table| {
            let mut count = 0;
            for record in records {
                table.insert(record, config)?;
                count += 1;
            }
            Ok(count)
        })
    }

    /// Current rows of a resource.
    pub fn records(&self, resource: &str) -> ServerResult<Vec<Record>> {
        self.context
            .with_table(resource, |table| Ok(table.rows().to_vec()))
    }

    /// Makes the next request fail with `status` and `body`.
    pub fn fail_next(&self, status: u16, body: impl Into<Vec<u8>>) {
        *self.fail_next.lock() = Some(ServerResponse {
            status,
            body: body.into(),
        });
    }

    /// Requests handled so far.
    pub fn requests(&self) -> Vec<RequestLogEntry> {
        self.requests.lock().clone()
    }

    /// Clears the request log.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Names of the served resources.
    pub fn resources(&self) -> Vec<String> {
        self.context.resources()
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }
}
