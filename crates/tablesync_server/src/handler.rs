//! Request routing and handlers for resource endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::ResourceTable;
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use tablesync_schema::{EntitySchema, Record};
use tracing::{debug, info};

/// A response produced by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    /// HTTP status.
    pub status: u16,
    /// Body bytes (JSON or empty).
    pub body: Vec<u8>,
}

impl ServerResponse {
    /// A response with a JSON body.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: value.to_string().into_bytes(),
        }
    }

    /// A response with no body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// The error response for `err`.
    pub fn error(err: &ServerError) -> Self {
        Self::json(err.status(), &err.body())
    }

    /// Parses the body as JSON.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Where a request path points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/<prefix>/<resource>/`
    Collection {
        /// Resource name.
        resource: String,
    },
    /// `/<prefix>/<resource>/<k1>/<k2>...`
    Item {
        /// Resource name.
        resource: String,
        /// Decoded key segments in key order.
        key: Vec<String>,
    },
}

impl Route {
    /// Parses a request path under the configured prefix.
    ///
    /// Key segments are percent-decoded. A query string is ignored.
    pub fn parse(config: &ServerConfig, path: &str) -> ServerResult<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments.len() > 1 && segments.last() == Some(&"") {
            segments.pop();
        }

        let prefix = config.prefix_segments();
        if segments.len() <= prefix.len() || segments[..prefix.len()] != prefix[..] {
            return Err(ServerError::UnknownResource(path.to_string()));
        }
        let rest = &segments[prefix.len()..];
        let resource = decode_segment(rest[0])?;
        if resource.is_empty() {
            return Err(ServerError::UnknownResource(path.to_string()));
        }

        if rest.len() == 1 {
            return Ok(Route::Collection { resource });
        }
        let key = rest[1..]
            .iter()
            .map(|s| decode_segment(s))
            .collect::<ServerResult<Vec<_>>>()?;
        Ok(Route::Item { resource, key })
    }

    /// Resource name of the route.
    pub fn resource(&self) -> &str {
        match self {
            Route::Collection { resource } | Route::Item { resource, .. } => resource,
        }
    }
}

fn decode_segment(segment: &str) -> ServerResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ServerError::InvalidRequest(format!("invalid path segment `{segment}`: {e}")))
}

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    tables: RwLock<HashMap<String, ResourceTable>>,
}

impl HandlerContext {
    /// Creates a context serving the given schemas.
    pub fn new(config: ServerConfig, schemas: impl IntoIterator<Item = EntitySchema>) -> Self {
        let tables = schemas
            .into_iter()
            .map(|schema| (schema.resource().to_string(), ResourceTable::new(schema)))
            .collect();
        Self {
            config,
            tables: RwLock::new(tables),
        }
    }

    /// Runs `f` on the named table.
    pub fn with_table<T>(
        &self,
        resource: &str,
        f: impl FnOnce(&mut ResourceTable) -> ServerResult<T>,
    ) -> ServerResult<T> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(resource)
            .ok_or_else(|| ServerError::UnknownResource(resource.to_string()))?;
        f(table)
    }

    /// Names of the served resources, sorted.
    pub fn resources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Handler for resource requests.
pub struct RequestHandler<'a> {
    context: &'a HandlerContext,
}

impl<'a> RequestHandler<'a> {
    /// Creates a handler over a context.
    pub fn new(context: &'a HandlerContext) -> Self {
        Self { context }
    }

    /// Dispatches a request to its endpoint.
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> ServerResult<ServerResponse> {
        let route = Route::parse(&self.context.config, path)?;
        let not_allowed = || ServerError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
        };

        match (method.to_ascii_uppercase().as_str(), &route) {
            ("GET", Route::Collection { resource }) => self.handle_list(resource),
            ("POST", Route::Collection { resource }) => self.handle_create(resource, body),
            ("PUT", Route::Item { resource, key }) => self.handle_update(resource, key, body),
            ("DELETE", Route::Item { resource, key }) => self.handle_delete(resource, key),
            _ => {
                // Unknown resources are 404 whatever the method.
                self.context.with_table(route.resource(), |_| Ok(()))?;
                Err(not_allowed())
            }
        }
    }

    /// Handles `GET /<resource>/`.
    pub fn handle_list(&self, resource: &str) -> ServerResult<ServerResponse> {
        let rows = self
            .context
            .with_table(resource, |table| Ok(table.rows().to_vec()))?;
        debug!(resource, count = rows.len(), "list");
        let body = serde_json::Value::Array(rows.iter().map(Record::to_json).collect());
        Ok(ServerResponse::json(200, &body))
    }

    /// Handles `POST /<resource>/`.
    pub fn handle_create(&self, resource: &str, body: &[u8]) -> ServerResult<ServerResponse> {
        let input = parse_record(body)?;
        let config = &self.context.config;
        let created = self
            .context
            .with_table(resource, |table| table.insert(input, config))?;
        info!(resource, "record created");
        Ok(ServerResponse::json(201, &created.to_json()))
    }

    /// Handles `PUT /<resource>/<key>`.
    pub fn handle_update(
        &self,
        resource: &str,
        key: &[String],
        body: &[u8],
    ) -> ServerResult<ServerResponse> {
        let config = &self.context.config;
        let updated = self.context.with_table(resource, |table| {
            let key = table.parse_key(key)?;
            let input = parse_record(body)?;
            table.update(&key, input, config)
        })?;
        info!(resource, "record updated");
        Ok(ServerResponse::json(200, &updated.to_json()))
    }

    /// Handles `DELETE /<resource>/<key>`.
    pub fn handle_delete(&self, resource: &str, key: &[String]) -> ServerResult<ServerResponse> {
        self.context.with_table(resource, |table| {
            let key = table.parse_key(key)?;
            table.remove(&key)
        })?;
        info!(resource, "record deleted");
        Ok(ServerResponse::empty(204))
    }
}

fn parse_record(body: &[u8]) -> ServerResult<Record> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ServerError::InvalidRequest(format!("body is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ServerError::InvalidRequest(
            "body must be a JSON object".into(),
        ));
    }
    Ok(Record::from_json(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::default()
    }

    #[test]
    fn parse_collection_routes() {
        let route = Route::parse(&config(), "/api/countries/").unwrap();
        assert_eq!(
            route,
            Route::Collection {
                resource: "countries".into()
            }
        );
        let route = Route::parse(&config(), "/api/countries?limit=3").unwrap();
        assert_eq!(route.resource(), "countries");
    }

    #[test]
    fn parse_item_routes_decodes_segments() {
        let route = Route::parse(&config(), "/api/records/a@x.com/New%20Zealand/D%2F1").unwrap();
        assert_eq!(
            route,
            Route::Item {
                resource: "records".into(),
                key: vec!["a@x.com".into(), "New Zealand".into(), "D/1".into()]
            }
        );
    }

    #[test]
    fn parse_rejects_paths_outside_prefix() {
        assert!(matches!(
            Route::parse(&config(), "/v2/countries/"),
            Err(ServerError::UnknownResource(_))
        ));
        assert!(matches!(
            Route::parse(&config(), "/api/"),
            Err(ServerError::UnknownResource(_))
        ));
        assert!(matches!(
            Route::parse(&config(), "/api/x/%FF"),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn parse_without_prefix() {
        let config = config().with_api_prefix("");
        assert_eq!(
            Route::parse(&config, "/users/a@x.com").unwrap(),
            Route::Item {
                resource: "users".into(),
                key: vec!["a@x.com".into()]
            }
        );
    }

    #[test]
    fn parse_record_requires_object() {
        assert!(parse_record(b"[1]").is_err());
        assert!(parse_record(b"{").is_err());
        assert!(parse_record(br#"{"cname":"Italy"}"#).is_ok());
    }
}
