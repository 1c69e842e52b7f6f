//! Test fixtures and table helpers.
//!
//! Provides an in-process server wired to real engines through the
//! loopback HTTP client, plus record builders for the standard tables.

use std::sync::Arc;
use tablesync_engine::{
    ClientConfig, HttpClient, HttpRequest, HttpResource, HttpResponse, LoopbackClient,
    LoopbackServer, Method, TableEngine,
};
use tablesync_schema::{Catalog, EntitySchema, Record};
use tablesync_server::{ResourceServer, ServerConfig};

/// Routes loopback requests into a shared [`ResourceServer`].
#[derive(Clone)]
pub struct ServerLoopback {
    server: Arc<ResourceServer>,
}

impl ServerLoopback {
    /// Wraps a server.
    pub fn new(server: Arc<ResourceServer>) -> Self {
        Self { server }
    }

    /// The wrapped server.
    pub fn server(&self) -> &Arc<ResourceServer> {
        &self.server
    }
}

impl LoopbackServer for ServerLoopback {
    fn handle(&self, method: Method, path: &str, body: &[u8]) -> HttpResponse {
        let response = self.server.handle(method.as_str(), path, body);
        HttpResponse::new(response.status, response.body)
    }
}

/// An HTTP client that never reaches a server.
#[derive(Debug, Clone, Default)]
pub struct OfflineClient;

impl HttpClient for OfflineClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        Err(format!("{} {}: connection refused", request.method, request.url))
    }
}

/// Engine type used by [`TestTable`].
pub type LoopbackEngine = TableEngine<HttpResource<LoopbackClient<ServerLoopback>>>;

/// The standard catalog.
pub fn standard_catalog() -> Catalog {
    Catalog::standard().expect("standard catalog is valid")
}

/// Schema of a standard table, by tab id or resource name.
pub fn standard_schema(name: &str) -> EntitySchema {
    standard_catalog()
        .lookup(name)
        .unwrap_or_else(|| panic!("no standard table `{name}`"))
        .schema
        .clone()
}

/// A reference server serving the whole standard catalog.
pub fn standard_server() -> Arc<ResourceServer> {
    Arc::new(ResourceServer::from_catalog(
        ServerConfig::default(),
        &standard_catalog(),
    ))
}

/// An engine for `schema` talking to `server` over loopback.
pub fn loopback_engine(server: &Arc<ResourceServer>, schema: EntitySchema) -> LoopbackEngine {
    let client = LoopbackClient::new(ServerLoopback::new(Arc::clone(server)));
    let resource = HttpResource::new(&ClientConfig::default(), &schema, client)
        .expect("default client config is valid");
    TableEngine::new(schema, resource)
}

/// An engine for `schema` whose every request fails at the transport.
pub fn offline_engine(schema: EntitySchema) -> TableEngine<HttpResource<OfflineClient>> {
    let resource = HttpResource::new(&ClientConfig::default(), &schema, OfflineClient)
        .expect("default client config is valid");
    TableEngine::new(schema, resource)
}

/// A standard table backed by its own reference server.
pub struct TestTable {
    /// The server.
    pub server: Arc<ResourceServer>,
    /// The engine under test.
    pub engine: LoopbackEngine,
}

impl TestTable {
    /// Creates a table for a standard tab with an empty server.
    pub fn new(tab: &str) -> Self {
        let server = standard_server();
        let engine = loopback_engine(&server, standard_schema(tab));
        Self { server, engine }
    }

    /// Creates a table whose server already holds `records`, and loads it.
    pub fn seeded(tab: &str, records: impl IntoIterator<Item = Record>) -> Self {
        let table = Self::new(tab);
        let resource = table.engine.schema().resource().to_string();
        table
            .server
            .seed(&resource, records)
            .expect("seed records are valid");
        table.engine.load().expect("initial load succeeds");
        table.server.clear_requests();
        table
    }

    /// Server-side rows of this table.
    pub fn server_records(&self) -> Vec<Record> {
        self.server
            .records(self.engine.schema().resource())
            .expect("table resource is served")
    }
}

impl std::ops::Deref for TestTable {
    type Target = LoopbackEngine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// Record builders for the standard tables.
pub mod records {
    use tablesync_schema::Record;

    /// A `countries` row.
    pub fn country(cname: &str, population: i64) -> Record {
        Record::new()
            .with("cname", cname)
            .with("population", population)
    }

    /// A `users` row.
    pub fn user(email: &str, name: &str, surname: &str, salary: f64) -> Record {
        Record::new()
            .with("email", email)
            .with("name", name)
            .with("surname", surname)
            .with("salary", salary)
            .with("phone", "")
            .with("cname", "")
    }

    /// A `doctors` row.
    pub fn doctor(email: &str, degree: &str) -> Record {
        Record::new().with("email", email).with("degree", degree)
    }

    /// A `patient-diseases` row.
    pub fn patient_disease(email: &str, disease_code: &str) -> Record {
        Record::new()
            .with("email", email)
            .with("disease_code", disease_code)
    }

    /// A `records` row.
    pub fn record_row(
        email: &str,
        cname: &str,
        disease_code: &str,
        total_deaths: i64,
        total_patients: i64,
    ) -> Record {
        Record::new()
            .with("email", email)
            .with("cname", cname)
            .with("disease_code", disease_code)
            .with("total_deaths", total_deaths)
            .with("total_patients", total_patients)
    }
}

#[cfg(test)]
mod tests {
    use super::records::*;
    use super::*;
    use tablesync_engine::TableError;

    #[test]
    fn seeded_table_is_loaded() {
        let table = TestTable::seeded("countries", [country("Italy", 1), country("Spain", 2)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records(), table.server_records());
        assert!(table.server.requests().is_empty());
    }

    #[test]
    fn standard_schema_by_tab_or_resource() {
        assert_eq!(standard_schema("patientDiseases").resource(), "patient-diseases");
        assert_eq!(standard_schema("patient-diseases").key_fields().len(), 2);
    }

    #[test]
    fn offline_engine_fails_with_transport() {
        let engine = offline_engine(standard_schema("users"));
        assert!(matches!(
            engine.load(),
            Err(TableError::Transport { status: None, .. })
        ));
    }

    #[test]
    fn user_builder_matches_schema_fields() {
        let schema = standard_schema("users");
        let user = user("a@x.com", "Ada", "Lovelace", 1200.5);
        for field in schema.fields() {
            assert!(user.contains(&field.name), "{}", field.name);
        }
    }
}
