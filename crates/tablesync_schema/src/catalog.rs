//! The standard catalog of entity tables.

use crate::error::SchemaResult;
use crate::schema::{EntitySchema, FieldType};

use crate::schema::FieldType::{Date, Decimal, Integer, Text};

/// One catalog entry: a tab id and the schema it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Tab identifier used by the shell (e.g. `publicServants`).
    pub tab: String,
    /// Schema of the table.
    pub schema: EntitySchema,
}

/// Ordered set of table schemas.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

/// Tab shown when no valid tab has been persisted.
pub const DEFAULT_TAB: &str = "doctors";

type FieldDef = (&'static str, FieldType, &'static str);

// (tab, resource, title, fields, key)
const STANDARD: &[(&str, &str, &str, &[FieldDef], &[&str])] = &[
    (
        "countries",
        "countries",
        "Countries",
        &[
            ("cname", Text, "Country Name"),
            ("population", Integer, "Population"),
        ],
        &["cname"],
    ),
    (
        "users",
        "users",
        "Users",
        &[
            ("email", Text, "Email"),
            ("name", Text, "Name"),
            ("surname", Text, "Surname"),
            ("salary", Decimal, "Salary"),
            ("phone", Text, "Phone"),
            ("cname", Text, "Country"),
        ],
        &["email"],
    ),
    (
        "doctors",
        "doctors",
        "Doctors",
        &[("email", Text, "Email"), ("degree", Text, "Degree")],
        &["email"],
    ),
    (
        "publicServants",
        "public-servants",
        "Public Servants",
        &[("email", Text, "Email"), ("department", Text, "Department")],
        &["email"],
    ),
    (
        "patients",
        "patients",
        "Patients",
        &[("email", Text, "Email")],
        &["email"],
    ),
    (
        "diseaseTypes",
        "disease-types",
        "Disease Types",
        &[("id", Text, "ID"), ("description", Text, "Description")],
        &["id"],
    ),
    (
        "specializations",
        "specializations",
        "Specializations",
        &[("id", Text, "ID"), ("email", Text, "Email")],
        &["id", "email"],
    ),
    (
        "diseases",
        "diseases",
        "Diseases",
        &[
            ("disease_code", Text, "Disease Code"),
            ("pathogen", Text, "Pathogen"),
            ("description", Text, "Description"),
            ("id", Text, "ID"),
        ],
        &["disease_code"],
    ),
    (
        "discoveries",
        "discoveries",
        "Discoveries",
        &[
            ("cname", Text, "Country Name"),
            ("disease_code", Text, "Disease Code"),
            ("first_enc_date", Date, "First Encounter Date"),
        ],
        &["disease_code"],
    ),
    (
        "patientDiseases",
        "patient-diseases",
        "Patient-Disease Relationships",
        &[("email", Text, "Email"), ("disease_code", Text, "Disease Code")],
        &["email", "disease_code"],
    ),
    (
        "records",
        "records",
        "Records",
        &[
            ("email", Text, "Email"),
            ("cname", Text, "Company Name"),
            ("disease_code", Text, "Disease Code"),
            ("total_deaths", Integer, "Total Deaths"),
            ("total_patients", Integer, "Total Patients"),
        ],
        &["email", "cname", "disease_code"],
    ),
];

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The eleven standard tables in tab order.
    pub fn standard() -> SchemaResult<Self> {
        let mut catalog = Self::new();
        for (tab, resource, title, fields, key) in STANDARD {
            let schema = fields
                .iter()
                .fold(EntitySchema::builder(*resource, *title), |b, (name, ty, label)| {
                    b.field(*name, *ty, *label)
                })
                .key(key.iter().copied())
                .build()?;
            catalog.push(*tab, schema);
        }
        Ok(catalog)
    }

    /// Appends a table under the given tab id.
    pub fn push(&mut self, tab: impl Into<String>, schema: EntitySchema) {
        self.entries.push(CatalogEntry {
            tab: tab.into(),
            schema,
        });
    }

    /// Entries in tab order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Tab ids in order.
    pub fn tabs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.tab.as_str())
    }

    /// Schemas in tab order.
    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entries.iter().map(|e| &e.schema)
    }

    /// Finds a table by tab id or resource name.
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.tab == name)
            .or_else(|| self.entries.iter().find(|e| e.schema.resource() == name))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no tables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_eleven_tables() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.tabs().next(), Some("countries"));
        assert!(catalog.lookup(DEFAULT_TAB).is_some());
    }

    #[test]
    fn key_orders_match_resources() {
        let catalog = Catalog::standard().unwrap();
        let key = |name: &str| catalog.lookup(name).unwrap().schema.key_fields().to_vec();

        assert_eq!(key("countries"), vec!["cname"]);
        assert_eq!(key("public-servants"), vec!["email"]);
        assert_eq!(key("disease-types"), vec!["id"]);
        assert_eq!(key("discoveries"), vec!["disease_code"]);
        assert_eq!(key("specializations"), vec!["id", "email"]);
        assert_eq!(key("patient-diseases"), vec!["email", "disease_code"]);
        assert_eq!(key("records"), vec!["email", "cname", "disease_code"]);
    }

    #[test]
    fn lookup_by_tab_or_resource() {
        let catalog = Catalog::standard().unwrap();
        let by_tab = catalog.lookup("publicServants").unwrap();
        let by_resource = catalog.lookup("public-servants").unwrap();
        assert_eq!(by_tab, by_resource);
        assert!(catalog.lookup("invoices").is_none());
    }

    #[test]
    fn typed_fields() {
        let catalog = Catalog::standard().unwrap();
        let users = &catalog.lookup("users").unwrap().schema;
        assert_eq!(users.field("salary").unwrap().ty, FieldType::Decimal);
        let discoveries = &catalog.lookup("discoveries").unwrap().schema;
        assert_eq!(
            discoveries.field("first_enc_date").unwrap().ty,
            FieldType::Date
        );
    }
}
