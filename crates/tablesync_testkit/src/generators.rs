//! Property-based test generators using proptest.
//!
//! Provides strategies for field values, key segments, table rows and
//! sequences of user intents against a table.

use proptest::prelude::*;
use tablesync_schema::{FieldValue, Record};

/// Strategy for any primitive field value.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Empty),
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Integer),
        (-1.0e12f64..1.0e12).prop_map(FieldValue::Float),
        "[ -~]{0,16}".prop_map(FieldValue::from),
    ]
}

/// Strategy for a key segment that survives server-side trimming.
///
/// Includes characters that need percent-encoding in a path.
pub fn key_segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9@._/%?# -]{1,16}")
        .expect("Invalid regex")
        .prop_filter("Key segment must be trimmed and non-blank", |s| {
            !s.trim().is_empty() && s.trim() == s
        })
        .prop_filter("Dot segments are not addressable", |s| s != "." && s != "..")
}

/// Strategy for a country name drawn from a small pool, so lists repeat keys.
pub fn country_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Italy", "Spain", "Peru", "Chad", "Fiji"]).prop_map(String::from)
}

/// Strategy for a `countries` row.
pub fn country_strategy() -> impl Strategy<Value = Record> {
    (country_name_strategy(), 0i64..2_000_000_000).prop_map(|(cname, population)| {
        Record::new()
            .with("cname", cname)
            .with("population", population)
    })
}

/// Strategy for a list of `countries` rows that may repeat keys.
pub fn country_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(country_strategy(), 0..=max_len)
}

/// One user intent against a `countries` table.
///
/// Indexes are taken modulo the current cache length.
#[derive(Debug, Clone)]
pub enum TableIntent {
    /// Reload the table.
    Load,
    /// Begin editing the cached row at this index.
    BeginEdit(usize),
    /// Set the draft's population.
    EditPopulation(i64),
    /// Commit the edit session.
    CommitEdit,
    /// Cancel the edit session.
    CancelEdit,
    /// Delete the cached row at this index.
    Delete(usize),
    /// Set the add buffer's country name.
    AddName(String),
    /// Set the add buffer's population.
    AddPopulation(i64),
    /// Commit the add buffer.
    CommitAdd,
}

/// Strategy for generating table intents.
pub fn table_intent_strategy() -> impl Strategy<Value = TableIntent> {
    prop_oneof![
        1 => Just(TableIntent::Load),
        3 => any::<usize>().prop_map(TableIntent::BeginEdit),
        2 => (0i64..1_000_000).prop_map(TableIntent::EditPopulation),
        2 => Just(TableIntent::CommitEdit),
        1 => Just(TableIntent::CancelEdit),
        2 => any::<usize>().prop_map(TableIntent::Delete),
        2 => country_name_strategy().prop_map(TableIntent::AddName),
        1 => (0i64..1_000_000).prop_map(TableIntent::AddPopulation),
        2 => Just(TableIntent::CommitAdd),
    ]
}

/// Strategy for generating a sequence of intents.
pub fn intent_sequence_strategy(
    min_len: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<TableIntent>> {
    prop::collection::vec(table_intent_strategy(), min_len..max_len)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
