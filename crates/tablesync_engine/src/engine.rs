//! Table synchronization engine.
//!
//! A [`TableEngine`] owns three pieces of state for one entity table:
//!
//! - the cache, the ordered list of records last confirmed by the server;
//! - the edit session, at most one draft of an existing record;
//! - the add buffer, the draft of the next record to create.
//!
//! The cache only changes on confirmed server responses. A failed request
//! leaves every piece of state as it was before the intent.

use crate::error::{TableError, TableResult};
use crate::events::{Operation, TableEvent, TableFeed};
use crate::transport::ResourceClient;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::mpsc::Receiver;
use tablesync_schema::{EntitySchema, FieldValue, KeyTuple, Record};
use tracing::{debug, error, info, warn};

/// Edit state of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    /// No edit session.
    Idle,
    /// Editing the record with this original key.
    Editing(KeyTuple),
}

impl EditState {
    /// Returns true if no edit session is open.
    pub fn is_idle(&self) -> bool {
        matches!(self, EditState::Idle)
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditState::Idle => f.write_str("idle"),
            EditState::Editing(key) => write!(f, "editing {key}"),
        }
    }
}

/// The single in-progress edit of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    /// Key of the cached record being edited. Updates are addressed here.
    pub original_key: KeyTuple,
    /// Working copy of the record.
    pub draft: Record,
}

/// Consistent copy of the whole table state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// Cached records in display order.
    pub records: Vec<Record>,
    /// Open edit session, if any.
    pub session: Option<EditSession>,
    /// Pending add buffer.
    pub add_buffer: Record,
}

impl TableSnapshot {
    /// Edit state derived from the session.
    pub fn edit_state(&self) -> EditState {
        match &self.session {
            Some(session) => EditState::Editing(session.original_key.clone()),
            None => EditState::Idle,
        }
    }
}

/// Counters of engine operations.
#[derive(Debug, Clone, Default)]
pub struct TableStats {
    /// Successful list fetches.
    pub loads: u64,
    /// Successful creates.
    pub creates: u64,
    /// Successful updates.
    pub updates: u64,
    /// Successful deletes.
    pub deletes: u64,
    /// Failed remote operations.
    pub failures: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

struct TableState {
    records: Vec<Record>,
    session: Option<EditSession>,
    add_buffer: Record,
}

impl TableState {
    fn position(&self, schema: &EntitySchema, key: &KeyTuple) -> Option<usize> {
        self.records.iter().position(|r| schema.has_key(r, key))
    }

    fn edit_state(&self) -> EditState {
        match &self.session {
            Some(session) => EditState::Editing(session.original_key.clone()),
            None => EditState::Idle,
        }
    }
}

/// Synchronizes one entity table with its remote resource.
///
/// All methods take `&self`; the engine can be shared between threads.
/// Mutating intents are serialized by an operation lock held across the
/// network call, so at most one request per table is in flight. Readers
/// never wait on the network.
pub struct TableEngine<C: ResourceClient> {
    schema: EntitySchema,
    client: C,
    state: RwLock<TableState>,
    op_lock: Mutex<()>,
    stats: RwLock<TableStats>,
    feed: TableFeed,
}

impl<C: ResourceClient> TableEngine<C> {
    /// Creates an engine with an empty cache.
    pub fn new(schema: EntitySchema, client: C) -> Self {
        let add_buffer = schema.default_record();
        Self {
            schema,
            client,
            state: RwLock::new(TableState {
                records: Vec::new(),
                session: None,
                add_buffer,
            }),
            op_lock: Mutex::new(()),
            stats: RwLock::new(TableStats::default()),
            feed: TableFeed::new(),
        }
    }

    /// The table's schema.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// The resource client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Subscribes to operation events.
    pub fn subscribe(&self) -> Receiver<TableEvent> {
        self.feed.subscribe()
    }

    /// Operation counters.
    pub fn stats(&self) -> TableStats {
        self.stats.read().clone()
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Cached records in display order.
    pub fn records(&self) -> Vec<Record> {
        self.state.read().records.clone()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Current edit state.
    pub fn edit_state(&self) -> EditState {
        self.state.read().edit_state()
    }

    /// Open edit session, if any.
    pub fn session(&self) -> Option<EditSession> {
        self.state.read().session.clone()
    }

    /// Draft of the open edit session, if any.
    pub fn draft(&self) -> Option<Record> {
        self.state.read().session.as_ref().map(|s| s.draft.clone())
    }

    /// Pending add buffer.
    pub fn add_buffer(&self) -> Record {
        self.state.read().add_buffer.clone()
    }

    /// Copy of cache, session and add buffer taken under one lock.
    pub fn snapshot(&self) -> TableSnapshot {
        let state = self.state.read();
        TableSnapshot {
            records: state.records.clone(),
            session: state.session.clone(),
            add_buffer: state.add_buffer.clone(),
        }
    }

    /// Cached record with the given key.
    pub fn find(&self, key: &KeyTuple) -> Option<Record> {
        let state = self.state.read();
        state
            .position(&self.schema, key)
            .map(|i| state.records[i].clone())
    }

    /// Returns true if `record` is the one being edited.
    pub fn is_editing(&self, record: &Record) -> bool {
        let key = self.schema.key_of(record);
        self.state
            .read()
            .session
            .as_ref()
            .is_some_and(|s| s.original_key == key)
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Replaces the cache with the server's list.
    ///
    /// Duplicate keys in the response collapse to one entry: the later
    /// record wins and takes the earlier one's position. An edit session
    /// whose record is no longer listed is discarded. Returns the number of
    /// cached records.
    pub fn load(&self) -> TableResult<usize> {
        let _op = self.op_lock.lock();
        debug!(resource = %self.schema.resource(), "loading table");

        let listed = match self.client.list() {
            Ok(listed) => listed,
            Err(e) => return Err(self.fail(Operation::Load, e)),
        };
        let received = listed.len();
        let records = dedup_by_key(&self.schema, listed);
        let count = records.len();

        {
            let mut state = self.state.write();
            state.records = records;
            let stale = state
                .session
                .as_ref()
                .is_some_and(|s| state.position(&self.schema, &s.original_key).is_none());
            if stale {
                state.session = None;
                debug!(resource = %self.schema.resource(), "edited record vanished on reload");
            }
        }

        if received != count {
            warn!(
                resource = %self.schema.resource(),
                received,
                count,
                "duplicate keys in list response"
            );
        }
        self.stats.write().loads += 1;
        info!(resource = %self.schema.resource(), count, "table loaded");
        self.feed.emit(TableEvent::Loaded { count });
        Ok(count)
    }

    /// Opens an edit session on a cached record.
    ///
    /// Only legal while idle. The draft is a copy of the cached record
    /// with the same key as `record`.
    pub fn begin_edit(&self, record: &Record) -> TableResult<()> {
        let key = self.schema.key_of(record);
        let _op = self.op_lock.lock();
        let mut state = self.state.write();

        if let Some(session) = &state.session {
            return Err(self.reject(TableError::InvalidTransition {
                state: format!("editing {}", session.original_key),
                action: "begin an edit",
            }));
        }
        let Some(index) = state.position(&self.schema, &key) else {
            return Err(self.reject(TableError::UnknownRecord {
                key: key.to_string(),
            }));
        };

        let draft = state.records[index].clone();
        debug!(resource = %self.schema.resource(), %key, "edit started");
        state.session = Some(EditSession {
            original_key: key,
            draft,
        });
        Ok(())
    }

    /// Sets one draft field after coercing it to the field's type.
    pub fn update_draft_field(
        &self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> TableResult<()> {
        let value = value.into();
        let _op = self.op_lock.lock();
        let mut state = self.state.write();

        let Some(session) = state.session.as_mut() else {
            return Err(self.reject(TableError::InvalidTransition {
                state: EditState::Idle.to_string(),
                action: "edit a field",
            }));
        };
        let value = self
            .schema
            .coerce(field, &value)
            .map_err(|e| self.reject(e.into()))?;
        session.draft.set(field, value);
        Ok(())
    }

    /// Sends the draft as an update addressed by the original key.
    ///
    /// On success the cached record is replaced in place by the server's
    /// version and the session closes. On failure the session stays open
    /// with its draft unchanged, so the same commit can be retried.
    pub fn commit_edit(&self) -> TableResult<Record> {
        let _op = self.op_lock.lock();
        let Some(session) = self.state.read().session.clone() else {
            return Err(self.reject(TableError::InvalidTransition {
                state: EditState::Idle.to_string(),
                action: "commit an edit",
            }));
        };

        let updated = match self.client.update(&session.original_key, &session.draft) {
            Ok(updated) => updated,
            Err(e) => return Err(self.fail(Operation::Update, e)),
        };
        let key = self.schema.key_of(&updated);

        {
            let mut state = self.state.write();
            match state.position(&self.schema, &session.original_key) {
                Some(index) => {
                    state.records[index] = updated.clone();
                    if key != session.original_key {
                        let schema = &self.schema;
                        let mut i = 0;
                        state.records.retain(|r| {
                            let keep = i == index || !schema.has_key(r, &key);
                            i += 1;
                            keep
                        });
                    }
                }
                None => warn!(
                    resource = %self.schema.resource(),
                    key = %session.original_key,
                    "updated record is no longer cached"
                ),
            }
            state.session = None;
        }

        self.stats.write().updates += 1;
        info!(
            resource = %self.schema.resource(),
            original_key = %session.original_key,
            %key,
            "record updated"
        );
        self.feed.emit(TableEvent::Updated {
            original_key: session.original_key.to_string(),
            key: key.to_string(),
        });
        Ok(updated)
    }

    /// Discards the edit session.
    pub fn cancel_edit(&self) -> TableResult<()> {
        let _op = self.op_lock.lock();
        match self.state.write().session.take() {
            Some(session) => {
                debug!(resource = %self.schema.resource(), key = %session.original_key, "edit cancelled");
                Ok(())
            }
            None => Err(self.reject(TableError::InvalidTransition {
                state: EditState::Idle.to_string(),
                action: "cancel an edit",
            })),
        }
    }

    /// Deletes a cached record on the server, then from the cache.
    ///
    /// Legal in any state. Deleting the record being edited discards the
    /// session.
    pub fn delete_record(&self, record: &Record) -> TableResult<()> {
        let key = self.schema.key_of(record);
        let _op = self.op_lock.lock();

        if self.state.read().position(&self.schema, &key).is_none() {
            return Err(self.reject(TableError::UnknownRecord {
                key: key.to_string(),
            }));
        }

        if let Err(e) = self.client.delete(&key) {
            return Err(self.fail(Operation::Delete, e));
        }

        {
            let mut state = self.state.write();
            let schema = &self.schema;
            state.records.retain(|r| !schema.has_key(r, &key));
            if state
                .session
                .as_ref()
                .is_some_and(|s| s.original_key == key)
            {
                state.session = None;
                debug!(resource = %self.schema.resource(), %key, "edited record deleted");
            }
        }

        self.stats.write().deletes += 1;
        info!(resource = %self.schema.resource(), %key, "record deleted");
        self.feed.emit(TableEvent::Deleted {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Sets one add buffer field after coercing it to the field's type.
    ///
    /// Unknown fields are ignored.
    pub fn update_add_buffer_field(&self, field: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let _op = self.op_lock.lock();
        match self.schema.coerce(field, &value) {
            Ok(value) => {
                self.state.write().add_buffer.set(field, value);
            }
            Err(e) => warn!(resource = %self.schema.resource(), error = %e, "add buffer field ignored"),
        }
    }

    /// Creates the add buffer on the server and appends the result.
    ///
    /// On success the buffer resets to the schema defaults. On failure it
    /// keeps the user's input.
    pub fn commit_add(&self) -> TableResult<Record> {
        let _op = self.op_lock.lock();
        let buffer = self.state.read().add_buffer.clone();

        let created = match self.client.create(&buffer) {
            Ok(created) => created,
            Err(e) => return Err(self.fail(Operation::Create, e)),
        };
        let key = self.schema.key_of(&created);

        {
            let mut state = self.state.write();
            match state.position(&self.schema, &key) {
                Some(index) => {
                    warn!(resource = %self.schema.resource(), %key, "created key already cached");
                    state.records[index] = created.clone();
                }
                None => state.records.push(created.clone()),
            }
            state.add_buffer = self.schema.default_record();
        }

        self.stats.write().creates += 1;
        info!(resource = %self.schema.resource(), %key, "record created");
        self.feed.emit(TableEvent::Created {
            key: key.to_string(),
        });
        Ok(created)
    }

    /// Discards the add buffer input.
    pub fn reset_add_buffer(&self) {
        let _op = self.op_lock.lock();
        self.state.write().add_buffer = self.schema.default_record();
    }

    /// Records a remote failure and publishes it.
    fn fail(&self, operation: Operation, err: TableError) -> TableError {
        error!(
            resource = %self.schema.resource(),
            %operation,
            error = %err,
            "remote operation failed"
        );
        {
            let mut stats = self.stats.write();
            stats.failures += 1;
            stats.last_error = Some(err.to_string());
        }
        self.feed.emit(TableEvent::Failed {
            operation,
            message: err.to_string(),
        });
        err
    }

    /// Logs a locally rejected intent.
    fn reject(&self, err: TableError) -> TableError {
        warn!(resource = %self.schema.resource(), error = %err, "intent rejected");
        err
    }
}

impl<C: ResourceClient> fmt::Debug for TableEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("TableEngine")
            .field("resource", &self.schema.resource())
            .field("records", &state.records.len())
            .field("edit_state", &state.edit_state())
            .finish()
    }
}

/// Collapses duplicate keys, last write wins at the first position.
fn dedup_by_key(schema: &EntitySchema, listed: Vec<Record>) -> Vec<Record> {
    let mut keys: Vec<KeyTuple> = Vec::with_capacity(listed.len());
    let mut records: Vec<Record> = Vec::with_capacity(listed.len());
    for record in listed {
        let key = schema.key_of(&record);
        match keys.iter().position(|k| *k == key) {
            Some(index) => records[index] = record,
            None => {
                keys.push(key);
                records.push(record);
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockResource, ResourceCall};
    use std::sync::Arc;
    use tablesync_schema::{FieldType, SchemaError};

    fn countries() -> EntitySchema {
        EntitySchema::builder("countries", "Countries")
            .field("cname", FieldType::Text, "Country Name")
            .field("population", FieldType::Integer, "Population")
            .key(["cname"])
            .build()
            .unwrap()
    }

    fn records_schema() -> EntitySchema {
        EntitySchema::builder("records", "Records")
            .field("email", FieldType::Text, "Email")
            .field("cname", FieldType::Text, "Company Name")
            .field("disease_code", FieldType::Text, "Disease Code")
            .field("total_deaths", FieldType::Integer, "Total Deaths")
            .field("total_patients", FieldType::Integer, "Total Patients")
            .key(["email", "cname", "disease_code"])
            .build()
            .unwrap()
    }

    fn country(name: &str, population: i64) -> Record {
        Record::new()
            .with("cname", name)
            .with("population", population)
    }

    fn loaded(
        schema: EntitySchema,
        records: Vec<Record>,
    ) -> (TableEngine<Arc<MockResource>>, Arc<MockResource>) {
        let mock = Arc::new(MockResource::new());
        mock.set_list_response(Ok(records));
        let engine = TableEngine::new(schema, Arc::clone(&mock));
        engine.load().unwrap();
        mock.clear_calls();
        (engine, mock)
    }

    #[test]
    fn new_engine_is_empty_and_idle() {
        let engine = TableEngine::new(countries(), MockResource::new());
        assert!(engine.is_empty());
        assert!(engine.edit_state().is_idle());
        assert_eq!(engine.add_buffer(), countries().default_record());
    }

    #[test]
    fn load_dedups_last_write_wins() {
        let (engine, _) = loaded(
            countries(),
            vec![
                country("Italy", 1),
                country("France", 2),
                country("Italy", 3),
            ],
        );

        assert_eq!(
            engine.records(),
            vec![country("Italy", 3), country("France", 2)]
        );
    }

    #[test]
    fn load_failure_keeps_cache() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        mock.set_list_response(Err(TableError::transport("connection refused")));

        let err = engine.load().unwrap_err();
        assert_eq!(err, TableError::transport("connection refused"));
        assert_eq!(engine.records(), vec![country("Italy", 1)]);
        assert_eq!(engine.stats().failures, 1);
    }

    #[test]
    fn reload_drops_session_of_vanished_record() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();

        mock.set_list_response(Ok(vec![country("Italy", 5)]));
        engine.load().unwrap();
        assert!(!engine.edit_state().is_idle());

        mock.set_list_response(Ok(vec![country("Spain", 2)]));
        engine.load().unwrap();
        assert!(engine.edit_state().is_idle());
    }

    #[test]
    fn single_edit_session() {
        let (engine, _) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        engine.update_draft_field("population", 9i64).unwrap();

        let err = engine.begin_edit(&country("Spain", 2)).unwrap_err();
        assert!(matches!(err, TableError::InvalidTransition { .. }));
        assert_eq!(
            engine.edit_state(),
            EditState::Editing(KeyTuple::new(vec!["Italy".into()]))
        );
        assert_eq!(engine.draft(), Some(country("Italy", 9)));
    }

    #[test]
    fn begin_edit_copies_cached_record() {
        let (engine, _) = loaded(countries(), vec![country("Italy", 1)]);
        engine.begin_edit(&country("Italy", 999)).unwrap();
        assert_eq!(engine.draft(), Some(country("Italy", 1)));
        assert!(engine.is_editing(&country("Italy", 0)));
    }

    #[test]
    fn begin_edit_unknown_record() {
        let (engine, _) = loaded(countries(), vec![country("Italy", 1)]);
        let err = engine.begin_edit(&country("Peru", 1)).unwrap_err();
        assert_eq!(err, TableError::UnknownRecord { key: "Peru".into() });
        assert!(engine.edit_state().is_idle());
    }

    #[test]
    fn draft_field_requires_session() {
        let (engine, _) = loaded(countries(), vec![country("Italy", 1)]);
        assert!(matches!(
            engine.update_draft_field("population", 2i64),
            Err(TableError::InvalidTransition { .. })
        ));
        assert!(matches!(
            engine.commit_edit(),
            Err(TableError::InvalidTransition { .. })
        ));
        assert!(matches!(
            engine.cancel_edit(),
            Err(TableError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn draft_field_is_coerced_and_checked() {
        let (engine, _) = loaded(countries(), vec![country("Italy", 1)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();

        engine.update_draft_field("population", "60000000").unwrap();
        assert_eq!(
            engine.draft().unwrap().get("population"),
            Some(&FieldValue::Integer(60_000_000))
        );

        engine.update_draft_field("population", "lots").unwrap();
        assert_eq!(
            engine.draft().unwrap().get("population"),
            Some(&FieldValue::Empty)
        );

        let err = engine.update_draft_field("capital", "Rome").unwrap_err();
        assert!(matches!(
            err,
            TableError::Schema(SchemaError::UnknownField { .. })
        ));
        assert_eq!(engine.records(), vec![country("Italy", 1)]);
    }

    #[test]
    fn countries_edit_scenario() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 59_000_000)]);
        engine.begin_edit(&country("Italy", 59_000_000)).unwrap();
        engine.update_draft_field("population", "60000000").unwrap();
        mock.set_update_response(Ok(country("Italy", 60_000_000)));

        let updated = engine.commit_edit().unwrap();
        assert_eq!(updated, country("Italy", 60_000_000));
        assert_eq!(
            mock.calls(),
            vec![ResourceCall::Update(
                KeyTuple::new(vec!["Italy".into()]),
                country("Italy", 60_000_000)
            )]
        );
        assert_eq!(engine.records(), vec![country("Italy", 60_000_000)]);
        assert!(engine.edit_state().is_idle());
    }

    #[test]
    fn commit_edit_failure_is_retryable() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        engine.update_draft_field("population", 2i64).unwrap();
        mock.set_update_response(Err(TableError::status(500)));

        let before = engine.snapshot();
        assert!(engine.commit_edit().is_err());
        assert_eq!(engine.snapshot(), before);
        assert!(engine.commit_edit().is_err());
        assert_eq!(engine.snapshot(), before);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[test]
    fn commit_edit_addresses_original_key() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        engine.update_draft_field("cname", "Spain").unwrap();
        mock.set_update_response(Ok(country("Spain", 1)));

        engine.commit_edit().unwrap();
        assert_eq!(
            mock.calls(),
            vec![ResourceCall::Update(
                KeyTuple::new(vec!["Italy".into()]),
                country("Spain", 1)
            )]
        );
        assert_eq!(engine.records(), vec![country("Spain", 1)]);
    }

    #[test]
    fn cancel_edit_keeps_cache() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        engine.update_draft_field("population", 7i64).unwrap();
        engine.cancel_edit().unwrap();

        assert!(engine.edit_state().is_idle());
        assert_eq!(engine.records(), vec![country("Italy", 1)]);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn delete_invalidates_session() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        mock.set_delete_response(Ok(()));

        engine.delete_record(&country("Italy", 1)).unwrap();
        assert!(engine.edit_state().is_idle());
        assert_eq!(engine.records(), vec![country("Spain", 2)]);
    }

    #[test]
    fn delete_other_record_keeps_session() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        engine.begin_edit(&country("Italy", 1)).unwrap();
        mock.set_delete_response(Ok(()));

        engine.delete_record(&country("Spain", 2)).unwrap();
        assert!(engine.is_editing(&country("Italy", 1)));
    }

    #[test]
    fn delete_unknown_record_sends_nothing() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        let err = engine.delete_record(&country("Peru", 1)).unwrap_err();
        assert_eq!(err, TableError::UnknownRecord { key: "Peru".into() });
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn composite_key_delete_scenario() {
        let rec = |email: &str, cname: &str, code: &str| {
            Record::new()
                .with("email", email)
                .with("cname", cname)
                .with("disease_code", code)
                .with("total_deaths", 1i64)
                .with("total_patients", 2i64)
        };
        let (engine, mock) = loaded(
            records_schema(),
            vec![rec("a@x.com", "Italy", "D1"), rec("a@x.com", "Italy", "D2")],
        );
        mock.set_delete_response(Err(TableError::NotFound {
            key: "a@x.com/Italy/D1".into(),
        }));

        let err = engine.delete_record(&rec("a@x.com", "Italy", "D1")).unwrap_err();
        assert!(matches!(err, TableError::NotFound { .. }));
        assert_eq!(engine.len(), 2);

        mock.set_delete_response(Ok(()));
        engine.delete_record(&rec("a@x.com", "Italy", "D1")).unwrap();
        assert_eq!(engine.records(), vec![rec("a@x.com", "Italy", "D2")]);
        assert_eq!(
            mock.calls()[1],
            ResourceCall::Delete(KeyTuple::new(vec![
                "a@x.com".into(),
                "Italy".into(),
                "D1".into()
            ]))
        );
    }

    #[test]
    fn add_round_trip() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        engine.update_add_buffer_field("cname", "  Peru ");
        engine.update_add_buffer_field("population", "33");
        engine.update_add_buffer_field("capital", "Lima");
        assert_eq!(engine.add_buffer(), country("  Peru ", 33));

        mock.set_create_response(Ok(country("Peru", 33)));
        let created = engine.commit_add().unwrap();

        assert_eq!(created, country("Peru", 33));
        assert_eq!(engine.records(), vec![country("Italy", 1), country("Peru", 33)]);
        assert_eq!(engine.add_buffer(), countries().default_record());
    }

    #[test]
    fn add_error_scenario() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        engine.update_add_buffer_field("cname", "Italy");
        engine.update_add_buffer_field("population", 5i64);
        mock.set_create_response(Err(TableError::Validation {
            status: 409,
            reason: "country already exists".into(),
        }));
        let rx = engine.subscribe();

        let err = engine.commit_add().unwrap_err();
        assert_eq!(err.http_status(), Some(409));
        assert_eq!(engine.add_buffer(), country("Italy", 5));
        assert_eq!(engine.records(), vec![country("Italy", 1)]);
        assert_eq!(
            rx.try_recv().unwrap(),
            TableEvent::Failed {
                operation: Operation::Create,
                message: err.to_string()
            }
        );
    }

    #[test]
    fn commit_add_failure_is_retryable() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        engine.update_add_buffer_field("cname", "Peru");
        engine.update_add_buffer_field("population", 33i64);
        mock.set_create_response(Err(TableError::status(503)));

        let before = engine.snapshot();
        assert!(engine.commit_add().is_err());
        assert_eq!(engine.snapshot(), before);
        assert!(engine.commit_add().is_err());
        assert_eq!(engine.snapshot(), before);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(calls[0], ResourceCall::Create(country("Peru", 33)));
    }

    #[test]
    fn add_with_cached_key_replaces_in_place() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1), country("Spain", 2)]);
        mock.set_create_response(Ok(country("Italy", 3)));

        engine.commit_add().unwrap();
        assert_eq!(engine.records(), vec![country("Italy", 3), country("Spain", 2)]);
    }

    #[test]
    fn events_and_stats() {
        let mock = Arc::new(MockResource::new());
        let engine = TableEngine::new(countries(), Arc::clone(&mock));
        let rx = engine.subscribe();

        mock.set_list_response(Ok(vec![country("Italy", 1)]));
        mock.set_delete_response(Ok(()));
        engine.load().unwrap();
        engine.delete_record(&country("Italy", 1)).unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                TableEvent::Loaded { count: 1 },
                TableEvent::Deleted { key: "Italy".into() }
            ]
        );

        let stats = engine.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let (engine, mock) = loaded(countries(), vec![country("Italy", 1)]);
        mock.set_list_response(Ok(vec![country("Italy", 1), country("Spain", 2)]));
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.load().unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(engine.stats().loads, 5);
    }
}
