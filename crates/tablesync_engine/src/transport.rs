//! Remote resource abstraction.

use crate::error::{TableError, TableResult};
use parking_lot::Mutex;
use tablesync_schema::{KeyTuple, Record};

/// CRUD access to one remote resource.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, loopback, scripted mocks for testing).
pub trait ResourceClient: Send + Sync {
    /// Fetches every record of the resource.
    fn list(&self) -> TableResult<Vec<Record>>;

    /// Creates a record; the server may normalize fields.
    fn create(&self, record: &Record) -> TableResult<Record>;

    /// Replaces the record addressed by `key`.
    fn update(&self, key: &KeyTuple, record: &Record) -> TableResult<Record>;

    /// Deletes the record addressed by `key`.
    fn delete(&self, key: &KeyTuple) -> TableResult<()>;
}

impl<T: ResourceClient + ?Sized> ResourceClient for std::sync::Arc<T> {
    fn list(&self) -> TableResult<Vec<Record>> {
        (**self).list()
    }

    fn create(&self, record: &Record) -> TableResult<Record> {
        (**self).create(record)
    }

    fn update(&self, key: &KeyTuple, record: &Record) -> TableResult<Record> {
        (**self).update(key, record)
    }

    fn delete(&self, key: &KeyTuple) -> TableResult<()> {
        (**self).delete(key)
    }
}

/// A request observed by [`MockResource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceCall {
    /// `list()`.
    List,
    /// `create(record)`.
    Create(Record),
    /// `update(key, record)`.
    Update(KeyTuple, Record),
    /// `delete(key)`.
    Delete(KeyTuple),
}

/// A scripted resource client for testing.
///
/// Each operation returns the response last set for it, every call is
/// recorded.
#[derive(Debug, Default)]
pub struct MockResource {
    list_response: Mutex<Option<TableResult<Vec<Record>>>>,
    create_response: Mutex<Option<TableResult<Record>>>,
    update_response: Mutex<Option<TableResult<Record>>>,
    delete_response: Mutex<Option<TableResult<()>>>,
    calls: Mutex<Vec<ResourceCall>>,
}

impl MockResource {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the list response.
    pub fn set_list_response(&self, response: TableResult<Vec<Record>>) {
        *self.list_response.lock() = Some(response);
    }

    /// Sets the create response.
    pub fn set_create_response(&self, response: TableResult<Record>) {
        *self.create_response.lock() = Some(response);
    }

    /// Sets the update response.
    pub fn set_update_response(&self, response: TableResult<Record>) {
        *self.update_response.lock() = Some(response);
    }

    /// Sets the delete response.
    pub fn set_delete_response(&self, response: TableResult<()>) {
        *self.delete_response.lock() = Some(response);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ResourceCall> {
        self.calls.lock().clone()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn scripted<T: Clone>(slot: &Mutex<Option<TableResult<T>>>, op: &str) -> TableResult<T> {
        slot.lock()
            .clone()
            .unwrap_or_else(|| Err(TableError::Protocol(format!("no mock {op} response set"))))
    }
}

impl ResourceClient for MockResource {
    fn list(&self) -> TableResult<Vec<Record>> {
        self.calls.lock().push(ResourceCall::List);
        Self::scripted(&self.list_response, "list")
    }

    fn create(&self, record: &Record) -> TableResult<Record> {
        self.calls.lock().push(ResourceCall::Create(record.clone()));
        Self::scripted(&self.create_response, "create")
    }

    fn update(&self, key: &KeyTuple, record: &Record) -> TableResult<Record> {
        self.calls
            .lock()
            .push(ResourceCall::Update(key.clone(), record.clone()));
        Self::scripted(&self.update_response, "update")
    }

    fn delete(&self, key: &KeyTuple) -> TableResult<()> {
        self.calls.lock().push(ResourceCall::Delete(key.clone()));
        Self::scripted(&self.delete_response, "delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_without_response_fails() {
        let mock = MockResource::new();
        assert!(matches!(mock.list(), Err(TableError::Protocol(_))));
        assert_eq!(mock.calls(), vec![ResourceCall::List]);
    }

    #[test]
    fn mock_replays_response() {
        let mock = MockResource::new();
        let italy = Record::new().with("cname", "Italy");
        mock.set_create_response(Ok(italy.clone()));

        assert_eq!(mock.create(&italy).unwrap(), italy);
        assert_eq!(mock.create(&italy).unwrap(), italy);
        assert_eq!(mock.calls().len(), 2);

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn mock_records_keys() {
        let mock = MockResource::new();
        mock.set_delete_response(Err(TableError::status(500)));

        let key = KeyTuple::new(vec!["Italy".into()]);
        assert!(mock.delete(&key).is_err());
        assert_eq!(mock.calls(), vec![ResourceCall::Delete(key)]);
    }
}
