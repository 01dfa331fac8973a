//! Keyed object stores with named stores and secondary indexes.
//!
//! [`ObjectStoreBackend`] is the asynchronous surface the browser storage strategy runs on.
//! [`ObjectStoreDatabase`] models it in process: each store is keyed by one field of its
//! records, records come back in key order, and `add` refuses to overwrite.
//! [`MemoryObjectStore`] exposes that model as a backend for native builds and tests; browser
//! builds use IndexedDB instead.

use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap, fmt, future::Future, pin::Pin};

use platform_host::{CollectionSchema, HostError, HostResult, Record, StoreSchema};
use serde_json::Value;

/// Object-safe boxed future returned by [`ObjectStoreBackend`] operations.
pub type ObjectStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Asynchronous object-store database the browser storage strategy writes through.
///
/// Every operation runs in its own transaction.
pub trait ObjectStoreBackend {
    /// Opens the database, creating any store in `schema` that does not exist yet.
    fn open<'a>(&'a self, schema: &'a StoreSchema) -> ObjectStoreFuture<'a, HostResult<()>>;

    /// Releases the connection. Stored records are kept.
    fn close(&self);

    /// Every record of a store, in key order.
    fn get_all<'a>(&'a self, store: &'a str) -> ObjectStoreFuture<'a, HostResult<Vec<Record>>>;

    /// Inserts a new record; fails with `Insert failed: ...` when the key exists or is missing.
    fn add<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>>;

    /// Inserts or replaces a record.
    fn put<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>>;

    /// Removes the record stored under `key`.
    fn delete<'a>(
        &'a self,
        store: &'a str,
        key: &'a Value,
    ) -> ObjectStoreFuture<'a, HostResult<()>>;
}

/// Identifying key of a stored record.
///
/// Numbers sort before text, and integral and fractional numbers sort together by value,
/// matching object-store key ordering.
#[derive(Debug, Clone)]
pub enum RecordKey {
    /// Integral numeric key.
    Integer(i64),
    /// Finite, non-integral numeric key.
    Float(f64),
    /// String key.
    Text(String),
}

impl RecordKey {
    /// Converts a JSON value into a key. Only finite numbers and strings are valid keys.
    ///
    /// Integral numbers always become [`RecordKey::Integer`], so `1` and `1.0` are the same key.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Some(Self::Integer(integer)),
                None => number.as_f64().and_then(Self::from_f64),
            },
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    fn from_f64(number: f64) -> Option<Self> {
        if !number.is_finite() {
            return None;
        }
        if number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64 {
            Some(Self::Integer(number as i64))
        } else {
            Some(Self::Float(number))
        }
    }

    fn numeric(&self) -> Option<f64> {
        match self {
            Self::Integer(integer) => Some(*integer as f64),
            Self::Float(float) => Some(*float),
            Self::Text(_) => None,
        }
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Text(_), _) => Ordering::Greater,
            (_, Self::Text(_)) => Ordering::Less,
            _ => match (self.numeric(), other.numeric()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => Ordering::Equal,
            },
        }
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RecordKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RecordKey {}

#[derive(Debug, Clone)]
struct ObjectStore {
    schema: &'static CollectionSchema,
    records: BTreeMap<RecordKey, Record>,
}

impl ObjectStore {
    fn key_of(&self, record: &Record) -> Option<RecordKey> {
        record
            .get(self.schema.key_path)
            .and_then(RecordKey::from_value)
    }
}

/// Named, versioned collection of object stores.
#[derive(Debug, Clone)]
pub struct ObjectStoreDatabase {
    name: String,
    version: u32,
    stores: BTreeMap<&'static str, ObjectStore>,
}

impl ObjectStoreDatabase {
    /// Creates an empty database without any stores.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            stores: BTreeMap::new(),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Creates every store in `schema` that does not exist yet. Existing stores keep their data.
    pub fn ensure_schema(&mut self, schema: &StoreSchema) {
        for collection in schema.collections {
            self.stores
                .entry(collection.name)
                .or_insert_with(|| ObjectStore {
                    schema: collection,
                    records: BTreeMap::new(),
                });
        }
    }

    /// Names of the existing stores, sorted.
    pub fn store_names(&self) -> Vec<&'static str> {
        self.stores.keys().copied().collect()
    }

    fn store(&self, name: &str) -> HostResult<&ObjectStore> {
        self.stores.get(name).ok_or_else(|| missing_store(name))
    }

    fn store_mut(&mut self, name: &str) -> HostResult<&mut ObjectStore> {
        self.stores.get_mut(name).ok_or_else(|| missing_store(name))
    }

    /// Returns every record of a store in key order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the store does not exist.
    pub fn get_all(&self, store: &str) -> HostResult<Vec<Record>> {
        Ok(self.store(store)?.records.values().cloned().collect())
    }

    /// Returns the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the store does not exist.
    pub fn get(&self, store: &str, key: &Value) -> HostResult<Option<Record>> {
        let store = self.store(store)?;
        Ok(RecordKey::from_value(key).and_then(|key| store.records.get(&key).cloned()))
    }

    /// Returns every record whose indexed field equals `value`, in key order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the store or the index does not exist.
    pub fn get_all_by_index(
        &self,
        store: &str,
        index: &str,
        value: &Value,
    ) -> HostResult<Vec<Record>> {
        let object_store = self.store(store)?;
        let Some(index) = object_store
            .schema
            .indexes
            .iter()
            .find(|candidate| candidate.name == index)
        else {
            return Err(HostError::not_found(format!(
                "index `{index}` not found on `{store}`"
            )));
        };
        Ok(object_store
            .records
            .values()
            .filter(|record| record.get(index.key_path) == Some(value))
            .cloned()
            .collect())
    }

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Fails when the store is missing, the record has no valid key, or the key already exists.
    pub fn add(&mut self, store: &str, record: Record) -> HostResult<()> {
        let object_store = self.store_mut(store)?;
        let key = object_store.key_of(&record).ok_or_else(|| {
            HostError::backend(format!(
                "Insert failed: record has no valid `{}` key",
                object_store.schema.key_path
            ))
        })?;
        if object_store.records.contains_key(&key) {
            return Err(HostError::backend(format!(
                "Insert failed: key already exists in `{store}`"
            )));
        }
        object_store.records.insert(key, record);
        Ok(())
    }

    /// Inserts or replaces a record.
    ///
    /// # Errors
    ///
    /// Fails when the store is missing or the record has no valid key.
    pub fn put(&mut self, store: &str, record: Record) -> HostResult<()> {
        let object_store = self.store_mut(store)?;
        let key = object_store.key_of(&record).ok_or_else(|| {
            HostError::backend(format!(
                "Update failed: record has no valid `{}` key",
                object_store.schema.key_path
            ))
        })?;
        object_store.records.insert(key, record);
        Ok(())
    }

    /// Removes the record stored under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Fails when the store is missing or `key` is not a valid key.
    pub fn delete(&mut self, store: &str, key: &Value) -> HostResult<()> {
        let object_store = self.store_mut(store)?;
        let key = RecordKey::from_value(key)
            .ok_or_else(|| HostError::backend(format!("Delete failed: invalid key {key}")))?;
        object_store.records.remove(&key);
        Ok(())
    }
}

/// [`ObjectStoreBackend`] kept in process memory for the lifetime of the value.
pub struct MemoryObjectStore {
    database: RefCell<ObjectStoreDatabase>,
}

impl MemoryObjectStore {
    /// Creates an empty in-memory database.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            database: RefCell::new(ObjectStoreDatabase::new(name, version)),
        }
    }

    /// Snapshot of the underlying database.
    pub fn snapshot(&self) -> ObjectStoreDatabase {
        self.database.borrow().clone()
    }
}

impl fmt::Debug for MemoryObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let database = self.database.borrow();
        f.debug_struct("MemoryObjectStore")
            .field("name", &database.name())
            .field("stores", &database.store_names())
            .finish()
    }
}

impl ObjectStoreBackend for MemoryObjectStore {
    fn open<'a>(&'a self, schema: &'a StoreSchema) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.database.borrow_mut().ensure_schema(schema);
            Ok(())
        })
    }

    fn close(&self) {}

    fn get_all<'a>(&'a self, store: &'a str) -> ObjectStoreFuture<'a, HostResult<Vec<Record>>> {
        Box::pin(async move { self.database.borrow().get_all(store) })
    }

    fn add<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move { self.database.borrow_mut().add(store, record) })
    }

    fn put<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move { self.database.borrow_mut().put(store, record) })
    }

    fn delete<'a>(
        &'a self,
        store: &'a str,
        key: &'a Value,
    ) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move { self.database.borrow_mut().delete(store, key) })
    }
}

fn missing_store(name: &str) -> HostError {
    HostError::not_found(format!("object store `{name}` not found"))
}

#[cfg(test)]
mod tests {
    use platform_host::{HostErrorKind, DATABASE_NAME, DATABASE_VERSION, DEFAULT_SCHEMA};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn database() -> ObjectStoreDatabase {
        let mut db = ObjectStoreDatabase::new(DATABASE_NAME, DATABASE_VERSION);
        db.ensure_schema(&DEFAULT_SCHEMA);
        db
    }

    #[test]
    fn ensure_schema_is_idempotent_and_keeps_records() {
        let mut db = database();
        db.put("settings", json!({"key": "theme", "value": "dark"}))
            .expect("put");
        db.ensure_schema(&DEFAULT_SCHEMA);

        assert_eq!(db.store_names(), ["apps", "chats", "messages", "settings"]);
        assert_eq!(
            db.get("settings", &json!("theme")).expect("get"),
            Some(json!({"key": "theme", "value": "dark"}))
        );
        assert_eq!(db.name(), "host-db");
        assert_eq!(db.version(), 1);
    }

    #[test]
    fn records_come_back_in_key_order() {
        let mut db = database();
        for id in [3, 1, 2] {
            db.add("apps", json!({"id": id})).expect("add");
        }
        let ids: Vec<_> = db
            .get_all("apps")
            .expect("get_all")
            .into_iter()
            .map(|record| record["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn add_rejects_duplicates_and_missing_keys() {
        let mut db = database();
        db.add("apps", json!({"id": 1})).expect("add");

        let duplicate = db.add("apps", json!({"id": 1})).expect_err("duplicate");
        assert_eq!(duplicate.kind, HostErrorKind::Backend);
        assert!(duplicate.message.starts_with("Insert failed"));

        let keyless = db.add("apps", json!({"name": "x"})).expect_err("keyless");
        assert_eq!(keyless.kind, HostErrorKind::Backend);
    }

    #[test]
    fn put_upserts_and_delete_removes() {
        let mut db = database();
        db.put("apps", json!({"id": 1, "name": "a"})).expect("put");
        db.put("apps", json!({"id": 1, "name": "b"})).expect("put");
        assert_eq!(
            db.get_all("apps").expect("get_all"),
            vec![json!({"id": 1, "name": "b"})]
        );

        db.delete("apps", &json!(1)).expect("delete");
        db.delete("apps", &json!(1)).expect("delete absent key");
        assert!(db.get_all("apps").expect("get_all").is_empty());

        let err = db.delete("apps", &Value::Null).expect_err("null key");
        assert_eq!(err.kind, HostErrorKind::Backend);
    }

    #[test]
    fn index_lookup_filters_by_field() {
        let mut db = database();
        db.add("messages", json!({"id": 1, "chatId": 7})).expect("add");
        db.add("messages", json!({"id": 2, "chatId": 8})).expect("add");
        db.add("messages", json!({"id": 3, "chatId": 7})).expect("add");

        let ids: Vec<_> = db
            .get_all_by_index("messages", "chatId", &json!(7))
            .expect("index")
            .into_iter()
            .map(|record| record["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);

        let err = db
            .get_all_by_index("messages", "appId", &json!(7))
            .expect_err("unknown index");
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_store_is_not_found() {
        let db = database();
        let err = db.get_all("users").expect_err("missing store");
        assert!(err.is_not_found());
        assert_eq!(err.message, "object store `users` not found");
    }

    #[test]
    fn numeric_keys_sort_before_text_keys() {
        assert!(RecordKey::Integer(99) < RecordKey::Text("0".to_string()));
        assert!(RecordKey::Float(99.5) < RecordKey::Text("0".to_string()));
        assert_eq!(RecordKey::from_value(&json!(true)), None);
        assert_eq!(RecordKey::from_value(&Value::Null), None);
    }

    #[test]
    fn fractional_keys_interleave_with_integers() {
        assert_eq!(RecordKey::from_value(&json!(1.5)), Some(RecordKey::Float(1.5)));
        assert_eq!(RecordKey::from_value(&json!(2.0)), Some(RecordKey::Integer(2)));
        assert!(RecordKey::Integer(1) < RecordKey::Float(1.5));
        assert!(RecordKey::Float(1.5) < RecordKey::Integer(2));
        assert!(RecordKey::Float(-0.5) < RecordKey::Integer(0));

        let mut db = database();
        for id in [json!(2), json!(1.5), json!(1), json!("a")] {
            db.add("apps", json!({ "id": id })).expect("add");
        }
        let ids: Vec<_> = db
            .get_all("apps")
            .expect("get_all")
            .into_iter()
            .map(|record| record["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(1.5), json!(2), json!("a")]);

        let duplicate = db.add("apps", json!({"id": 2.0})).expect_err("same key as 2");
        assert!(duplicate.message.starts_with("Insert failed"));
        assert_eq!(
            db.get("apps", &json!(1.5)).expect("get"),
            Some(json!({"id": 1.5}))
        );
    }
}
