//! Web storage strategy interpreting statements against an object-store database.
//!
//! Statements are never executed as SQL. The target collection is the identifier after the
//! first `from`, `into`, or `update` keyword, and [`MutationKind::classify`] decides what a
//! mutating statement does. Filtering clauses are ignored: a query returns the whole collection.
//!
//! Browser builds write through IndexedDB; native builds keep the database in memory.

use std::{cell::Cell, fmt, rc::Rc};

use platform_host::{
    collection_name, HostError, HostResult, MutationKind, Record, StorageFuture, StorageService,
    DATABASE_NAME, DATABASE_VERSION, DEFAULT_SCHEMA,
};
use serde_json::{json, Value};
use tracing::debug;

use super::object_store::ObjectStoreBackend;

/// Message returned when the store is closed or the statement names no collection.
pub const STORE_NOT_READY: &str = "Database not initialized or invalid query";

/// Message returned when a mutating statement matches none of the heuristics.
pub const UNSUPPORTED_OPERATION: &str = "Unsupported operation";

/// Object-store backed storage for browser runtimes.
///
/// Records survive [`StorageService::close`]; a later [`StorageService::initialize`] reopens the
/// same data.
pub struct BrowserStorage {
    backend: Rc<dyn ObjectStoreBackend>,
    open: Cell<bool>,
}

impl Default for BrowserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
fn default_backend() -> Rc<dyn ObjectStoreBackend> {
    Rc::new(super::indexed_db::IndexedDbStore::new(
        DATABASE_NAME,
        DATABASE_VERSION,
    ))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_backend() -> Rc<dyn ObjectStoreBackend> {
    Rc::new(super::object_store::MemoryObjectStore::new(
        DATABASE_NAME,
        DATABASE_VERSION,
    ))
}

impl BrowserStorage {
    /// Creates a closed store over the runtime's default object-store database.
    pub fn new() -> Self {
        Self::with_backend(default_backend())
    }

    /// Creates a closed store over an explicit object-store backend.
    pub fn with_backend(backend: Rc<dyn ObjectStoreBackend>) -> Self {
        Self {
            backend,
            open: Cell::new(false),
        }
    }

    /// Returns `true` between `initialize` and `close`.
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    fn target_store<'s>(&self, statement: &'s str) -> HostResult<&'s str> {
        match collection_name(statement) {
            Some(name) if self.open.get() => Ok(name),
            _ => Err(HostError::not_initialized(STORE_NOT_READY)),
        }
    }

    async fn read_all(&self, statement: &str) -> HostResult<Vec<Record>> {
        let store = self.target_store(statement)?;
        self.backend.get_all(store).await
    }

    async fn apply(&self, statement: &str, params: &[Value]) -> HostResult<()> {
        let store = self.target_store(statement)?;
        let Some(kind) = MutationKind::classify(statement) else {
            return Err(HostError::unsupported(UNSUPPORTED_OPERATION));
        };
        debug!(store, mutation = kind.as_str(), "applying object store mutation");

        match kind {
            MutationKind::Insert => self.backend.add(store, record_param(params)).await,
            MutationKind::Update => self.backend.put(store, record_param(params)).await,
            MutationKind::Delete => {
                let key = params.first().unwrap_or(&Value::Null);
                self.backend.delete(store, key).await
            }
        }
    }
}

impl fmt::Debug for BrowserStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserStorage")
            .field("open", &self.open.get())
            .finish_non_exhaustive()
    }
}

/// First positional parameter as the record to write, or an empty record.
fn record_param(params: &[Value]) -> Record {
    params
        .first()
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or_else(|| json!({}))
}

impl StorageService for BrowserStorage {
    fn initialize<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(async move {
            if !self.open.get() {
                self.backend.open(&DEFAULT_SCHEMA).await?;
                self.open.set(true);
                debug!(database = DATABASE_NAME, "object store opened");
            }
            Ok(())
        })
    }

    fn query<'a>(
        &'a self,
        statement: &'a str,
        _params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Vec<Record>>> {
        Box::pin(self.read_all(statement))
    }

    fn execute<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(self.apply(statement, params))
    }

    fn get<'a>(
        &'a self,
        statement: &'a str,
        _params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Option<Record>>> {
        Box::pin(async move { Ok(self.read_all(statement).await?.into_iter().next()) })
    }

    fn close<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(async move {
            if self.open.replace(false) {
                self.backend.close();
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::HostErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::object_store::MemoryObjectStore;

    fn opened() -> BrowserStorage {
        let storage = BrowserStorage::new();
        block_on(storage.initialize()).expect("initialize");
        storage
    }

    #[test]
    fn operations_before_initialize_fail_not_initialized() {
        let storage = BrowserStorage::new();
        let err = block_on(storage.query("SELECT * FROM apps", &[])).expect_err("closed");
        assert_eq!(err.kind, HostErrorKind::NotInitialized);
        assert_eq!(err.message, STORE_NOT_READY);
    }

    #[test]
    fn initialize_twice_is_a_no_op() {
        let storage = opened();
        block_on(storage.initialize()).expect("second initialize");
        assert!(storage.is_open());
    }

    #[test]
    fn insert_then_query_returns_whole_collection() {
        let storage = opened();
        block_on(storage.execute(
            "INSERT INTO apps (id, name) VALUES (?, ?)",
            &[json!({"id": 2, "name": "beta"})],
        ))
        .expect("insert");
        block_on(storage.execute(
            "insert into apps values (?)",
            &[json!({"id": 1, "name": "alpha"})],
        ))
        .expect("insert");

        let rows = block_on(storage.query("SELECT * FROM apps WHERE id = ?", &[json!(2)]))
            .expect("query");
        assert_eq!(
            rows,
            vec![
                json!({"id": 1, "name": "alpha"}),
                json!({"id": 2, "name": "beta"})
            ]
        );

        let first = block_on(storage.get("SELECT * FROM apps WHERE id = ?", &[json!(2)]))
            .expect("get");
        assert_eq!(first, Some(json!({"id": 1, "name": "alpha"})));
    }

    #[test]
    fn get_on_empty_collection_is_none() {
        let storage = opened();
        assert_eq!(
            block_on(storage.get("SELECT * FROM chats", &[])).expect("get"),
            None
        );
    }

    #[test]
    fn update_upserts_and_delete_removes_by_first_param() {
        let storage = opened();
        block_on(storage.execute(
            "UPDATE settings SET value = ? WHERE key = ?",
            &[json!({"key": "theme", "value": "dark"})],
        ))
        .expect("update");
        assert_eq!(
            block_on(storage.query("SELECT * FROM settings", &[])).expect("query"),
            vec![json!({"key": "theme", "value": "dark"})]
        );

        block_on(storage.execute("DELETE FROM settings WHERE key = ?", &[json!("theme")]))
            .expect("delete");
        assert!(block_on(storage.query("SELECT * FROM settings", &[]))
            .expect("query")
            .is_empty());
    }

    #[test]
    fn insert_keyword_anywhere_wins_over_update() {
        let storage = opened();
        block_on(storage.execute("INSERT INTO apps VALUES (?)", &[json!({"id": 1})]))
            .expect("insert");

        let err = block_on(storage.execute(
            "update apps set name = ? where note = 'insert'",
            &[json!({"id": 1, "name": "renamed"})],
        ))
        .expect_err("classified as insert, so duplicate key");
        assert_eq!(err.kind, HostErrorKind::Backend);
        assert!(err.message.starts_with("Insert failed"));
    }

    #[test]
    fn unclassified_mutation_is_unsupported() {
        let storage = opened();
        let err = block_on(storage.execute("SELECT * FROM apps", &[])).expect_err("select");
        assert_eq!(err.kind, HostErrorKind::Unsupported);
        assert_eq!(err.message, UNSUPPORTED_OPERATION);
    }

    #[test]
    fn statement_without_collection_fails_not_initialized() {
        let storage = opened();
        let err = block_on(storage.query("PRAGMA user_version", &[])).expect_err("no collection");
        assert_eq!(err.kind, HostErrorKind::NotInitialized);
    }

    #[test]
    fn unknown_collection_is_not_found() {
        let storage = opened();
        let err = block_on(storage.query("SELECT * FROM users", &[])).expect_err("unknown");
        assert!(err.is_not_found());
    }

    #[test]
    fn close_blocks_operations_but_keeps_records() {
        let storage = opened();
        block_on(storage.execute("INSERT INTO chats VALUES (?)", &[json!({"id": "c1"})]))
            .expect("insert");
        block_on(storage.close()).expect("close");

        let err = block_on(storage.query("SELECT * FROM chats", &[])).expect_err("closed");
        assert_eq!(err.kind, HostErrorKind::NotInitialized);

        block_on(storage.initialize()).expect("reopen");
        assert_eq!(
            block_on(storage.query("SELECT * FROM chats", &[])).expect("query"),
            vec![json!({"id": "c1"})]
        );
    }

    #[test]
    fn shared_backend_sees_writes_from_another_handle() {
        let backend = Rc::new(MemoryObjectStore::new(DATABASE_NAME, DATABASE_VERSION));
        let writer = BrowserStorage::with_backend(backend.clone());
        block_on(writer.initialize()).expect("initialize");
        block_on(writer.execute("INSERT INTO settings VALUES (?)", &[json!({"key": "k"})]))
            .expect("insert");

        let reader = BrowserStorage::with_backend(backend.clone());
        block_on(reader.initialize()).expect("initialize");
        assert_eq!(
            block_on(reader.query("SELECT * FROM settings", &[])).expect("query"),
            vec![json!({"key": "k"})]
        );
        assert_eq!(
            backend.snapshot().store_names().len(),
            DEFAULT_SCHEMA.collections.len()
        );
    }
}
