//! IndexedDB object-store backend for browser builds.
//!
//! Each store of the schema becomes an IndexedDB object store with an inline key path, and each
//! index a non-unique IndexedDB index. Stores are created in the version upgrade handler, so a
//! database opened at [`platform_host::DATABASE_VERSION`] always carries the full schema.

use platform_host::{HostResult, Record, StoreSchema};
use serde_json::{json, Value};
use tracing::debug;

use super::object_store::{ObjectStoreBackend, ObjectStoreFuture};
use crate::bridge::{idb_add, idb_close, idb_delete, idb_get_all, idb_open, idb_put};

/// Object-store backend over the browser's IndexedDB.
///
/// Outside a browser every operation fails as unsupported.
#[derive(Debug, Clone)]
pub struct IndexedDbStore {
    name: String,
    version: u32,
}

impl IndexedDbStore {
    /// Backend for the database `name` opened at `version`.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Store layout handed to the upgrade handler.
pub(crate) fn schema_descriptor(schema: &StoreSchema) -> Value {
    Value::Array(
        schema
            .collections
            .iter()
            .map(|collection| {
                json!({
                    "name": collection.name,
                    "keyPath": collection.key_path,
                    "indexes": collection
                        .indexes
                        .iter()
                        .map(|index| json!({ "name": index.name, "keyPath": index.key_path }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}

impl ObjectStoreBackend for IndexedDbStore {
    fn open<'a>(&'a self, schema: &'a StoreSchema) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move {
            idb_open(&self.name, self.version, &schema_descriptor(schema)).await?;
            debug!(database = %self.name, version = self.version, "IndexedDB opened");
            Ok(())
        })
    }

    fn close(&self) {
        idb_close(&self.name);
    }

    fn get_all<'a>(&'a self, store: &'a str) -> ObjectStoreFuture<'a, HostResult<Vec<Record>>> {
        Box::pin(idb_get_all(&self.name, store))
    }

    fn add<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move { idb_add(&self.name, store, &record).await })
    }

    fn put<'a>(&'a self, store: &'a str, record: Record) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(async move { idb_put(&self.name, store, &record).await })
    }

    fn delete<'a>(
        &'a self,
        store: &'a str,
        key: &'a Value,
    ) -> ObjectStoreFuture<'a, HostResult<()>> {
        Box::pin(idb_delete(&self.name, store, key))
    }
}

#[cfg(test)]
mod tests {
    use platform_host::DEFAULT_SCHEMA;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn descriptor_lists_every_store_with_its_indexes() {
        let descriptor = schema_descriptor(&DEFAULT_SCHEMA);
        let stores = descriptor.as_array().expect("array");
        assert_eq!(stores.len(), DEFAULT_SCHEMA.collections.len());

        for (store, collection) in stores.iter().zip(DEFAULT_SCHEMA.collections) {
            assert_eq!(store["name"], json!(collection.name));
            assert_eq!(store["keyPath"], json!(collection.key_path));
            assert_eq!(
                store["indexes"].as_array().map(Vec::len),
                Some(collection.indexes.len())
            );
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_builds_report_indexed_db_unsupported() {
        use futures::executor::block_on;
        use platform_host::{HostErrorKind, DATABASE_NAME, DATABASE_VERSION};

        let store = IndexedDbStore::new(DATABASE_NAME, DATABASE_VERSION);
        assert_eq!(store.name(), DATABASE_NAME);

        let err = block_on(store.open(&DEFAULT_SCHEMA)).expect_err("no IndexedDB");
        assert_eq!(err.kind, HostErrorKind::Unsupported);
        let err = block_on(store.get_all("apps")).expect_err("no IndexedDB");
        assert_eq!(err.kind, HostErrorKind::Unsupported);
        store.close();
    }
}
