//! Structured storage service contract.

use std::{future::Future, pin::Pin};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HostResult;

/// Opaque structured value with a known identifying key field.
pub type Record = Value;

/// Object-safe boxed future used by [`StorageService`] async methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Uniform create/read/update/delete surface over a structured store.
///
/// Statements are textual descriptors paired with positional parameters. Whether they are
/// executed as SQL or only inspected is up to the strategy.
pub trait StorageService {
    /// Prepares the backing store. Calling it again is a no-op.
    fn initialize<'a>(&'a self) -> StorageFuture<'a, HostResult<()>>;

    /// Returns every record matching the statement.
    fn query<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Vec<Record>>>;

    /// Applies a mutating statement (insert, update, or delete).
    fn execute<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<()>>;

    /// Returns the first matching record, or `None` when nothing matches.
    fn get<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Option<Record>>>;

    /// Releases the backing store. Later operations fail until re-initialized.
    fn close<'a>(&'a self) -> StorageFuture<'a, HostResult<()>>;
}

/// Runs a query through a [`StorageService`] and deserializes every record.
///
/// # Errors
///
/// Returns an error when the query or record deserialization fails.
pub async fn query_as<S: StorageService + ?Sized, T: DeserializeOwned>(
    store: &S,
    statement: &str,
    params: &[Value],
) -> HostResult<Vec<T>> {
    let records = store.query(statement, params).await?;
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(Into::into))
        .collect()
}

/// Fetches at most one record through a [`StorageService`] and deserializes it.
///
/// # Errors
///
/// Returns an error when the lookup or record deserialization fails.
pub async fn get_as<S: StorageService + ?Sized, T: DeserializeOwned>(
    store: &S,
    statement: &str,
    params: &[Value],
) -> HostResult<Option<T>> {
    let Some(record) = store.get(statement, params).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_value(record)?))
}
