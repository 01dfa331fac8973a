//! Relational engine behind the desktop `db:*` channels.
//!
//! Statements run as real SQL. Positional JSON parameters are bound in order and result rows
//! come back as JSON objects keyed by column name.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use platform_host::HostError;
use rusqlite::{
    params_from_iter,
    types::{Value as SqlValue, ValueRef},
    Connection, Row,
};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::migrations::migrate;

/// Result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Failures raised by [`SqliteDatabase`].
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite rejected the operation.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// The database file was written by a newer schema.
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        /// Version stored in the file.
        db_version: u32,
        /// Newest version this binary knows.
        latest_supported: u32,
    },
    /// An operation ran before `initialize` or after `close`.
    #[error("Database not initialized")]
    NotInitialized,
}

impl From<DbError> for HostError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotInitialized => HostError::not_initialized(err.to_string()),
            other => HostError::backend(other.to_string()),
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk.
    File(PathBuf),
    /// Private in-memory database; contents are lost on close.
    InMemory,
}

impl DatabaseLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::InMemory => "memory",
        }
    }
}

/// Lazily opened SQLite connection with the collection schema applied.
#[derive(Debug)]
pub struct SqliteDatabase {
    location: DatabaseLocation,
    conn: Option<Connection>,
}

impl SqliteDatabase {
    /// Creates a closed database handle for `location`.
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            conn: None,
        }
    }

    /// Closed handle for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(DatabaseLocation::InMemory)
    }

    /// Returns `true` between `initialize` and `close`.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Opens the connection and applies pending migrations. A no-op when already open.
    pub fn initialize(&mut self) -> DbResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let started_at = Instant::now();
        let mode = self.location.mode();
        info!(mode, "opening database");
        match open_connection(&self.location) {
            Ok(conn) => {
                info!(
                    mode,
                    duration_ms = started_at.elapsed().as_millis() as u64,
                    "database opened"
                );
                self.conn = Some(conn);
                Ok(())
            }
            Err(err) => {
                error!(
                    mode,
                    duration_ms = started_at.elapsed().as_millis() as u64,
                    error = %err,
                    "database open failed"
                );
                Err(err)
            }
        }
    }

    /// Releases the connection.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            info!(mode = self.location.mode(), "database closed");
        }
    }

    /// Open connection, for inspection.
    pub fn connection(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::NotInitialized)
    }

    /// Runs a statement and returns every row.
    pub fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Value>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params_from_iter(bind_params(params)))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(row_to_json(row, &columns)?);
        }
        Ok(records)
    }

    /// Runs a statement and returns the first row, if any.
    pub fn get(&self, sql: &str, params: &[Value]) -> DbResult<Option<Value>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Runs a mutating statement and returns the number of changed rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let conn = self.connection()?;
        Ok(conn.execute(sql, params_from_iter(bind_params(params)))?)
    }
}

fn open_connection(location: &DatabaseLocation) -> DbResult<Connection> {
    let mut conn = match location {
        DatabaseLocation::File(path) => Connection::open(path)?,
        DatabaseLocation::InMemory => Connection::open_in_memory()?,
    };
    conn.busy_timeout(Duration::from_secs(5))?;
    migrate(&mut conn)?;
    Ok(conn)
}

/// Converts JSON parameters to SQLite values. Arrays and objects are bound as JSON text.
fn bind_params(params: &[Value]) -> Vec<SqlValue> {
    params
        .iter()
        .map(|value| match value {
            Value::Null => SqlValue::Null,
            Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => SqlValue::Integer(integer),
                None => SqlValue::Real(number.as_f64().unwrap_or_default()),
            },
            Value::String(text) => SqlValue::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
        })
        .collect()
}

fn row_to_json(row: &Row<'_>, columns: &[String]) -> DbResult<Value> {
    let mut record = Map::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(integer) => Value::from(integer),
            ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
            ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
        };
        record.insert(column.clone(), value);
    }
    Ok(Value::Object(record))
}
