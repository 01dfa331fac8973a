//! Desktop backing service for the `platform_host` IPC contract.
//!
//! [`DesktopBackingService`] is the in-process end of the desktop IPC channel. It implements
//! [`IpcBridge`] so the desktop strategies in `platform_host_web` can be pointed straight at it:
//!
//! - `db:*` requests run against [`sqlite::SqliteDatabase`]
//! - `fs:*` requests run against [`native_fs::ScopedNativeFs`]
//! - `dialog:*` requests go to a [`dialogs::DialogProvider`]; the default
//!   [`dialogs::HeadlessDialogs`] dismisses every dialog, so embedders with a window supply
//!   their own through [`DesktopBackingService::with_dialogs`]
//!
//! Host-initiated events reach subscribers through [`DesktopBackingService::emit`].

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod dialogs;
pub mod migrations;
pub mod native_fs;
pub mod sqlite;

use std::{
    cell::RefCell,
    fmt,
    path::Path,
    rc::{Rc, Weak},
};

use platform_host::{
    channels::{
        DB_CLOSE, DB_EXECUTE, DB_GET, DB_INITIALIZE, DB_QUERY, DIALOG_OPEN_DIRECTORY,
        DIALOG_OPEN_FILE, DIALOG_SAVE_FILE, FS_CREATE_DIR, FS_DELETE_DIR, FS_DELETE_FILE,
        FS_EXISTS, FS_READ_DIR, FS_READ_FILE, FS_WRITE_FILE,
    },
    ChannelEvent, ChannelListener, HostError, HostResult, IpcBridge, Subscription,
    TransportFuture,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, error};

pub use dialogs::{DialogProvider, HeadlessDialogs};
pub use native_fs::ScopedNativeFs;
pub use sqlite::{DatabaseLocation, DbError, DbResult, SqliteDatabase};

/// Database file name inside a host data directory.
pub const DATABASE_FILE_NAME: &str = "host.db";
/// Filesystem root directory name inside a host data directory.
pub const FILES_DIR_NAME: &str = "files";

#[derive(Debug, Deserialize)]
struct StatementRequest {
    sql: String,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PathRequest {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WriteRequest {
    path: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveDialogRequest {
    #[serde(default)]
    default_name: Option<String>,
}

fn request<T: DeserializeOwned>(payload: Value) -> HostResult<T> {
    Ok(serde_json::from_value(payload)?)
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, String, ChannelListener)>,
}

/// In-process desktop host answering IPC requests and emitting events.
pub struct DesktopBackingService {
    database: RefCell<SqliteDatabase>,
    filesystem: ScopedNativeFs,
    dialogs: Box<dyn DialogProvider>,
    listeners: Rc<RefCell<ListenerRegistry>>,
}

impl DesktopBackingService {
    /// Creates a service over an explicit database and filesystem, with headless dialogs.
    ///
    /// Until [`DesktopBackingService::with_dialogs`] installs a windowed provider, every
    /// `dialog:*` request answers `null`.
    pub fn new(database: SqliteDatabase, filesystem: ScopedNativeFs) -> Self {
        Self {
            database: RefCell::new(database),
            filesystem,
            dialogs: Box::new(HeadlessDialogs),
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
        }
    }

    /// Creates a service storing its database and files under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when the filesystem root cannot be created.
    pub fn open(data_dir: impl AsRef<Path>) -> HostResult<Self> {
        let data_dir = data_dir.as_ref();
        let filesystem = ScopedNativeFs::from_root(data_dir.join(FILES_DIR_NAME))?;
        let database =
            SqliteDatabase::new(DatabaseLocation::File(data_dir.join(DATABASE_FILE_NAME)));
        Ok(Self::new(database, filesystem))
    }

    /// Replaces the dialog provider.
    pub fn with_dialogs(mut self, dialogs: impl DialogProvider + 'static) -> Self {
        self.dialogs = Box::new(dialogs);
        self
    }

    /// Scoped filesystem the `fs:*` channels operate on.
    pub fn filesystem(&self) -> &ScopedNativeFs {
        &self.filesystem
    }

    /// Answers one request synchronously.
    ///
    /// # Errors
    ///
    /// Returns the failure of the addressed subsystem, or an unsupported error for an
    /// unknown channel.
    pub fn dispatch(&self, channel: &str, payload: Value) -> HostResult<Value> {
        debug!(channel = %channel, "dispatching IPC request");
        match channel {
            DB_INITIALIZE => {
                self.database.borrow_mut().initialize()?;
                Ok(Value::Null)
            }
            DB_QUERY => {
                let StatementRequest { sql, params } = request(payload)?;
                Ok(Value::Array(self.database.borrow().query(&sql, &params)?))
            }
            DB_EXECUTE => {
                let StatementRequest { sql, params } = request(payload)?;
                let changes = self.database.borrow().execute(&sql, &params)?;
                Ok(json!({ "changes": changes }))
            }
            DB_GET => {
                let StatementRequest { sql, params } = request(payload)?;
                Ok(self
                    .database
                    .borrow()
                    .get(&sql, &params)?
                    .unwrap_or(Value::Null))
            }
            DB_CLOSE => {
                self.database.borrow_mut().close();
                Ok(Value::Null)
            }
            FS_READ_FILE => {
                let PathRequest { path } = request(payload)?;
                Ok(Value::String(self.filesystem.read_file(&path)?))
            }
            FS_WRITE_FILE => {
                let WriteRequest { path, content } = request(payload)?;
                self.filesystem.write_file(&path, &content)?;
                Ok(Value::Null)
            }
            FS_DELETE_FILE => {
                let PathRequest { path } = request(payload)?;
                self.filesystem.delete_file(&path)?;
                Ok(Value::Null)
            }
            FS_EXISTS => {
                let PathRequest { path } = request(payload)?;
                Ok(Value::Bool(self.filesystem.exists(&path)))
            }
            FS_READ_DIR => {
                let PathRequest { path } = request(payload)?;
                Ok(json!(self.filesystem.read_dir(&path)?))
            }
            FS_CREATE_DIR => {
                let PathRequest { path } = request(payload)?;
                self.filesystem.create_dir(&path)?;
                Ok(Value::Null)
            }
            FS_DELETE_DIR => {
                let PathRequest { path } = request(payload)?;
                self.filesystem.delete_dir(&path)?;
                Ok(Value::Null)
            }
            DIALOG_OPEN_FILE => Ok(serde_json::to_value(self.dialogs.open_file()?)?),
            DIALOG_OPEN_DIRECTORY => Ok(serde_json::to_value(self.dialogs.open_directory()?)?),
            DIALOG_SAVE_FILE => {
                let SaveDialogRequest { default_name } =
                    request::<Option<SaveDialogRequest>>(payload)?.unwrap_or_default();
                Ok(serde_json::to_value(
                    self.dialogs.save_file(default_name.as_deref())?,
                )?)
            }
            other => Err(HostError::unsupported(format!("Unknown IPC method: {other}"))),
        }
    }

    /// Delivers an event to every subscriber of `channel` and returns how many were reached.
    pub fn emit(&self, channel: &str, payload: Value) -> usize {
        let listeners: Vec<ChannelListener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .filter(|(_, subscribed, _)| subscribed == channel)
            .map(|(_, _, listener)| ChannelListener::clone(listener))
            .collect();
        for listener in &listeners {
            listener(ChannelEvent {
                channel: channel.to_string(),
                payload: payload.clone(),
            });
        }
        listeners.len()
    }

    /// Number of live subscriptions on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners
            .borrow()
            .entries
            .iter()
            .filter(|(_, subscribed, _)| subscribed == channel)
            .count()
    }
}

impl IpcBridge for DesktopBackingService {
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>> {
        Box::pin(async move { self.dispatch(channel, payload) })
    }

    fn send(&self, channel: &str, payload: Value) {
        if let Err(err) = self.dispatch(channel, payload) {
            error!(channel = %channel, error = %err, "IPC send failed");
        }
    }

    fn subscribe(&self, channel: &str, listener: ChannelListener) -> Subscription {
        let id = {
            let mut registry = self.listeners.borrow_mut();
            registry.next_id += 1;
            let id = registry.next_id;
            registry.entries.push((id, channel.to_string(), listener));
            id
        };

        let registry: Weak<RefCell<ListenerRegistry>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .borrow_mut()
                    .entries
                    .retain(|(existing, _, _)| *existing != id);
            }
        })
    }
}

impl fmt::Debug for DesktopBackingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopBackingService")
            .field("database_open", &self.database.borrow().is_open())
            .field("root", &self.filesystem.root())
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}
