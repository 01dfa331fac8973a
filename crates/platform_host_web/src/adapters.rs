use std::{fmt, rc::Rc};

use platform_host::{
    capabilities, CapabilityDescriptor, ChannelListener, FileReference, FileSystemService,
    FilesystemMode, FsFuture, HostResult, HostServices, IpcBridge, Platform, Record,
    RuntimeSnapshot, StorageFuture, StorageMode, StorageService, Subscription, TransportFuture,
    TransportService,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    bridge::{page_origin, snapshot_runtime, DesktopBridge},
    fs::{
        desktop::DesktopFileSystem,
        scoped::{FileAccessPicker, ScopedFileSystem},
        virtual_fs::{FileInputSource, NoFileInput, VirtualFileSystem},
    },
    storage::{browser::BrowserStorage, desktop::DesktopStorage},
    transport::{desktop::DesktopTransport, web::WebTransport},
};

/// Service origin used when the runtime has no page origin of its own.
pub const DEFAULT_SERVER_ORIGIN: &str = "http://localhost:8080";

/// Inputs for runtime strategy selection.
///
/// The runtime snapshot decides which strategies are chosen; the remaining fields are the
/// capabilities those strategies are built over.
#[derive(Clone)]
pub struct HostConfig {
    /// Runtime snapshot strategy selection is based on.
    pub runtime: RuntimeSnapshot,
    /// IPC channel injected by a desktop host, if any.
    pub desktop_bridge: DesktopBridge,
    /// Browser file-access picker, if the runtime exposes one.
    pub file_access_picker: Option<Rc<dyn FileAccessPicker>>,
    /// File-input source for the simulated filesystem's open picker.
    pub file_input: Rc<dyn FileInputSource>,
    /// Origin of the web backing service.
    pub server_origin: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeSnapshot::default(),
            desktop_bridge: DesktopBridge::absent(),
            file_access_picker: None,
            file_input: Rc::new(NoFileInput),
            server_origin: DEFAULT_SERVER_ORIGIN.to_string(),
        }
    }
}

impl HostConfig {
    /// Configuration for the current runtime: a fresh snapshot and the page origin if any.
    ///
    /// In a browser this also wires the native file pickers (when the picker API is present)
    /// and the hidden file-input element.
    pub fn detect() -> Self {
        Self {
            runtime: snapshot_runtime(),
            server_origin: page_origin().unwrap_or_else(|| DEFAULT_SERVER_ORIGIN.to_string()),
            ..Self::default()
        }
        .with_browser_file_access()
    }

    #[cfg(target_arch = "wasm32")]
    fn with_browser_file_access(mut self) -> Self {
        use crate::bridge::{BrowserFileAccessPicker, BrowserFileInput};

        if self.runtime.file_picker_api {
            self.file_access_picker = Some(Rc::new(BrowserFileAccessPicker));
        }
        self.with_file_input(Rc::new(BrowserFileInput))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn with_browser_file_access(self) -> Self {
        self
    }

    /// Injects the desktop IPC channel and marks the snapshot as bridged.
    pub fn with_desktop_bridge(mut self, bridge: Rc<dyn IpcBridge>) -> Self {
        self.desktop_bridge = DesktopBridge::new(bridge);
        self.runtime.desktop_bridge = true;
        self
    }

    /// Injects a file-access picker and marks the picker API as present.
    pub fn with_file_access_picker(mut self, picker: Rc<dyn FileAccessPicker>) -> Self {
        self.file_access_picker = Some(picker);
        self.runtime.file_picker_api = true;
        self
    }

    /// Sets the file-input source for the simulated filesystem.
    pub fn with_file_input(mut self, input: Rc<dyn FileInputSource>) -> Self {
        self.file_input = input;
        self
    }

    /// Sets the web backing service origin.
    pub fn with_server_origin(mut self, origin: impl Into<String>) -> Self {
        self.server_origin = origin.into();
        self
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("runtime", &self.runtime)
            .field("desktop_bridge", &self.desktop_bridge)
            .field("file_access_picker", &self.file_access_picker.is_some())
            .field("server_origin", &self.server_origin)
            .finish_non_exhaustive()
    }
}

/// Adapter enum that erases the concrete storage backend behind [`StorageService`].
#[derive(Debug)]
pub enum StorageAdapter {
    /// Relational engine of the desktop host.
    Desktop(DesktopStorage),
    /// In-process object store.
    Browser(BrowserStorage),
}

impl StorageAdapter {
    /// Returns a stable string token for the active strategy.
    pub const fn strategy_name(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "desktop",
            Self::Browser(_) => "browser",
        }
    }
}

impl StorageService for StorageAdapter {
    fn initialize<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(store) => store.initialize(),
            Self::Browser(store) => store.initialize(),
        }
    }

    fn query<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Vec<Record>>> {
        match self {
            Self::Desktop(store) => store.query(statement, params),
            Self::Browser(store) => store.query(statement, params),
        }
    }

    fn execute<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(store) => store.execute(statement, params),
            Self::Browser(store) => store.execute(statement, params),
        }
    }

    fn get<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Option<Record>>> {
        match self {
            Self::Desktop(store) => store.get(statement, params),
            Self::Browser(store) => store.get(statement, params),
        }
    }

    fn close<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(store) => store.close(),
            Self::Browser(store) => store.close(),
        }
    }
}

/// Adapter enum that erases the concrete filesystem backend behind [`FileSystemService`].
#[derive(Debug)]
pub enum FileSystemAdapter {
    /// Native filesystem of the desktop host.
    Desktop(DesktopFileSystem),
    /// Picker-granted browser file handles.
    Scoped(ScopedFileSystem),
    /// In-memory simulated filesystem.
    Virtual(VirtualFileSystem),
}

impl FileSystemAdapter {
    /// Returns a stable string token for the active strategy.
    pub const fn strategy_name(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "desktop",
            Self::Scoped(_) => "scoped",
            Self::Virtual(_) => "virtual",
        }
    }
}

impl FileSystemService for FileSystemAdapter {
    fn read_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<String>> {
        match self {
            Self::Desktop(fs) => fs.read_file(path),
            Self::Scoped(fs) => fs.read_file(path),
            Self::Virtual(fs) => fs.read_file(path),
        }
    }

    fn write_file<'a>(&'a self, path: &'a str, content: &'a str) -> FsFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(fs) => fs.write_file(path, content),
            Self::Scoped(fs) => fs.write_file(path, content),
            Self::Virtual(fs) => fs.write_file(path, content),
        }
    }

    fn delete_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(fs) => fs.delete_file(path),
            Self::Scoped(fs) => fs.delete_file(path),
            Self::Virtual(fs) => fs.delete_file(path),
        }
    }

    fn exists<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<bool>> {
        match self {
            Self::Desktop(fs) => fs.exists(path),
            Self::Scoped(fs) => fs.exists(path),
            Self::Virtual(fs) => fs.exists(path),
        }
    }

    fn read_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<Vec<String>>> {
        match self {
            Self::Desktop(fs) => fs.read_dir(path),
            Self::Scoped(fs) => fs.read_dir(path),
            Self::Virtual(fs) => fs.read_dir(path),
        }
    }

    fn create_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(fs) => fs.create_dir(path),
            Self::Scoped(fs) => fs.create_dir(path),
            Self::Virtual(fs) => fs.create_dir(path),
        }
    }

    fn delete_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        match self {
            Self::Desktop(fs) => fs.delete_dir(path),
            Self::Scoped(fs) => fs.delete_dir(path),
            Self::Virtual(fs) => fs.delete_dir(path),
        }
    }

    fn open_file_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        match self {
            Self::Desktop(fs) => fs.open_file_picker(),
            Self::Scoped(fs) => fs.open_file_picker(),
            Self::Virtual(fs) => fs.open_file_picker(),
        }
    }

    fn open_directory_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        match self {
            Self::Desktop(fs) => fs.open_directory_picker(),
            Self::Scoped(fs) => fs.open_directory_picker(),
            Self::Virtual(fs) => fs.open_directory_picker(),
        }
    }

    fn save_file_picker<'a>(
        &'a self,
        default_name: Option<&'a str>,
    ) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        match self {
            Self::Desktop(fs) => fs.save_file_picker(default_name),
            Self::Scoped(fs) => fs.save_file_picker(default_name),
            Self::Virtual(fs) => fs.save_file_picker(default_name),
        }
    }
}

/// Adapter enum that erases the concrete transport behind [`TransportService`].
#[derive(Debug, Clone)]
pub enum TransportAdapter {
    /// Desktop IPC channel.
    Desktop(DesktopTransport),
    /// HTTP requests and WebSocket subscriptions.
    Web(WebTransport),
}

impl TransportAdapter {
    /// Returns a stable string token for the active strategy.
    pub const fn strategy_name(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "desktop",
            Self::Web(_) => "web",
        }
    }
}

impl TransportService for TransportAdapter {
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>> {
        match self {
            Self::Desktop(transport) => transport.invoke(channel, payload),
            Self::Web(transport) => transport.invoke(channel, payload),
        }
    }

    fn send(&self, channel: &str, payload: Value) {
        match self {
            Self::Desktop(transport) => transport.send(channel, payload),
            Self::Web(transport) => transport.send(channel, payload),
        }
    }

    fn on(&self, channel: &str, listener: ChannelListener) -> Subscription {
        match self {
            Self::Desktop(transport) => transport.on(channel, listener),
            Self::Web(transport) => transport.on(channel, listener),
        }
    }
}

/// Returns the storage strategy for a capability report.
pub fn storage_adapter(config: &HostConfig, caps: &CapabilityDescriptor) -> StorageAdapter {
    match caps.storage {
        StorageMode::Relational => {
            StorageAdapter::Desktop(DesktopStorage::new(config.desktop_bridge.clone()))
        }
        StorageMode::ObjectStore => StorageAdapter::Browser(BrowserStorage::new()),
    }
}

/// Returns the filesystem strategy for a capability report.
///
/// A scoped filesystem needs an injected picker; without one the simulated filesystem is used.
pub fn filesystem_adapter(config: &HostConfig, caps: &CapabilityDescriptor) -> FileSystemAdapter {
    match (caps.filesystem, &config.file_access_picker) {
        (FilesystemMode::Native, _) => {
            FileSystemAdapter::Desktop(DesktopFileSystem::new(config.desktop_bridge.clone()))
        }
        (FilesystemMode::Scoped, Some(picker)) => {
            FileSystemAdapter::Scoped(ScopedFileSystem::new(Rc::clone(picker)))
        }
        (FilesystemMode::Scoped, None) => {
            warn!("file picker API reported without a picker; using virtual filesystem");
            FileSystemAdapter::Virtual(VirtualFileSystem::new(Rc::clone(&config.file_input)))
        }
        (FilesystemMode::Virtual, _) => {
            FileSystemAdapter::Virtual(VirtualFileSystem::new(Rc::clone(&config.file_input)))
        }
    }
}

/// Returns the transport strategy for a capability report.
pub fn transport_adapter(config: &HostConfig, caps: &CapabilityDescriptor) -> TransportAdapter {
    match caps.platform {
        Platform::Desktop => {
            TransportAdapter::Desktop(DesktopTransport::new(config.desktop_bridge.clone()))
        }
        Platform::Web => TransportAdapter::Web(WebTransport::new(config.server_origin.clone())),
    }
}

/// Selects every strategy once and bundles them for injection into application code.
pub fn build_host_services(config: &HostConfig) -> HostServices {
    let caps = capabilities(&config.runtime);
    let storage = storage_adapter(config, &caps);
    let filesystem = filesystem_adapter(config, &caps);
    let transport = transport_adapter(config, &caps);
    debug!(
        platform = caps.platform.as_str(),
        storage = storage.strategy_name(),
        filesystem = filesystem.strategy_name(),
        transport = transport.strategy_name(),
        "host services selected"
    );

    HostServices {
        storage: Rc::new(storage),
        filesystem: Rc::new(filesystem),
        transport: Rc::new(transport),
        capabilities: caps,
    }
}
