//! Concrete implementations of the [`platform_host`] service contracts.
//!
//! This crate holds every runtime strategy and the wiring that picks between them:
//!
//! - `storage`: desktop pass-through and the browser object-store strategy over IndexedDB
//! - `fs`: desktop pass-through, picker-scoped handles, and the simulated filesystem
//! - `transport`: desktop IPC and HTTP/WebSocket messaging
//! - `adapters`: strategy enums and [`build_host_services`]
//!
//! Runtime glue that differs between browser (`wasm32`) and native builds lives under
//! `bridge::interop`, including the browser file pickers and file-input element.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Runtime strategy selection and the adapter enums that erase concrete backends.
pub mod adapters;
mod bridge;
pub mod fs;
pub mod storage;
#[cfg(test)]
mod test_support;
pub mod transport;

pub use adapters::{
    build_host_services, filesystem_adapter, storage_adapter, transport_adapter,
    FileSystemAdapter, HostConfig, StorageAdapter, TransportAdapter, DEFAULT_SERVER_ORIGIN,
};
pub use bridge::{page_origin, snapshot_runtime, DesktopBridge, BRIDGE_UNAVAILABLE};
#[cfg(target_arch = "wasm32")]
pub use bridge::{BrowserFileAccessPicker, BrowserFileInput};
pub use fs::desktop::DesktopFileSystem;
pub use fs::scoped::{
    DirectoryAccessHandle, FileAccessHandle, FileAccessPicker, HandleFuture, PickerError,
    ScopedFileSystem,
};
pub use fs::virtual_fs::{FileInputSource, NoFileInput, SelectedFile, VirtualFileSystem};
pub use storage::browser::BrowserStorage;
pub use storage::desktop::DesktopStorage;
pub use storage::indexed_db::IndexedDbStore;
pub use storage::object_store::{
    MemoryObjectStore, ObjectStoreBackend, ObjectStoreDatabase, ObjectStoreFuture, RecordKey,
};
pub use transport::desktop::DesktopTransport;
pub use transport::web::WebTransport;
