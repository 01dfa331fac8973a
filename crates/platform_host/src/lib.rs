//! Typed host contracts shared by UI code, adapter strategies, and backing services.
//!
//! This crate is the API boundary for platform services. It exposes the platform detector,
//! the error taxonomy, and the storage, filesystem, and transport service traits. Concrete
//! strategies live in `platform_host_web`; the desktop backing service lives in `desktop_host`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod fs;
pub mod host;
pub mod platform;
pub mod storage;
pub mod transport;

pub use error::{HostError, HostErrorKind, HostResult};
pub use fs::path::{base_name, child_prefix, direct_child_name, normalize_virtual_path};
pub use fs::service::{FileSystemService, FsFuture};
pub use fs::types::{FileReference, DEFAULT_SAVE_NAME};
pub use host::HostServices;
pub use platform::{
    capabilities, is_desktop, is_installed_app, is_web, platform, CapabilityDescriptor,
    FilesystemMode, Platform, RuntimeSnapshot, StorageMode, DESKTOP_AGENT_SIGNATURES,
    HOST_USER_AGENT_ENV,
};
pub use storage::schema::{
    CollectionSchema, IndexSchema, StoreSchema, DATABASE_NAME, DATABASE_VERSION, DEFAULT_SCHEMA,
};
pub use storage::service::{get_as, query_as, Record, StorageFuture, StorageService};
pub use storage::statement::{collection_name, MutationKind};
pub use transport::channels;
pub use transport::service::{
    invoke_with, ChannelEvent, ChannelListener, IpcBridge, Subscription, TransportFuture,
    TransportService,
};
