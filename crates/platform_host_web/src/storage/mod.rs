//! Structured storage strategies.
//!
//! - [`desktop::DesktopStorage`] forwards statements to the desktop host's relational engine.
//! - [`browser::BrowserStorage`] interprets statements against an object-store backend:
//!   [`indexed_db::IndexedDbStore`] in browsers, [`object_store::MemoryObjectStore`] elsewhere.

pub mod browser;
pub mod desktop;
pub mod indexed_db;
pub mod object_store;
