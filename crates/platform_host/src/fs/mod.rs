//! Filesystem contracts, types, and path helpers.

pub mod path;
pub mod service;
pub mod types;
