//! Structured storage contracts, schema, and statement heuristics.

pub mod schema;
pub mod service;
pub mod statement;
