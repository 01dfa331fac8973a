//! Transport contracts and channel naming.

pub mod channels;
pub mod service;
