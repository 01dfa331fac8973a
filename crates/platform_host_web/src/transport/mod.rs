//! Transport strategies.
//!
//! - [`desktop::DesktopTransport`] routes over the IPC channel injected by a desktop host.
//! - [`web::WebTransport`] posts JSON over HTTP and subscribes over WebSockets.

pub mod desktop;
pub mod web;
