//! Filesystem strategies.
//!
//! - [`desktop::DesktopFileSystem`] forwards to the desktop host's native filesystem.
//! - [`scoped::ScopedFileSystem`] works on file handles the user granted through pickers.
//! - [`virtual_fs::VirtualFileSystem`] keeps everything in memory.

pub mod desktop;
pub mod scoped;
pub mod virtual_fs;
