//! Native dialog seam behind the desktop `dialog:*` channels.
//!
//! This crate ships no windowed dialogs. [`HeadlessDialogs`] is the default provider and
//! dismisses every dialog, so `dialog:*` requests answer `null` until the embedding application
//! installs its own [`DialogProvider`] with
//! [`DesktopBackingService::with_dialogs`](crate::DesktopBackingService::with_dialogs).

use platform_host::{FileReference, HostResult};
use tracing::debug;

/// Native open and save dialogs.
///
/// Returned paths are virtual paths under the scoped filesystem root. `Ok(None)` means the user
/// dismissed the dialog.
pub trait DialogProvider {
    /// Asks the user for an existing file.
    fn open_file(&self) -> HostResult<Option<FileReference>>;

    /// Asks the user for a directory.
    fn open_directory(&self) -> HostResult<Option<FileReference>>;

    /// Asks the user for a save destination.
    fn save_file(&self, default_name: Option<&str>) -> HostResult<Option<FileReference>>;
}

/// Dialog provider for hosts without a windowing system. Every dialog is dismissed.
///
/// Open and save pickers therefore resolve to `None` on a default desktop service.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessDialogs;

impl DialogProvider for HeadlessDialogs {
    fn open_file(&self) -> HostResult<Option<FileReference>> {
        debug!(dialog = "open-file", "no dialog available; treating as dismissed");
        Ok(None)
    }

    fn open_directory(&self) -> HostResult<Option<FileReference>> {
        debug!(dialog = "open-directory", "no dialog available; treating as dismissed");
        Ok(None)
    }

    fn save_file(&self, default_name: Option<&str>) -> HostResult<Option<FileReference>> {
        debug!(
            dialog = "save-file",
            default_name = default_name.unwrap_or_default(),
            "no dialog available; treating as dismissed"
        );
        Ok(None)
    }
}
