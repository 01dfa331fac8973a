//! Filesystem data types shared across host contracts and implementations.

use serde::{Deserialize, Serialize};

/// File or directory the user granted access to through a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Base name shown to the user.
    pub name: String,
    /// Path the adapter accepts for later operations on this entry.
    pub path: String,
}

impl FileReference {
    /// Creates a reference from a name and adapter path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Default name used by save pickers when the caller suggests none.
pub const DEFAULT_SAVE_NAME: &str = "file.txt";
