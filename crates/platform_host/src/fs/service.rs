//! Filesystem service contract.

use std::{future::Future, pin::Pin};

use super::types::FileReference;
use crate::error::HostResult;

/// Object-safe boxed future used by [`FileSystemService`] async methods.
pub type FsFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Uniform file and directory surface plus user-driven pickers.
///
/// Picker operations resolve to `Ok(None)` when the user dismisses the picker.
pub trait FileSystemService {
    /// Reads a text file.
    fn read_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<String>>;

    /// Writes a text file, replacing any previous content.
    fn write_file<'a>(&'a self, path: &'a str, content: &'a str) -> FsFuture<'a, HostResult<()>>;

    /// Deletes a file.
    fn delete_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>>;

    /// Returns whether a file or directory exists at `path`.
    fn exists<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<bool>>;

    /// Lists the names of a directory's direct children.
    fn read_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<Vec<String>>>;

    /// Creates a directory.
    fn create_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>>;

    /// Deletes a directory and the files below it.
    fn delete_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>>;

    /// Lets the user choose an existing file.
    fn open_file_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>>;

    /// Lets the user choose a directory.
    fn open_directory_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>>;

    /// Lets the user choose a save destination, optionally suggesting a name.
    fn save_file_picker<'a>(
        &'a self,
        default_name: Option<&'a str>,
    ) -> FsFuture<'a, HostResult<Option<FileReference>>>;
}
