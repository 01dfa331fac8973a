//! Capability-scoped filesystem over file handles granted through browser pickers.
//!
//! Handles are remembered under the name the picker reports, so two picked files with the same
//! base name share one table slot and the later pick wins. Deleting files and creating or deleting
//! directories need a parent-directory handle this strategy never keeps, so those operations
//! always fail.

use std::{cell::RefCell, collections::HashMap, fmt, future::Future, pin::Pin, rc::Rc};

use platform_host::{FileReference, FileSystemService, FsFuture, HostError, HostResult};
use tracing::debug;

/// Object-safe boxed future used by picker and handle traits.
pub type HandleFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Outcome of a picker interaction that produced no handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    /// The user dismissed the picker.
    Cancelled,
    /// The picker itself failed, for example because permission was denied.
    Failed(String),
}

/// Readable and writable file granted by the user.
pub trait FileAccessHandle {
    /// Name reported by the picker.
    fn name(&self) -> &str;

    /// Reads the whole file as text.
    fn read_text<'a>(&'a self) -> HandleFuture<'a, HostResult<String>>;

    /// Replaces the file content.
    fn write_text<'a>(&'a self, content: &'a str) -> HandleFuture<'a, HostResult<()>>;
}

/// Listable directory granted by the user.
pub trait DirectoryAccessHandle {
    /// Name reported by the picker.
    fn name(&self) -> &str;

    /// Names of the directory's direct entries.
    fn entry_names<'a>(&'a self) -> HandleFuture<'a, HostResult<Vec<String>>>;
}

/// Browser picker surface that grants handles.
pub trait FileAccessPicker {
    /// Lets the user choose one existing file.
    fn pick_file<'a>(&'a self) -> HandleFuture<'a, Result<Rc<dyn FileAccessHandle>, PickerError>>;

    /// Lets the user choose a directory.
    fn pick_directory<'a>(
        &'a self,
    ) -> HandleFuture<'a, Result<Rc<dyn DirectoryAccessHandle>, PickerError>>;

    /// Lets the user choose a save destination.
    fn pick_save_file<'a>(
        &'a self,
        suggested_name: Option<&'a str>,
    ) -> HandleFuture<'a, Result<Rc<dyn FileAccessHandle>, PickerError>>;
}

/// Filesystem strategy over picker-granted handles.
pub struct ScopedFileSystem {
    picker: Rc<dyn FileAccessPicker>,
    files: RefCell<HashMap<String, Rc<dyn FileAccessHandle>>>,
    directories: RefCell<HashMap<String, Rc<dyn DirectoryAccessHandle>>>,
}

impl ScopedFileSystem {
    /// Creates a strategy with empty handle tables.
    pub fn new(picker: Rc<dyn FileAccessPicker>) -> Self {
        Self {
            picker,
            files: RefCell::new(HashMap::new()),
            directories: RefCell::new(HashMap::new()),
        }
    }

    fn file_handle(&self, path: &str) -> HostResult<Rc<dyn FileAccessHandle>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::not_found(format!("File not found: {path}")))
    }

    fn remember_file(&self, handle: Rc<dyn FileAccessHandle>) -> FileReference {
        let name = handle.name().to_string();
        self.files.borrow_mut().insert(name.clone(), handle);
        FileReference::new(name.clone(), name)
    }
}

/// Maps a picker outcome to the filesystem contract: cancellation is `None`, failure is an error.
fn picker_outcome<T>(outcome: Result<T, PickerError>, picker: &str) -> HostResult<Option<T>> {
    match outcome {
        Ok(handle) => Ok(Some(handle)),
        Err(PickerError::Cancelled) => {
            debug!(picker, "picker dismissed by user");
            Ok(None)
        }
        Err(PickerError::Failed(message)) => Err(HostError::backend(format!(
            "{picker} picker failed: {message}"
        ))),
    }
}

impl FileSystemService for ScopedFileSystem {
    fn read_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<String>> {
        Box::pin(async move {
            let handle = self.file_handle(path)?;
            handle.read_text().await
        })
    }

    fn write_file<'a>(&'a self, path: &'a str, content: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            let handle = self.file_handle(path)?;
            handle.write_text(content).await
        })
    }

    fn delete_file<'a>(&'a self, _path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            Err(HostError::unsupported(
                "Delete not supported for picker-granted files",
            ))
        })
    }

    fn exists<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<bool>> {
        Box::pin(async move {
            Ok(self.files.borrow().contains_key(path)
                || self.directories.borrow().contains_key(path))
        })
    }

    fn read_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<Vec<String>>> {
        Box::pin(async move {
            let handle = self
                .directories
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| HostError::not_found(format!("Directory not found: {path}")))?;
            handle.entry_names().await
        })
    }

    fn create_dir<'a>(&'a self, _path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            Err(HostError::unsupported(
                "Create directory not supported for picker-granted directories",
            ))
        })
    }

    fn delete_dir<'a>(&'a self, _path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            Err(HostError::unsupported(
                "Delete directory not supported for picker-granted directories",
            ))
        })
    }

    fn open_file_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            let picked = picker_outcome(self.picker.pick_file().await, "open file")?;
            Ok(picked.map(|handle| self.remember_file(handle)))
        })
    }

    fn open_directory_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            let picked = picker_outcome(self.picker.pick_directory().await, "open directory")?;
            Ok(picked.map(|handle| {
                let name = handle.name().to_string();
                self.directories.borrow_mut().insert(name.clone(), handle);
                FileReference::new(name.clone(), name)
            }))
        })
    }

    fn save_file_picker<'a>(
        &'a self,
        default_name: Option<&'a str>,
    ) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            let picked = picker_outcome(self.picker.pick_save_file(default_name).await, "save file")?;
            Ok(picked.map(|handle| self.remember_file(handle)))
        })
    }
}

impl fmt::Debug for ScopedFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut files: Vec<String> = self.files.borrow().keys().cloned().collect();
        files.sort();
        let mut directories: Vec<String> = self.directories.borrow().keys().cloned().collect();
        directories.sort();
        f.debug_struct("ScopedFileSystem")
            .field("files", &files)
            .field("directories", &directories)
            .finish()
    }
}
