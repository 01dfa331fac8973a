//! In-memory simulated filesystem used when no native or scoped filesystem is available.
//!
//! Files live in a path-keyed map and directories in a set that always holds `/`. Directory
//! markers are independent of file paths: writing `/a/b.txt` does not create `/a`, and deleting a
//! directory removes the files below it but leaves nested directory markers in place.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::Rc,
};

use platform_host::{
    base_name, child_prefix, direct_child_name, normalize_virtual_path, FileReference,
    FileSystemService, FsFuture, HostError, HostResult, DEFAULT_SAVE_NAME,
};
use tracing::debug;

/// File chosen through a plain file-input element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Base name of the chosen file.
    pub name: String,
    /// Text content of the chosen file.
    pub content: String,
}

/// Source of user-selected files for the open-file picker.
pub trait FileInputSource {
    /// Lets the user choose one file. `None` means nothing was chosen.
    fn choose_file<'a>(&'a self) -> FsFuture<'a, HostResult<Option<SelectedFile>>>;
}

/// Input source for runtimes without any file-input element.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFileInput;

impl FileInputSource for NoFileInput {
    fn choose_file<'a>(&'a self) -> FsFuture<'a, HostResult<Option<SelectedFile>>> {
        Box::pin(async { Ok(None) })
    }
}

/// Simulated filesystem kept entirely in memory.
pub struct VirtualFileSystem {
    files: RefCell<BTreeMap<String, String>>,
    dirs: RefCell<BTreeSet<String>>,
    input: Rc<dyn FileInputSource>,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new(Rc::new(NoFileInput))
    }
}

impl VirtualFileSystem {
    /// Creates an empty filesystem holding only the root directory.
    pub fn new(input: Rc<dyn FileInputSource>) -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            dirs: RefCell::new(BTreeSet::from(["/".to_string()])),
            input,
        }
    }

    fn occupied(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    /// Root-level path for a selected file, suffixing ` (n)` before the extension on collision.
    fn unique_root_path(&self, name: &str) -> String {
        let candidate = format!("/{name}");
        if !self.occupied(&candidate) {
            return candidate;
        }

        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
            _ => (name, None),
        };
        (1..)
            .map(|n| match extension {
                Some(extension) => format!("/{stem} ({n}).{extension}"),
                None => format!("/{stem} ({n})"),
            })
            .find(|path| !self.occupied(path))
            .unwrap_or(candidate)
    }

    fn list_children(&self, dir: &str) -> HostResult<Vec<String>> {
        if !self.dirs.borrow().contains(dir) {
            return Err(HostError::not_found(format!("Directory not found: {dir}")));
        }

        let prefix = child_prefix(dir);
        let files = self.files.borrow();
        let dirs = self.dirs.borrow();
        let file_names = files
            .keys()
            .filter_map(|path| direct_child_name(&prefix, path));
        let dir_names = dirs
            .iter()
            .filter(|path| path.as_str() != dir)
            .filter_map(|path| direct_child_name(&prefix, path));
        let names: Vec<String> = file_names.chain(dir_names).map(str::to_string).collect();
        Ok(names)
    }

    fn remove_dir(&self, dir: &str) -> HostResult<()> {
        if dir == "/" {
            return Err(HostError::unsupported("cannot delete root directory"));
        }
        if !self.dirs.borrow_mut().remove(dir) {
            return Err(HostError::not_found(format!("Directory not found: {dir}")));
        }

        let prefix = child_prefix(dir);
        self.files
            .borrow_mut()
            .retain(|path, _| !path.starts_with(&prefix));
        Ok(())
    }
}

impl FileSystemService for VirtualFileSystem {
    fn read_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<String>> {
        Box::pin(async move {
            let path = normalize_virtual_path(path);
            self.files
                .borrow()
                .get(&path)
                .cloned()
                .ok_or_else(|| HostError::not_found(format!("File not found: {path}")))
        })
    }

    fn write_file<'a>(&'a self, path: &'a str, content: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.files
                .borrow_mut()
                .insert(normalize_virtual_path(path), content.to_string());
            Ok(())
        })
    }

    fn delete_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            let path = normalize_virtual_path(path);
            match self.files.borrow_mut().remove(&path) {
                Some(_) => Ok(()),
                None => Err(HostError::not_found(format!("File not found: {path}"))),
            }
        })
    }

    fn exists<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<bool>> {
        Box::pin(async move { Ok(self.occupied(&normalize_virtual_path(path))) })
    }

    fn read_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<Vec<String>>> {
        Box::pin(async move { self.list_children(&normalize_virtual_path(path)) })
    }

    fn create_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.dirs.borrow_mut().insert(normalize_virtual_path(path));
            Ok(())
        })
    }

    fn delete_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move { self.remove_dir(&normalize_virtual_path(path)) })
    }

    fn open_file_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            let Some(selected) = self.input.choose_file().await? else {
                debug!("file input dismissed");
                return Ok(None);
            };

            let name = base_name(&normalize_virtual_path(&selected.name)).to_string();
            let path = self.unique_root_path(&name);
            self.files.borrow_mut().insert(path.clone(), selected.content);
            Ok(Some(FileReference::new(base_name(&path), path.clone())))
        })
    }

    fn open_directory_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            Err(HostError::unsupported(
                "Directory picker not supported in virtual file system",
            ))
        })
    }

    fn save_file_picker<'a>(
        &'a self,
        default_name: Option<&'a str>,
    ) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            let name = default_name
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_SAVE_NAME);
            Ok(Some(FileReference::new(name, format!("/{name}"))))
        })
    }
}

impl fmt::Debug for VirtualFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileSystem")
            .field("files", &self.files.borrow().len())
            .field("dirs", &*self.dirs.borrow())
            .finish()
    }
}
