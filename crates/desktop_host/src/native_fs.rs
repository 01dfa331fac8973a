//! Native filesystem rooted at a canonical directory, behind the desktop `fs:*` channels.
//!
//! Callers address entries with virtual absolute paths (`/notes/readme.txt`). Paths are
//! normalized first, so `..` can never climb above the root, and every resolved entry is
//! canonicalized again so symlinks cannot lead outside it either.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use platform_host::{normalize_virtual_path, HostError, HostResult};

fn io_error(err: io::Error, normalized: &str, action: &str) -> HostError {
    if err.kind() == io::ErrorKind::NotFound {
        HostError::not_found(format!("File not found: {normalized}"))
    } else {
        HostError::backend(format!("failed to {action} {normalized}: {err}"))
    }
}

fn resolve_virtual_path(root: &Path, path: &str) -> (String, PathBuf) {
    let normalized = normalize_virtual_path(path);
    if normalized == "/" {
        return (normalized, root.to_path_buf());
    }

    let mut native = root.to_path_buf();
    for segment in normalized.trim_start_matches('/').split('/') {
        if !segment.is_empty() {
            native.push(segment);
        }
    }
    (normalized, native)
}

fn ensure_existing_within_root(root: &Path, normalized: &str, native: &Path) -> HostResult<()> {
    let canonical =
        fs::canonicalize(native).map_err(|err| io_error(err, normalized, "resolve"))?;
    if canonical.starts_with(root) {
        Ok(())
    } else {
        Err(HostError::backend(format!(
            "path `{normalized}` resolves outside scoped root"
        )))
    }
}

fn ensure_parent_within_root(root: &Path, normalized: &str, native: &Path) -> HostResult<()> {
    let parent = native
        .parent()
        .ok_or_else(|| HostError::backend(format!("path `{normalized}` has no parent")))?;
    let canonical_parent = fs::canonicalize(parent).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            HostError::not_found(format!("Directory not found: {}", parent_of(normalized)))
        } else {
            HostError::backend(format!("failed to resolve parent of {normalized}: {err}"))
        }
    })?;
    if canonical_parent.starts_with(root) {
        Ok(())
    } else {
        Err(HostError::backend(format!(
            "path `{normalized}` parent resolves outside scoped root"
        )))
    }
}

/// Checks the deepest entry of `native` that already exists, so creating the missing rest
/// cannot follow a symlink out of the root.
fn ensure_nearest_ancestor_within_root(
    root: &Path,
    normalized: &str,
    native: &Path,
) -> HostResult<()> {
    let existing = native
        .ancestors()
        .find(|candidate| fs::symlink_metadata(candidate).is_ok())
        .unwrap_or(root);
    let canonical = fs::canonicalize(existing).map_err(|err| {
        HostError::backend(format!("failed to resolve ancestor of {normalized}: {err}"))
    })?;
    if canonical.starts_with(root) {
        Ok(())
    } else {
        Err(HostError::backend(format!(
            "path `{normalized}` resolves outside scoped root"
        )))
    }
}

fn parent_of(normalized: &str) -> &str {
    match normalized.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &normalized[..idx],
    }
}

#[derive(Debug, Clone)]
/// Filesystem service rooted at a canonical native directory.
pub struct ScopedNativeFs {
    root: PathBuf,
}

impl ScopedNativeFs {
    /// Creates a scoped filesystem rooted at `root`.
    ///
    /// The root directory is created if needed and canonicalized before use.
    pub fn from_root(root: impl AsRef<Path>) -> HostResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|err| {
            HostError::backend(format!("failed to create root {}: {err}", root.display()))
        })?;
        let root = fs::canonicalize(root).map_err(|err| {
            HostError::backend(format!(
                "failed to canonicalize {}: {err}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Canonical native root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Native location of a virtual path, without checking that it exists.
    pub fn native_path(&self, path: &str) -> PathBuf {
        resolve_virtual_path(&self.root, path).1
    }

    /// Reads a UTF-8 text file.
    pub fn read_file(&self, path: &str) -> HostResult<String> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        ensure_existing_within_root(&self.root, &normalized, &native)?;
        if native.is_dir() {
            return Err(HostError::backend(format!("path `{normalized}` is not a file")));
        }
        fs::read_to_string(&native).map_err(|err| io_error(err, &normalized, "read"))
    }

    /// Writes a UTF-8 text file. The parent directory must already exist.
    pub fn write_file(&self, path: &str, content: &str) -> HostResult<()> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        if normalized == "/" {
            return Err(HostError::unsupported("cannot write to filesystem root"));
        }
        ensure_parent_within_root(&self.root, &normalized, &native)?;
        if native.exists() {
            ensure_existing_within_root(&self.root, &normalized, &native)?;
        }
        fs::write(&native, content).map_err(|err| io_error(err, &normalized, "write"))
    }

    /// Deletes a file.
    pub fn delete_file(&self, path: &str) -> HostResult<()> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        ensure_existing_within_root(&self.root, &normalized, &native)?;
        if native.is_dir() {
            return Err(HostError::backend(format!("path `{normalized}` is not a file")));
        }
        fs::remove_file(&native).map_err(|err| io_error(err, &normalized, "remove file"))
    }

    /// Returns whether an entry exists inside the root.
    pub fn exists(&self, path: &str) -> bool {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        ensure_existing_within_root(&self.root, &normalized, &native).is_ok()
    }

    /// Lists a directory's entry names, directories first, each group sorted by name.
    pub fn read_dir(&self, path: &str) -> HostResult<Vec<String>> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        ensure_existing_within_root(&self.root, &normalized, &native)?;
        if !native.is_dir() {
            return Err(HostError::not_found(format!(
                "Directory not found: {normalized}"
            )));
        }

        let mut entries = Vec::new();
        let listing = fs::read_dir(&native).map_err(|err| io_error(err, &normalized, "list"))?;
        for entry in listing {
            let entry = entry.map_err(|err| io_error(err, &normalized, "list"))?;
            let is_dir = entry.path().is_dir();
            entries.push((!is_dir, entry.file_name().to_string_lossy().into_owned()));
        }
        entries.sort();
        Ok(entries.into_iter().map(|(_, name)| name).collect())
    }

    /// Creates a directory and any missing parents.
    pub fn create_dir(&self, path: &str) -> HostResult<()> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        if normalized == "/" {
            return Ok(());
        }
        ensure_nearest_ancestor_within_root(&self.root, &normalized, &native)?;
        fs::create_dir_all(&native).map_err(|err| io_error(err, &normalized, "create directory"))?;
        ensure_existing_within_root(&self.root, &normalized, &native)
    }

    /// Deletes a directory and everything below it.
    pub fn delete_dir(&self, path: &str) -> HostResult<()> {
        let (normalized, native) = resolve_virtual_path(&self.root, path);
        if normalized == "/" {
            return Err(HostError::unsupported("cannot delete filesystem root"));
        }
        ensure_existing_within_root(&self.root, &normalized, &native)?;
        if !native.is_dir() {
            return Err(HostError::not_found(format!(
                "Directory not found: {normalized}"
            )));
        }
        fs::remove_dir_all(&native).map_err(|err| io_error(err, &normalized, "remove directory"))
    }
}
