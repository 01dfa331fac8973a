//! Virtual-path helpers shared across filesystem strategies.

/// Normalizes a virtual filesystem path.
///
/// Trims whitespace, converts backslashes to `/`, resolves `.`/`..`, ensures a leading slash,
/// and returns `/` for empty or fully-collapsed paths.
pub fn normalize_virtual_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for segment in trimmed.replace('\\', "/").split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            if let Some(idx) = out.rfind('/') {
                out.truncate(idx);
            }
            continue;
        }
        out.push('/');
        out.push_str(segment);
    }

    if out.is_empty() {
        "/".to_string()
    } else {
        out
    }
}

/// Returns the last path segment, or `/` for the root.
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("/")
}

/// Returns the prefix every descendant of `dir` starts with (the path plus a trailing `/`).
pub fn child_prefix(dir: &str) -> String {
    if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

/// Returns the child name when `candidate` sits exactly one segment below `prefix`.
pub fn direct_child_name<'a>(prefix: &str, candidate: &'a str) -> Option<&'a str> {
    let relative = candidate.strip_prefix(prefix)?;
    if relative.is_empty() || relative.contains('/') {
        None
    } else {
        Some(relative)
    }
}
