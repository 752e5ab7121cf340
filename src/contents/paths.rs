//! API path helpers. Paths are `/`-separated, relative to the root `""`.

/// Suffix that marks a path as a notebook.
pub const NOTEBOOK_SUFFIX: &str = ".ipynb";

/// Strip leading and trailing separators.
pub fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Containing directory of `path`; `None` for the root.
pub fn parent_of(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(idx) => Some(path[..idx].to_string()),
        None => Some(String::new()),
    }
}

/// Case-insensitive ordering key used by directory listings.
pub fn sort_key(path: &str) -> String {
    path.to_lowercase()
}

/// Whether `path` names a notebook by suffix
pub fn is_notebook_path(path: &str) -> bool {
    path.ends_with(NOTEBOOK_SUFFIX)
}
