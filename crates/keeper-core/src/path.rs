//! Path resolution for nested route tables.
//!
//! A route's resolved path is its own `path` joined onto the resolved path
//! of its parent. Index routes and pathless routes take the parent's path.
//!
//! ```text
//! parent ""          + "dashboard"  -> /dashboard
//! parent "/dashboard" + "settings/" -> /dashboard/settings
//! parent "/dashboard" + index        -> /dashboard
//! parent ""          + index        -> /
//! ```

/// Resolve a route's own `path`/`index` against its parent's resolved path.
///
/// An empty `path` is treated like an absent one. Trailing slashes are
/// stripped, except that an empty result becomes `/`. Nothing else is
/// normalized: no case folding and no percent-decoding.
pub fn resolve_path(path: Option<&str>, index: bool, parent: &str) -> String {
    let joined = match path {
        _ if index => parent.to_string(),
        Some(path) if !path.is_empty() => join(parent, path),
        _ => parent.to_string(),
    };

    normalize(&joined)
}

fn join(parent: &str, path: &str) -> String {
    // The root parent contributes no segment of its own.
    let parent = if parent == "/" { "" } else { parent };

    if path.starts_with('/') {
        format!("{parent}{path}")
    } else {
        format!("{parent}/{path}")
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
