//! Path composition for groups.
//!
//! # Responsibilities
//! - Join a parent prefix and a child path into one absolute path
//! - Normalize slashes (one leading `/`, no duplicates, no trailing `/`)
//!
//! # Design Decisions
//! - Total function: every input string is accepted and normalized
//! - Empty segments are dropped everywhere, which makes composition associative

/// Compose `path` under `prefix`.
///
/// ```
/// use route_groups::routing::group_path;
///
/// assert_eq!(group_path("/api", "/v1"), "/api/v1");
/// assert_eq!(group_path("/api/", "v1/"), "/api/v1");
/// assert_eq!(group_path("/api", ""), "/api");
/// assert_eq!(group_path("", ""), "/");
/// ```
pub fn group_path(prefix: &str, path: &str) -> String {
    let mut composed = String::with_capacity(prefix.len() + path.len() + 1);
    for segment in prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
    {
        composed.push('/');
        composed.push_str(segment);
    }

    if composed.is_empty() {
        composed.push('/');
    }
    composed
}

/// Returns true if `path` lies at or below `prefix`, segment-wise.
///
/// `/api` covers `/api` and `/api/users`, but not `/apis`.
pub fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
