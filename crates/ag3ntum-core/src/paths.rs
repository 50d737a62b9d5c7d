//! Workspace-relative path helpers
//!
//! Paths inside a session workspace are POSIX-style and relative to the
//! workspace root. The empty string denotes the root itself.

/// Path sent to the listing endpoint for the workspace root
pub const ROOT_LISTING_PATH: &str = ".";

const WORKSPACE_PREFIX: &str = "workspace/";

/// Normalize a path that may arrive in a foreign format.
///
/// Agents and tools refer to the same file as `./src/a.rs`, `/src/a.rs`,
/// `workspace/src/a.rs` or `/workspace/src/a.rs`; all of them become
/// `src/a.rs`. `.` segments and empty segments are dropped, `..` pops a
/// segment and never escapes the root.
pub fn normalize_workspace_path(raw: &str) -> String {
    let mut path = raw.trim().replace('\\', "/");

    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest.to_string();
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest.to_string();
        } else {
            break;
        }
    }

    if path == "workspace" {
        path.clear();
    } else if let Some(rest) = path.strip_prefix(WORKSPACE_PREFIX) {
        path = rest.to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == ROOT_LISTING_PATH
}

/// Path to hand to the listing endpoint
pub fn listing_path(path: &str) -> &str {
    if is_root(path) {
        ROOT_LISTING_PATH
    } else {
        path
    }
}

/// Parent directory of a path; the root's children have `""` as parent
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn join_path(dir: &str, name: &str) -> String {
    if is_root(dir) {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Ancestor directories of a path, outermost first, excluding the path itself
pub fn ancestor_dirs(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .map(|end| segments[..end].join("/"))
        .collect()
}

/// Whether `path` lies strictly below `dir`
pub fn is_descendant(path: &str, dir: &str) -> bool {
    if is_root(dir) {
        return !is_root(path);
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_foreign_formats() {
        assert_eq!(normalize_workspace_path("./src/main.rs"), "src/main.rs");
        assert_eq!(normalize_workspace_path("/src/main.rs"), "src/main.rs");
        assert_eq!(normalize_workspace_path("workspace/src/main.rs"), "src/main.rs");
        assert_eq!(normalize_workspace_path("/workspace/src/main.rs"), "src/main.rs");
        assert_eq!(normalize_workspace_path("./workspace/a//b/"), "a/b");
        assert_eq!(normalize_workspace_path("workspace"), "");
        assert_eq!(normalize_workspace_path("../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_workspace_path("a/./b/../c"), "a/c");
    }

    #[test]
    fn test_workspace_prefix_only_stripped_once() {
        assert_eq!(
            normalize_workspace_path("workspace/workspace/notes.md"),
            "workspace/notes.md"
        );
        assert_eq!(normalize_workspace_path("workspaces/a"), "workspaces/a");
    }

    #[test]
    fn test_ancestors_and_parents() {
        assert_eq!(ancestor_dirs("a/b/c.txt"), vec!["a", "a/b"]);
        assert!(ancestor_dirs("c.txt").is_empty());
        assert_eq!(parent_path("a/b/c.txt"), "a/b");
        assert_eq!(parent_path("c.txt"), "");
        assert_eq!(file_name("a/b/c.txt"), "c.txt");
        assert_eq!(join_path("", "x"), "x");
        assert_eq!(join_path("a/b/", "x"), "a/b/x");
        assert_eq!(listing_path(""), ".");
    }

    #[test]
    fn test_descendants() {
        assert!(is_descendant("a/b", "a"));
        assert!(!is_descendant("ab/c", "a"));
        assert!(!is_descendant("a", "a"));
        assert!(is_descendant("a", ""));
    }
}
