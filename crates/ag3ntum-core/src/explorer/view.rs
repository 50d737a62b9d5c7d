//! Flattened view of the explorer tree

use super::ExplorerState;
use crate::paths::{file_name, is_descendant, normalize_workspace_path};
use crate::utils::format_size;
use ag3ntum_types::FileInfo;

/// One visible line of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: String,
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub depth: usize,
    pub expanded: bool,
    pub loading: bool,
    pub highlighted: bool,
}

/// Rows in display order: each expanded, loaded folder is followed by its
/// children one level deeper
pub fn visible_rows(state: &ExplorerState) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(state, &state.files, None, 0, &mut rows);
    rows
}

fn push_rows(
    state: &ExplorerState,
    files: &[FileInfo],
    parent: Option<&str>,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) {
    for file in files {
        let path = normalize_workspace_path(&file.path);
        // A listing that contains its own folder would recurse forever
        if let Some(parent) = parent {
            if !is_descendant(&path, parent) {
                continue;
            }
        }

        let expanded = file.is_directory && state.is_expanded(&path);
        let name = if file.name.is_empty() {
            file_name(&path).to_string()
        } else {
            file.name.clone()
        };
        rows.push(TreeRow {
            name,
            is_directory: file.is_directory,
            size: file.size,
            depth,
            expanded,
            loading: state.loading_folders.contains(&path),
            highlighted: state.highlighted.as_deref() == Some(path.as_str()),
            path: path.clone(),
        });

        if expanded {
            if let Some(children) = state.folder_contents.get(&path) {
                push_rows(state, children, Some(&path), depth + 1, rows);
            }
        }
    }
}

/// Plain-text tree for terminals
pub fn render_tree(state: &ExplorerState) -> String {
    visible_rows(state)
        .iter()
        .map(render_row)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_row(row: &TreeRow) -> String {
    let mark = if row.highlighted { "> " } else { "  " };
    let indent = "  ".repeat(row.depth);
    let (icon, name, suffix) = if row.is_directory {
        let icon = if row.expanded { "▾" } else { "▸" };
        let suffix = if row.loading { " (loading)".to_string() } else { String::new() };
        (icon, format!("{}/", row.name), suffix)
    } else {
        ("·", row.name.clone(), format!("  {}", format_size(row.size)))
    };
    format!("{}{}{} {}{}", mark, indent, icon, name, suffix)
}
