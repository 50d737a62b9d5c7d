//! Workspace file commands - ls, tree, cat, rm, upload, download, goto

use crate::context::AppContext;
use ag3ntum_core::explorer::render_tree;
use ag3ntum_core::paths::{file_name, is_root, normalize_workspace_path};
use ag3ntum_core::types::{FileInfo, SortField, SortOptions, UploadFile, UploadOutcome};
use ag3ntum_core::utils::{format_size, mime_for_path};
use ag3ntum_core::{FileService, FolderState};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

/// List one directory
pub async fn ls(
    ctx: &AppContext,
    session: Option<&str>,
    path: &str,
    sort: Option<SortField>,
    reverse: bool,
) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let field = sort.unwrap_or(SortField::Name);
    let order = if reverse {
        field.default_order().toggled()
    } else {
        field.default_order()
    };
    let explorer = ctx.explorer(&session_id).with_sort(SortOptions {
        sort_by: field,
        sort_order: order,
    });
    let path = normalize_workspace_path(path);

    let files = if is_root(&path) {
        explorer.load_root().await?;
        explorer.snapshot().await.files
    } else {
        explorer.expand(&path).await?;
        match explorer.folder_state(&path).await {
            FolderState::Loaded(files) => files,
            _ => anyhow::bail!("Directory {} did not load", path),
        }
    };

    print_listing(&files);
    let snapshot = explorer.snapshot().await;
    if is_root(&path) && snapshot.truncated {
        println!(
            "{}",
            format!("… showing {} of {} entries", files.len(), snapshot.total_count).yellow()
        );
    }
    Ok(())
}

/// Print the tree with a folder (and its ancestors) expanded
pub async fn tree(ctx: &AppContext, session: Option<&str>, path: &str) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let explorer = ctx.explorer(&session_id);
    let path = normalize_workspace_path(path);

    explorer.load_root().await?;
    if !is_root(&path) {
        for dir in ag3ntum_core::paths::ancestor_dirs(&path) {
            explorer.expand(&dir).await?;
        }
        explorer.expand(&path).await?;
    }

    println!("{}", render_tree(&explorer.snapshot().await));
    Ok(())
}

/// Reveal a path in the tree, the way a tool result link does
pub async fn goto(ctx: &AppContext, session: Option<&str>, target: &str) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let explorer = ctx.explorer(&session_id);

    explorer.load_root().await?;
    let path = explorer.navigate_to(target).await?;
    info!("navigated to {}", path);

    println!("{}", render_tree(&explorer.snapshot().await));
    Ok(())
}

pub async fn cat(ctx: &AppContext, session: Option<&str>, path: &str) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let path = normalize_workspace_path(path);
    let content = ctx.client.get_content(&session_id, &path).await?;

    if let Some(error) = content.error {
        anyhow::bail!("{}: {}", path, error);
    }
    if content.is_binary {
        println!(
            "{}",
            format!(
                "{} is binary ({}); use `ag3ntum download` instead",
                path,
                format_size(content.size)
            )
            .yellow()
        );
        return Ok(());
    }

    print!("{}", content.content.unwrap_or_default());
    if content.is_truncated {
        eprintln!("{}", "\n… file truncated by server".yellow());
    }
    Ok(())
}

pub async fn rm(ctx: &AppContext, session: Option<&str>, path: &str, yes: bool) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let path = normalize_workspace_path(path);

    if !yes {
        let confirm: bool = dialoguer::Confirm::new()
            .with_prompt(format!("Delete '{}'?", path))
            .default(false)
            .interact()?;

        if !confirm {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    ctx.explorer(&session_id).delete(&path).await?;
    println!("{}", format!("✅ Deleted {}", path).green());
    Ok(())
}

pub async fn upload(ctx: &AppContext, session: Option<&str>, files: &[PathBuf], dir: &str) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let explorer = ctx.explorer(&session_id);

    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("Not a file: {:?}", path))?;
        uploads.push(UploadFile {
            mime_type: mime_for_path(&name).map(str::to_string),
            name,
            bytes,
        });
    }

    let response = explorer.upload(dir, uploads).await?;
    for file in &response.uploaded {
        println!("  {} {} {}", "✓".green(), file.path, format_size(file.size).dimmed());
    }
    for error in &response.errors {
        println!("  {} {}: {}", "✗".red(), error.filename, error.error.red());
    }

    match response.outcome() {
        UploadOutcome::Complete => {
            println!("{}", format!("✅ Uploaded {} file(s)", response.uploaded.len()).green());
            Ok(())
        }
        UploadOutcome::Partial => {
            println!(
                "{}",
                format!(
                    "⚠️  Uploaded {} of {} file(s)",
                    response.uploaded.len(),
                    response.total_count
                )
                .yellow()
            );
            Ok(())
        }
        UploadOutcome::Failed => anyhow::bail!("No files were uploaded"),
    }
}

pub async fn download(
    ctx: &AppContext,
    session: Option<&str>,
    path: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let path = normalize_workspace_path(path);
    if is_root(&path) {
        anyhow::bail!("Cannot download the workspace root");
    }

    let bytes = ctx.client.fetch_bytes(&session_id, &path).await?;
    let output = output.unwrap_or_else(|| PathBuf::from(file_name(&path)));
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!(
        "{} {} → {} ({})",
        "✓".green(),
        path,
        output.display(),
        format_size(bytes.len() as u64)
    );
    Ok(())
}

pub fn print_listing(files: &[FileInfo]) {
    if files.is_empty() {
        println!("{}", "(empty)".dimmed());
        return;
    }

    for file in files {
        let modified = file
            .modified_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let name = if file.is_directory {
            format!("{}/", file.name).blue().bold().to_string()
        } else if file.is_hidden {
            file.name.dimmed().to_string()
        } else {
            file.name.clone()
        };
        let size = if file.is_directory {
            String::new()
        } else {
            format_size(file.size)
        };
        println!("{:>10}  {:16}  {}", size, modified.dimmed(), name);
    }
}
