//! Render command - Render a markdown document with resource widgets

use crate::context::AppContext;
use crate::terminal;
use ag3ntum_core::markdown::{self, RenderOptions};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

pub struct RenderArgs<'a> {
    pub file: &'a Path,
    pub html: bool,
    /// Fetch file and image widgets from the session workspace
    pub resolve: bool,
    /// Show text widgets up to their line ceiling instead of the preview
    pub expand: bool,
    pub session: Option<&'a str>,
}

pub async fn run(ctx: &AppContext, args: RenderArgs<'_>) -> Result<()> {
    let document = read_document(args.file).await?;
    let blocks = markdown::parse(&document);
    debug!("parsed {} blocks", blocks.len());

    let widgets = if args.resolve {
        let session_id = ctx.session_id(args.session)?;
        let env = ctx.render_env(&session_id);
        let mut widgets = markdown::resolve_widgets(&blocks, &env).await;
        if args.expand {
            widgets.expand_all();
        }
        Some(widgets)
    } else {
        None
    };

    if args.html {
        let options = RenderOptions::from(&ctx.config.render);
        println!("{}", markdown::render_blocks(&blocks, widgets.as_ref(), &options));
    } else {
        println!("{}", terminal::render_blocks(&blocks, widgets.as_ref()));
    }
    Ok(())
}

/// Read a document from a file, or stdin for `-`
async fn read_document(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut document = String::new();
        tokio::io::stdin()
            .read_to_string(&mut document)
            .await
            .context("Failed to read stdin")?;
        return Ok(document);
    }

    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))
}
