//! Interactive file explorer shell
//!
//! Keeps one explorer alive for the whole session so expansions, sort and
//! highlights carry over between commands.

use crate::commands::{files, sessions};
use crate::context::AppContext;
use ag3ntum_core::explorer::render_tree;
use ag3ntum_core::types::SortField;
use ag3ntum_core::{FileExplorer, FileService};
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  ls                 Show the tree
  open <dir>         Expand a folder
  close <dir>        Collapse a folder
  toggle <dir>       Expand or collapse a folder
  sort <field>       Sort by name, size or modified_at (repeat to flip order)
  goto <path>        Reveal and highlight a path
  cat <file>         Print a file
  rm <path>          Delete a file or folder
  refresh            Reload the root and every expanded folder
  sessions           List sessions (cached)
  help               Show this help
  quit               Leave the shell";

enum Step {
    Continue,
    Quit,
}

pub async fn run(ctx: &AppContext, session: Option<&str>) -> Result<()> {
    let session_id = ctx.session_id(session)?;
    let explorer = ctx.explorer(&session_id);

    println!(
        "{}",
        format!("📂 Workspace of session {}", session_id).cyan().bold()
    );
    println!("{}", "Type 'help' for commands.".dimmed());
    explorer.load_root().await?;
    println!("{}", render_tree(&explorer.snapshot().await));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "ag3ntum>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match execute(ctx, &explorer, line).await {
            Ok(Step::Continue) => {}
            Ok(Step::Quit) => break,
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    explorer.reset().await;
    Ok(())
}

async fn execute<S: FileService>(
    ctx: &AppContext,
    explorer: &FileExplorer<S>,
    line: &str,
) -> Result<Step> {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    debug!("shell command: {} {:?}", command, arg);

    match command {
        "quit" | "exit" | "q" => return Ok(Step::Quit),
        "help" | "?" => {
            println!("{}", HELP);
            return Ok(Step::Continue);
        }
        "sessions" => {
            sessions::print_sessions(&ctx.sessions(arg == "--refresh").await?);
            return Ok(Step::Continue);
        }
        "cat" => {
            files::cat(ctx, Some(explorer.session_id()), require(arg, "cat <file>")?).await?;
            println!();
            return Ok(Step::Continue);
        }
        "ls" | "tree" => {}
        "open" => explorer.expand(require(arg, "open <dir>")?).await?,
        "close" => explorer.collapse(require(arg, "close <dir>")?).await,
        "toggle" => {
            explorer.toggle(require(arg, "toggle <dir>")?).await?;
        }
        "sort" => {
            let field: SortField = require(arg, "sort <field>")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let sort = explorer.change_sort(field).await?;
            println!(
                "{}",
                format!("Sorted by {} ({})", sort.sort_by, sort.sort_order.as_str()).dimmed()
            );
        }
        "goto" => {
            explorer.navigate_to(require(arg, "goto <path>")?).await?;
        }
        "rm" => {
            let path = require(arg, "rm <path>")?;
            let confirm = dialoguer::Confirm::new()
                .with_prompt(format!("Delete '{}'?", path))
                .default(false)
                .interact()?;
            if !confirm {
                println!("{}", "Cancelled".dimmed());
                return Ok(Step::Continue);
            }
            explorer.delete(path).await?;
        }
        "refresh" => explorer.refresh_all().await?,
        other => anyhow::bail!("Unknown command '{}', type 'help'", other),
    }

    println!("{}", render_tree(&explorer.snapshot().await));
    Ok(Step::Continue)
}

fn require<'a>(arg: &'a str, usage: &str) -> Result<&'a str> {
    if arg.is_empty() {
        anyhow::bail!("Usage: {}", usage);
    }
    Ok(arg)
}
