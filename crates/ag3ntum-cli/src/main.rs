//! Ag3ntum Console CLI
//!
//! Browse session workspaces and render agent replies from the terminal.

mod api;
mod commands;
mod config;
mod context;
mod terminal;

use ag3ntum_core::types::SortField;
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ag3ntum")]
#[command(author, version, about = "Ag3ntum Console - workspace explorer and reply renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session to work on (defaults to the configured session)
    #[arg(short, long, global = true, env = "AG3NTUM_SESSION")]
    session: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown document (use - for stdin)
    Render {
        file: PathBuf,

        /// Emit HTML instead of terminal output
        #[arg(long)]
        html: bool,

        /// Load file and image widgets from the session workspace
        #[arg(short, long)]
        resolve: bool,

        /// Show long file previews up to the line ceiling
        #[arg(short, long)]
        expand: bool,
    },

    /// List a workspace directory
    Ls {
        #[arg(default_value = ".")]
        path: String,

        /// Sort field (name, size, modified_at)
        #[arg(long)]
        sort: Option<SortField>,

        /// Reverse the default order of the sort field
        #[arg(short, long)]
        reverse: bool,
    },

    /// Show the workspace tree with a folder expanded
    Tree {
        #[arg(default_value = ".")]
        path: String,
    },

    /// Reveal a path in the tree and highlight it
    Goto { path: String },

    /// Print a workspace file
    Cat { path: String },

    /// Delete a file or folder
    Rm {
        path: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Upload local files into a workspace folder
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target folder in the workspace
        #[arg(short, long, default_value = ".")]
        dir: String,
    },

    /// Download a workspace file
    Download {
        path: String,

        /// Output file (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List sessions
    Sessions {
        /// Bypass the cached list
        #[arg(long)]
        refresh: bool,
    },

    /// List available skills
    Skills,

    /// Interactive workspace explorer
    Shell,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
    /// Set the API base URL
    SetServer {
        /// Server URL (e.g., http://localhost:40080/api/v1)
        url: String,
    },
    /// Set the default session
    SetSession { session_id: String },
    /// Reset to default configuration
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "ag3ntum_cli=debug,ag3ntum_core=debug"
        } else {
            "ag3ntum_cli=info"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    info!("Starting Ag3ntum console");

    let result = run(cli).await;

    if let Err(ref e) = result {
        error!("Command failed: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    // Config commands work even when the API client cannot be built
    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config::show().await,
            ConfigAction::Validate => commands::config::validate().await,
            ConfigAction::SetServer { url } => commands::config::set_server(&url).await,
            ConfigAction::SetSession { session_id } => {
                commands::config::set_session(&session_id).await
            }
            ConfigAction::Reset => commands::config::reset().await,
        };
    }

    let (config, _) = config::SettingsManager::load()?;
    let ctx = context::AppContext::new(config)?;
    let session = cli.session.as_deref();

    match cli.command {
        Commands::Render {
            file,
            html,
            resolve,
            expand,
        } => {
            commands::render::run(
                &ctx,
                commands::render::RenderArgs {
                    file: &file,
                    html,
                    resolve,
                    expand,
                    session,
                },
            )
            .await
        }
        Commands::Ls {
            path,
            sort,
            reverse,
        } => commands::files::ls(&ctx, session, &path, sort, reverse).await,
        Commands::Tree { path } => commands::files::tree(&ctx, session, &path).await,
        Commands::Goto { path } => commands::files::goto(&ctx, session, &path).await,
        Commands::Cat { path } => commands::files::cat(&ctx, session, &path).await,
        Commands::Rm { path, yes } => commands::files::rm(&ctx, session, &path, yes).await,
        Commands::Upload { files, dir } => commands::files::upload(&ctx, session, &files, &dir).await,
        Commands::Download { path, output } => {
            commands::files::download(&ctx, session, &path, output).await
        }
        Commands::Sessions { refresh } => commands::sessions::sessions(&ctx, refresh).await,
        Commands::Skills => commands::sessions::skills(&ctx).await,
        Commands::Shell => commands::shell::run(&ctx, session).await,
        Commands::Config { .. } => Ok(()),
    }
}
