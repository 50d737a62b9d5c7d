//! Ag3ntum Console - Core Library
//!
//! The markdown rendering engine (with live resource-tag widgets) and the
//! file explorer data/cache layer shared by every console front-end.

pub mod cache;
pub mod config;
pub mod error;
pub mod explorer;
pub mod markdown;
pub mod paths;
pub mod service;
pub mod utils;

pub use cache::{CacheConfig, EntryState, TtlCache};
pub use config::*;
pub use error::*;
pub use explorer::{ErrorCallback, ExplorerOptions, ExplorerSnapshot, ExplorerState, FileExplorer, FolderState};
pub use service::FileService;

pub use ag3ntum_types as types;
