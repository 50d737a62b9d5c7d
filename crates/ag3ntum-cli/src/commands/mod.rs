pub mod config;
pub mod files;
pub mod render;
pub mod sessions;
pub mod shell;
