//! Ag3ntum Types - Pure type definitions for the console crates
//!
//! This crate contains only pure data types with no async runtime dependencies.
//! The shapes mirror the session workspace REST endpoints the console consumes.

pub mod file;
pub mod session;

pub use file::*;
pub use session::*;
