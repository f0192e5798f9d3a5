//! filescope-core - Core types for the filescope line index
//!
//! This crate holds the plain data types shared by the write side
//! (`filescope-indexer`), the read side (`filescope-db`) and the CLI,
//! along with the event model both engines report progress through.

pub mod events;
pub mod format;
pub mod scope;
pub mod types;

pub use events::*;
pub use format::*;
pub use scope::*;
pub use types::*;
