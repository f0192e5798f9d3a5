//! filescope-db - Read-only access to the filescope line index
//!
//! Search and statistics run against their own read-only connection and
//! never mutate the store. Writes live in `filescope-indexer`.

pub mod connection;
pub mod search;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixture;

pub use connection::*;
pub use search::*;
pub use stats::TOP_FILE_TYPES;
