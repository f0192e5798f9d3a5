//! filescope-indexer - Indexing pipeline for the filescope line index
//!
//! This crate owns all **write** operations to the index database.
//! The companion `filescope-db` crate provides read-only access for search
//! and statistics. Both share the same `~/.filescope/index.db` file.

pub mod connection;
pub mod discovery;
pub mod eligibility;
pub mod extract;
pub mod hasher;
pub mod indexer;
pub mod rebuild;
pub mod schema;
pub mod store;

pub use connection::{IndexStore, IndexerError, StoreOptions};
pub use discovery::{walk_tree, WalkEntry};
pub use eligibility::{Classifier, Eligibility, FileCheck, IndexReason, SkipReason};
pub use extract::{extract_lines, read_lines, ContentLine, ExtractLimits};
pub use hasher::fingerprint;
pub use indexer::{index_folder, update_index, IndexReport, IndexerConfig};
pub use rebuild::clear_index;
pub use schema::{init_schema, migrate_schema, DB_VERSION};
