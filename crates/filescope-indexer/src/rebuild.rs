//! Index clearing
//!
//! Drops every data table and recreates the schema from scratch.

use rusqlite::Connection;

use crate::connection::IndexerError;
use crate::schema;

/// Remove all indexed files and lines
///
/// The `metadata` table survives; everything else is dropped and recreated
/// through [`schema::init_schema`]. Returns whether the recreated store is
/// backed by the full-text index.
pub fn clear_index(conn: &mut Connection, full_text: bool) -> Result<bool, IndexerError> {
    // Triggers reference both tables, drop them first
    conn.execute_batch(
        "DROP TRIGGER IF EXISTS file_contents_ai;
         DROP TRIGGER IF EXISTS file_contents_ad;
         DROP TRIGGER IF EXISTS file_contents_au;",
    )?;

    conn.execute_batch(
        "DROP TABLE IF EXISTS file_contents_fts;
         DROP TABLE IF EXISTS file_contents;
         DROP TABLE IF EXISTS files;",
    )?;

    let full_text_enabled = schema::init_schema(conn, full_text)?;
    tracing::info!(full_text_enabled, "index cleared");
    Ok(full_text_enabled)
}
