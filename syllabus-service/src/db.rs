//! Database module for SQLite operations.
//!
//! This module provides the `Database` struct and all database operations
//! organized into submodules by domain. The schema is shared with the
//! external extraction script, which writes into the same file directly;
//! both sides create it idempotently so either can run first.

mod browse;
mod catalog;
mod deletes;
mod migrations;
pub mod models;
mod stats;

pub use browse::{BrowseParams, BrowseSort};
pub use models::{
    Author, AuthorDetails, AuthorText, BrowsePage, DashboardStats, RankedItem, SyllabusUsage,
    TextDetails, TextSummary, University,
};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{DatabaseError, ServiceError, ServiceResult};

/// Database manager for SQLite operations
pub struct Database {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open(path: &Path) -> ServiceResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ServiceError::Internal {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let conn = open_connection(path)?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Drop the current connection and open a fresh one.
    ///
    /// The extraction script writes into the database file directly, bypassing
    /// this process. Reopening guarantees subsequent reads see its committed
    /// writes rather than anything cached on the old connection.
    pub fn reconnect(&self) -> ServiceResult<()> {
        let fresh = open_connection(&self.path)?;
        let mut conn = self.conn.lock().unwrap();
        *conn = fresh;
        Ok(())
    }
}

fn open_connection(path: &Path) -> ServiceResult<Connection> {
    let conn = Connection::open(path).map_err(DatabaseError::Connection)?;

    // Enable WAL mode for better concurrency
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(DatabaseError::Query)?;

    Ok(conn)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_sees_external_writes() {
        let (_dir, db) = test_support::open_temp();

        // Simulate the extraction script writing through a separate connection
        let external = Connection::open(&db.path).unwrap();
        external
            .execute(
                "INSERT INTO universities (name) VALUES ('External University')",
                [],
            )
            .unwrap();
        drop(external);

        db.reconnect().unwrap();
        let universities = db.list_universities().unwrap();
        assert_eq!(universities.len(), 1);
        assert_eq!(universities[0].name, "External University");
    }
}
