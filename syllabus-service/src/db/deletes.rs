//! Cascading delete operations.
//!
//! The schema predates `ON DELETE CASCADE` (the extraction script owns it),
//! so each cascade removes the dependent syllabus entries explicitly inside
//! a single transaction.

use rusqlite::params;
use rusqlite::types::Value;

use super::Database;
use crate::error::{DatabaseError, ServiceResult};

/// Expand `(?1, ?2, ...)` for an id list.
fn id_placeholders(count: usize) -> String {
    (1..=count)
        .map(|n| format!("?{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Database {
    /// Bulk-delete texts and their syllabus entries. Returns the number of
    /// texts removed.
    pub fn delete_texts(&self, ids: &[i64]) -> ServiceResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;

        let values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
        let placeholders = id_placeholders(ids.len());

        tx.execute(
            &format!(
                "DELETE FROM syllabus_map WHERE text_id IN ({})",
                placeholders
            ),
            rusqlite::params_from_iter(values.iter().cloned()),
        )
        .map_err(DatabaseError::Query)?;

        let deleted = tx
            .execute(
                &format!("DELETE FROM texts WHERE id IN ({})", placeholders),
                rusqlite::params_from_iter(values.into_iter()),
            )
            .map_err(DatabaseError::Query)?;

        tx.commit().map_err(DatabaseError::Query)?;
        Ok(deleted)
    }

    /// Delete an author along with all their texts and those texts' syllabus
    /// entries. Returns false when the author does not exist.
    pub fn delete_author(&self, id: i64) -> ServiceResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;

        tx.execute(
            "DELETE FROM syllabus_map WHERE text_id IN \
             (SELECT id FROM texts WHERE author_id = ?1)",
            params![id],
        )
        .map_err(DatabaseError::Query)?;

        tx.execute("DELETE FROM texts WHERE author_id = ?1", params![id])
            .map_err(DatabaseError::Query)?;

        let deleted = tx
            .execute("DELETE FROM authors WHERE id = ?1", params![id])
            .map_err(DatabaseError::Query)?;

        tx.commit().map_err(DatabaseError::Query)?;
        Ok(deleted > 0)
    }

    /// Delete a university and all its syllabus entries. Returns false when
    /// the university does not exist.
    pub fn delete_university(&self, id: i64) -> ServiceResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;

        tx.execute(
            "DELETE FROM syllabus_map WHERE university_id = ?1",
            params![id],
        )
        .map_err(DatabaseError::Query)?;

        let deleted = tx
            .execute("DELETE FROM universities WHERE id = ?1", params![id])
            .map_err(DatabaseError::Query)?;

        tx.commit().map_err(DatabaseError::Query)?;
        Ok(deleted > 0)
    }

    /// Delete all syllabus entries for one semester of a university.
    /// Returns the number of entries removed.
    pub fn delete_semester(&self, university_id: i64, semester: i64) -> ServiceResult<usize> {
        let conn = self.conn.lock().unwrap();

        let deleted = conn
            .execute(
                "DELETE FROM syllabus_map WHERE university_id = ?1 AND semester = ?2",
                params![university_id, semester],
            )
            .map_err(DatabaseError::Query)?;

        Ok(deleted)
    }
}
