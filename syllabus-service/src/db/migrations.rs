//! Database schema migrations.
//!
//! The table definitions mirror the ones the extraction script creates, so
//! whichever side touches the database first produces the same schema.

use rusqlite::Connection;

use crate::error::{DatabaseError, ServiceResult};

/// Run all database migrations.
pub(super) fn run_migrations(conn: &Connection) -> ServiceResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS texts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            author_id INTEGER,
            FOREIGN KEY(author_id) REFERENCES authors(id),
            UNIQUE(title, author_id)
        );

        CREATE TABLE IF NOT EXISTS universities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS syllabus_map (
            university_id INTEGER,
            text_id INTEGER,
            semester INTEGER,
            course_code TEXT,
            marks TEXT,
            credits INTEGER,
            PRIMARY KEY (university_id, text_id, course_code),
            FOREIGN KEY(university_id) REFERENCES universities(id),
            FOREIGN KEY(text_id) REFERENCES texts(id)
        );

        CREATE INDEX IF NOT EXISTS idx_texts_author ON texts(author_id);
        CREATE INDEX IF NOT EXISTS idx_syllabus_text ON syllabus_map(text_id);
        CREATE INDEX IF NOT EXISTS idx_syllabus_university ON syllabus_map(university_id);
        "#,
    )
    .map_err(|e| DatabaseError::Migration {
        message: e.to_string(),
    })?;

    Ok(())
}
