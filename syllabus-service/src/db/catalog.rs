//! List and detail queries for universities, authors, and texts.

use rusqlite::{OptionalExtension, params};

use super::Database;
use super::models::{Author, AuthorDetails, AuthorText, SyllabusUsage, TextDetails, University};
use crate::error::{DatabaseError, ServiceResult};

impl Database {
    /// List all universities, name-ordered
    pub fn list_universities(&self) -> ServiceResult<Vec<University>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, name FROM universities ORDER BY name ASC")
            .map_err(DatabaseError::Query)?;
        let universities = stmt
            .query_map([], |row| {
                Ok(University {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(universities)
    }

    /// List all authors, name-ordered
    pub fn list_authors(&self) -> ServiceResult<Vec<Author>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, name FROM authors ORDER BY name ASC")
            .map_err(DatabaseError::Query)?;
        let authors = stmt
            .query_map([], |row| {
                Ok(Author {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(authors)
    }

    /// Fetch a text with its author and syllabus usage, entries ordered by
    /// university name
    pub fn get_text_details(&self, id: i64) -> ServiceResult<Option<TextDetails>> {
        let conn = self.conn.lock().unwrap();

        let base = conn
            .query_row(
                "SELECT t.id, t.title, a.id, a.name FROM texts t \
                 LEFT JOIN authors a ON a.id = t.author_id WHERE t.id = ?1",
                params![id],
                |row| {
                    let author_id: Option<i64> = row.get(2)?;
                    let author_name: Option<String> = row.get(3)?;
                    let author = match (author_id, author_name) {
                        (Some(id), Some(name)) => Some(Author { id, name }),
                        _ => None,
                    };
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        author,
                    ))
                },
            )
            .optional()
            .map_err(DatabaseError::Query)?;

        let Some((text_id, title, author)) = base else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT u.id, u.name, sm.semester, sm.course_code, sm.marks, sm.credits \
                 FROM syllabus_map sm \
                 JOIN universities u ON u.id = sm.university_id \
                 WHERE sm.text_id = ?1 ORDER BY u.name ASC",
            )
            .map_err(DatabaseError::Query)?;
        let syllabus_entries = stmt
            .query_map(params![text_id], |row| {
                Ok(SyllabusUsage {
                    university: University {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    },
                    semester: row.get(2)?,
                    course_code: row.get(3)?,
                    marks: row.get(4)?,
                    credits: row.get(5)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(Some(TextDetails {
            id: text_id,
            title,
            author,
            syllabus_entries,
        }))
    }

    /// Fetch an author with their texts (each with its syllabus-entry count)
    /// and the distinct universities prescribing any of those texts
    pub fn get_author_details(&self, id: i64) -> ServiceResult<Option<AuthorDetails>> {
        let conn = self.conn.lock().unwrap();

        let base = conn
            .query_row(
                "SELECT id, name FROM authors WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(DatabaseError::Query)?;

        let Some((author_id, name)) = base else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.title, \
                 (SELECT COUNT(*) FROM syllabus_map sm WHERE sm.text_id = t.id) \
                 FROM texts t WHERE t.author_id = ?1 ORDER BY t.title ASC",
            )
            .map_err(DatabaseError::Query)?;
        let texts = stmt
            .query_map(params![author_id], |row| {
                Ok(AuthorText {
                    id: row.get(0)?,
                    title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    university_count: row.get(2)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT u.id, u.name FROM universities u \
                 JOIN syllabus_map sm ON sm.university_id = u.id \
                 JOIN texts t ON t.id = sm.text_id \
                 WHERE t.author_id = ?1 ORDER BY u.name ASC",
            )
            .map_err(DatabaseError::Query)?;
        let universities = stmt
            .query_map(params![author_id], |row| {
                Ok(University {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        let total_universities = universities.len();

        Ok(Some(AuthorDetails {
            id: author_id,
            name,
            texts,
            universities,
            total_universities,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support;

    #[test]
    fn lists_are_name_ordered() {
        let (_dir, db) = test_support::open_temp();
        test_support::seed(&db);

        let universities = db.list_universities().unwrap();
        let names: Vec<&str> = universities.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Delhi University", "JNU"]);

        let authors = db.list_authors().unwrap();
        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["George Eliot", "James Joyce", "William Shakespeare"]);
    }

    #[test]
    fn text_details_include_ordered_usage() {
        let (_dir, db) = test_support::open_temp();
        test_support::seed(&db);

        let details = db.get_text_details(1).unwrap().unwrap();
        assert_eq!(details.title, "Hamlet");
        assert_eq!(details.author.as_ref().unwrap().name, "William Shakespeare");
        assert_eq!(details.syllabus_entries.len(), 2);
        assert_eq!(
            details.syllabus_entries[0].university.name,
            "Delhi University"
        );
        assert_eq!(details.syllabus_entries[0].course_code.as_deref(), Some("ENG101"));
        assert_eq!(details.syllabus_entries[1].university.name, "JNU");

        assert!(db.get_text_details(999).unwrap().is_none());
    }

    #[test]
    fn author_details_aggregate_distinct_universities() {
        let (_dir, db) = test_support::open_temp();
        test_support::seed(&db);

        // Shakespeare: Hamlet (DU + JNU) and Macbeth (DU) -> 2 distinct universities
        let details = db.get_author_details(1).unwrap().unwrap();
        assert_eq!(details.name, "William Shakespeare");
        assert_eq!(details.texts.len(), 2);
        assert_eq!(details.texts[0].title, "Hamlet");
        assert_eq!(details.texts[0].university_count, 2);
        assert_eq!(details.total_universities, 2);

        assert!(db.get_author_details(999).unwrap().is_none());
    }
}
