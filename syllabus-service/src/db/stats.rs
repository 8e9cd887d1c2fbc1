//! Dashboard aggregate queries.

use super::Database;
use super::models::{DashboardStats, RankedItem, University};
use crate::error::{DatabaseError, ServiceResult};

impl Database {
    /// Compute the dashboard aggregates in one pass
    pub fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let conn = self.conn.lock().unwrap();

        let count = |table: &str| -> ServiceResult<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| DatabaseError::Query(e).into())
        };

        let university_count = count("universities")?;
        let text_count = count("texts")?;
        let author_count = count("authors")?;

        let mut stmt = conn
            .prepare("SELECT id, name FROM universities ORDER BY id DESC LIMIT 5")
            .map_err(DatabaseError::Query)?;
        let latest_universities = stmt
            .query_map([], |row| {
                Ok(University {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.title, COUNT(sm.university_id) as count \
                 FROM texts t \
                 JOIN syllabus_map sm ON sm.text_id = t.id \
                 GROUP BY t.id ORDER BY count DESC LIMIT 10",
            )
            .map_err(DatabaseError::Query)?;
        let top_texts = stmt
            .query_map([], |row| {
                Ok(RankedItem {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    count: row.get(2)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        let mut stmt = conn
            .prepare(
                "SELECT a.id, a.name, COUNT(sm.university_id) as count \
                 FROM authors a \
                 JOIN texts t ON t.author_id = a.id \
                 JOIN syllabus_map sm ON sm.text_id = t.id \
                 GROUP BY a.id ORDER BY count DESC LIMIT 10",
            )
            .map_err(DatabaseError::Query)?;
        let top_authors = stmt
            .query_map([], |row| {
                Ok(RankedItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    count: row.get(2)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(DashboardStats {
            university_count,
            text_count,
            author_count,
            latest_universities,
            top_texts,
            top_authors,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support;

    #[test]
    fn dashboard_stats_aggregate_the_dataset() {
        let (_dir, db) = test_support::open_temp();
        test_support::seed(&db);

        let stats = db.dashboard_stats().unwrap();
        assert_eq!(stats.university_count, 2);
        assert_eq!(stats.text_count, 4);
        assert_eq!(stats.author_count, 3);

        // Latest universities come back newest-first
        assert_eq!(stats.latest_universities[0].name, "JNU");

        // Hamlet and Dubliners lead with two entries each
        assert_eq!(stats.top_texts.len(), 4);
        assert_eq!(stats.top_texts[0].count, 2);
        assert_eq!(stats.top_texts[1].count, 2);

        // Shakespeare: 3 entries across Hamlet and Macbeth
        assert_eq!(stats.top_authors[0].name, "William Shakespeare");
        assert_eq!(stats.top_authors[0].count, 3);
    }

    #[test]
    fn dashboard_stats_on_empty_database() {
        let (_dir, db) = test_support::open_temp();

        let stats = db.dashboard_stats().unwrap();
        assert_eq!(stats.university_count, 0);
        assert!(stats.latest_universities.is_empty());
        assert!(stats.top_texts.is_empty());
        assert!(stats.top_authors.is_empty());
    }
}
