//! Filtered, paginated browse queries over texts.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};

use super::Database;
use super::models::{Author, BrowsePage, TextSummary};
use crate::error::{DatabaseError, ServiceResult};

/// Sort orders for the browse listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowseSort {
    #[default]
    Title,
    Author,
}

impl BrowseSort {
    pub fn from_str(s: &str) -> Self {
        match s {
            "author" | "Author" => BrowseSort::Author,
            _ => BrowseSort::Title,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            // Authors can be missing; push untitled/unattributed rows last
            BrowseSort::Author => "a.name IS NULL, a.name ASC, t.title ASC",
            BrowseSort::Title => "t.title ASC",
        }
    }
}

/// Upper bound on one page of results; query values are caller-controlled
const MAX_PAGE_SIZE: u32 = 100;

/// Browse filter and pagination parameters
#[derive(Debug, Clone, Default)]
pub struct BrowseParams {
    pub page: u32,
    pub page_size: u32,
    /// Substring match against text title or author name
    pub search: Option<String>,
    /// Restrict to texts prescribed by any of these universities (by name)
    pub universities: Vec<String>,
    /// Restrict to texts prescribed in any of these semesters
    pub semesters: Vec<i64>,
    pub sort: BrowseSort,
}

impl BrowseParams {
    fn page(&self) -> u32 {
        self.page.max(1)
    }

    fn page_size(&self) -> u32 {
        if self.page_size == 0 {
            20
        } else {
            self.page_size.min(MAX_PAGE_SIZE)
        }
    }

    /// Build the shared WHERE clause and its bind values.
    fn filter_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = &self.search
            && !search.is_empty()
        {
            // Search is always the first filter, so it binds ?1
            clauses.push("(t.title LIKE ?1 OR a.name LIKE ?1)".to_string());
            values.push(Value::Text(format!("%{}%", search)));
        }

        if !self.universities.is_empty() || !self.semesters.is_empty() {
            let mut entry_conds: Vec<String> = Vec::new();

            if !self.universities.is_empty() {
                let placeholders = placeholders(values.len(), self.universities.len());
                entry_conds.push(format!("u.name IN ({})", placeholders));
                values.extend(
                    self.universities
                        .iter()
                        .map(|name| Value::Text(name.clone())),
                );
            }

            if !self.semesters.is_empty() {
                let placeholders = placeholders(values.len(), self.semesters.len());
                entry_conds.push(format!("sm.semester IN ({})", placeholders));
                values.extend(self.semesters.iter().map(|s| Value::Integer(*s)));
            }

            // A single entry must satisfy both the university and semester filter
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM syllabus_map sm \
                 JOIN universities u ON u.id = sm.university_id \
                 WHERE sm.text_id = t.id AND {})",
                entry_conds.join(" AND ")
            ));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// Numbered placeholders `?n, ?n+1, ...` starting after `taken` existing binds.
fn placeholders(taken: usize, count: usize) -> String {
    (taken + 1..=taken + count)
        .map(|n| format!("?{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn text_summary_from_row(row: &Row<'_>) -> rusqlite::Result<TextSummary> {
    let author_id: Option<i64> = row.get(2)?;
    let author_name: Option<String> = row.get(3)?;
    let author = match (author_id, author_name) {
        (Some(id), Some(name)) => Some(Author { id, name }),
        _ => None,
    };

    Ok(TextSummary {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        author,
        syllabus_count: row.get(4)?,
    })
}

impl Database {
    /// Fetch one page of texts matching the browse filters
    pub fn browse_texts(&self, params: &BrowseParams) -> ServiceResult<BrowsePage> {
        let conn = self.conn.lock().unwrap();

        let (where_sql, values) = params.filter_sql();
        let page = params.page();
        let page_size = params.page_size();
        let offset = (page as i64 - 1).saturating_mul(page_size as i64);

        let total: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM texts t \
                     LEFT JOIN authors a ON a.id = t.author_id {}",
                    where_sql
                ),
                params_from_iter(values.iter().cloned()),
                |row| row.get(0),
            )
            .map_err(DatabaseError::Query)?;

        let sql = format!(
            "SELECT t.id, t.title, a.id, a.name, \
             (SELECT COUNT(*) FROM syllabus_map sm WHERE sm.text_id = t.id) \
             FROM texts t \
             LEFT JOIN authors a ON a.id = t.author_id \
             {} ORDER BY {} LIMIT {} OFFSET {}",
            where_sql,
            params.sort.order_clause(),
            page_size,
            offset
        );

        let mut stmt = conn.prepare(&sql).map_err(DatabaseError::Query)?;
        let data = stmt
            .query_map(params_from_iter(values.into_iter()), text_summary_from_row)
            .map_err(DatabaseError::Query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)?;

        Ok(BrowsePage {
            data,
            total,
            page,
            page_size,
        })
    }
}
