//! Database model structs.
//!
//! Base records mirror the shared schema; the richer view types are shaped
//! for the dashboard, browse, and detail screens.

use serde::{Deserialize, Serialize};

/// University record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct University {
    pub id: i64,
    pub name: String,
}

/// Author record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// One text in the browse listing, with its author and how many syllabus
/// entries reference it
#[derive(Debug, Clone, Serialize)]
pub struct TextSummary {
    pub id: i64,
    pub title: String,
    pub author: Option<Author>,
    pub syllabus_count: i64,
}

/// One page of browse results
#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    pub data: Vec<TextSummary>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// A syllabus entry as seen from a text's detail view
#[derive(Debug, Clone, Serialize)]
pub struct SyllabusUsage {
    pub university: University,
    pub semester: Option<i64>,
    pub course_code: Option<String>,
    pub marks: Option<String>,
    pub credits: Option<i64>,
}

/// Full detail view for a text
#[derive(Debug, Clone, Serialize)]
pub struct TextDetails {
    pub id: i64,
    pub title: String,
    pub author: Option<Author>,
    pub syllabus_entries: Vec<SyllabusUsage>,
}

/// One of an author's texts, with the number of syllabus entries citing it
#[derive(Debug, Clone, Serialize)]
pub struct AuthorText {
    pub id: i64,
    pub title: String,
    pub university_count: i64,
}

/// Full detail view for an author
#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetails {
    pub id: i64,
    pub name: String,
    pub texts: Vec<AuthorText>,
    /// Distinct universities prescribing any of this author's texts
    pub universities: Vec<University>,
    pub total_universities: usize,
}

/// A ranked dashboard item (top text or top author)
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

/// Aggregates for the dashboard landing page
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub university_count: i64,
    pub text_count: i64,
    pub author_count: i64,
    pub latest_universities: Vec<University>,
    pub top_texts: Vec<RankedItem>,
    pub top_authors: Vec<RankedItem>,
}
