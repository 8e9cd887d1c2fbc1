//! Browse endpoint: paginated, filtered text listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{BrowsePage, BrowseParams, BrowseSort};
use crate::error::ServiceError;

use super::AppState;

/// Browse query parameters. The list filters arrive comma-separated, e.g.
/// `?universities=JNU,Delhi University&semesters=1,3`.
#[derive(Deserialize)]
pub struct BrowseQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub universities: Option<String>,
    pub semesters: Option<String>,
    pub sort: Option<String>,
}

impl BrowseQuery {
    fn into_params(self) -> BrowseParams {
        BrowseParams {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(20),
            search: self.search.filter(|s| !s.is_empty()),
            universities: self
                .universities
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            semesters: self
                .semesters
                .map(|list| {
                    list.split(',')
                        .filter_map(|s| s.trim().parse().ok())
                        .collect()
                })
                .unwrap_or_default(),
            sort: self
                .sort
                .map(|s| BrowseSort::from_str(&s))
                .unwrap_or_default(),
        }
    }
}

pub async fn browse_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowsePage>, ServiceError> {
    let page = state.service.db.browse_texts(&query.into_params())?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(
        universities: Option<&str>,
        semesters: Option<&str>,
        sort: Option<&str>,
    ) -> BrowseQuery {
        BrowseQuery {
            page: None,
            page_size: None,
            search: None,
            universities: universities.map(String::from),
            semesters: semesters.map(String::from),
            sort: sort.map(String::from),
        }
    }

    #[test]
    fn comma_separated_filters_are_split_and_trimmed() {
        let params = query(Some("JNU, Delhi University"), Some("1, 3,nope"), None).into_params();
        assert_eq!(params.universities, ["JNU", "Delhi University"]);
        assert_eq!(params.semesters, [1, 3]);
        assert_eq!(params.sort, BrowseSort::Title);
    }

    #[test]
    fn defaults_and_sort_parsing() {
        let params = query(None, None, Some("author")).into_params();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 20);
        assert!(params.universities.is_empty());
        assert_eq!(params.sort, BrowseSort::Author);
    }
}
