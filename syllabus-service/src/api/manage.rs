//! Curation endpoints: cascading deletes.
//!
//! Every successful delete invalidates the dashboard and browse views, since
//! their aggregates are cached between writes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;

use super::AppState;

/// Response for delete operations
#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Bulk text deletion request
#[derive(Deserialize)]
pub struct DeleteTextsRequest {
    pub ids: Vec<i64>,
}

pub async fn delete_texts_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteTextsRequest>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    let deleted = state.service.delete_texts(&request.ids)?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Deleted {} texts successfully.", deleted),
    }))
}

pub async fn delete_author_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    let deleted = state.service.delete_author(id)?;

    if deleted {
        Ok(Json(DeleteResponse {
            success: true,
            message: "Author and associated data deleted successfully.".to_string(),
        }))
    } else {
        Err(ServiceError::AuthorNotFound { author_id: id })
    }
}

pub async fn delete_university_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    let deleted = state.service.delete_university(id)?;

    if deleted {
        Ok(Json(DeleteResponse {
            success: true,
            message: "University and associated records deleted successfully.".to_string(),
        }))
    } else {
        Err(ServiceError::UniversityNotFound { university_id: id })
    }
}

pub async fn delete_semester_handler(
    State(state): State<Arc<AppState>>,
    Path((id, semester)): Path<(i64, i64)>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    let deleted = state.service.delete_semester(id, semester)?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Deleted {} records for Semester {}.", deleted, semester),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api;
    use crate::db::test_support as db_test_support;
    use crate::service::test_support::service_with_script;
    use crate::views::VIEW_BROWSE;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn bulk_text_delete_reports_count_and_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(dir.path(), "exit 0", None);
        db_test_support::seed(&service.db);
        let app = api::router(service.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/texts")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"ids":[1,2]}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Deleted 2 texts successfully.");
        assert_eq!(service.views.generation(VIEW_BROWSE), 1);
    }

    #[tokio::test]
    async fn deleting_missing_author_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(dir.path(), "exit 0", None);
        let app = api::router(service);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/authors/42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "author_not_found");
    }

    #[tokio::test]
    async fn semester_delete_is_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(dir.path(), "exit 0", None);
        db_test_support::seed(&service.db);
        let app = api::router(service.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/universities/2/semesters/5")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Deleted 2 records for Semester 5.");
    }
}
