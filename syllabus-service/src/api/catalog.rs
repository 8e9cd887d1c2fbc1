//! List and detail endpoints for universities, authors, and texts.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::db::{Author, AuthorDetails, TextDetails, University};
use crate::error::ServiceError;

use super::AppState;

pub async fn list_universities_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<University>>, ServiceError> {
    Ok(Json(state.service.db.list_universities()?))
}

pub async fn list_authors_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Author>>, ServiceError> {
    Ok(Json(state.service.db.list_authors()?))
}

pub async fn get_text_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TextDetails>, ServiceError> {
    let details = state
        .service
        .db
        .get_text_details(id)?
        .ok_or(ServiceError::TextNotFound { text_id: id })?;
    Ok(Json(details))
}

pub async fn get_author_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorDetails>, ServiceError> {
    let details = state
        .service
        .db
        .get_author_details(id)?
        .ok_or(ServiceError::AuthorNotFound { author_id: id })?;
    Ok(Json(details))
}
