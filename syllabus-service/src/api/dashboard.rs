//! Dashboard aggregates endpoint.

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::db::DashboardStats;
use crate::error::ServiceError;

use super::AppState;

pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ServiceError> {
    let stats = state.service.dashboard_stats()?;
    Ok(Json(stats))
}
