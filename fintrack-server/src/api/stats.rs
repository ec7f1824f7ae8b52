//! Aggregated stats handler.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{ApiError, require_user_id};
use crate::state::AppState;

/// `GET /api/v1/users/{user_id}/stats`
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&user_id)?;

    let stats = state.read.get_stats(user_id).await?;
    Ok(Json(stats))
}
