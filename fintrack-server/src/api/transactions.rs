//! Ledger mutation and listing handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use fintrack_sdk::objects::TransactionDraft;

use super::{ApiError, require_user_id, validate_draft};
use crate::state::AppState;

/// `POST /api/v1/users/{user_id}/transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(draft): Json<TransactionDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&user_id)?;
    validate_draft(&draft)?;

    let created = state.write.create_transaction(user_id, &draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/v1/users/{user_id}/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&user_id)?;

    let transactions = state.write.list_transactions(user_id).await?;
    Ok(Json(transactions))
}

/// `PUT /api/v1/users/{user_id}/transactions/{id}`
pub async fn update_transaction(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, i64)>,
    Json(draft): Json<TransactionDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&user_id)?;
    validate_draft(&draft)?;

    let updated = state.write.update_transaction(user_id, id, &draft).await?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/users/{user_id}/transactions/{id}`
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user_id(&user_id)?;

    state.write.delete_transaction(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
