//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `POST   /api/v1/users/{user_id}/transactions`      – record a transaction
//! - `GET    /api/v1/users/{user_id}/transactions`      – list the owner's ledger
//! - `PUT    /api/v1/users/{user_id}/transactions/{id}` – update a transaction
//! - `DELETE /api/v1/users/{user_id}/transactions/{id}` – delete a transaction
//! - `GET    /api/v1/users/{user_id}/stats`             – aggregated stats

use axum::{Json, http::StatusCode, response::IntoResponse};
use fintrack_core::entities::LedgerError;
use fintrack_core::services::{StatsError, WriteError};
use fintrack_sdk::objects::TransactionDraft;
use serde::Serialize;

pub mod stats;
pub mod transactions;

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Request payload or path parameter failed validation.
    Validation(String),
    /// The addressed transaction does not exist under this owner.
    NotFound,
    /// A ledger shard query failed.
    Store(LedgerError),
    /// The snapshot channel rejected a publish.
    Channel(fintrack_core::events::ChannelError),
    /// The stats fallback fetch failed.
    Upstream(StatsError),
}

impl From<WriteError> for ApiError {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::Ledger(LedgerError::NotFound) => ApiError::NotFound,
            WriteError::Ledger(other) => ApiError::Store(other),
            WriteError::Channel(e) => ApiError::Channel(e),
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        ApiError::Upstream(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "transaction not found".to_string()),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "ledger store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::Channel(e) => {
                tracing::error!(error = %e, "snapshot channel error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, "stats upstream error");
                (StatusCode::BAD_GATEWAY, "upstream unavailable".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Reject blank owner ids before they reach the router, where they would
/// hash to some bucket like any other string.
fn require_user_id(user_id: &str) -> Result<&str, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::Validation("user id must not be empty".to_string()));
    }
    Ok(user_id)
}

fn validate_draft(draft: &TransactionDraft) -> Result<(), ApiError> {
    if draft.category.trim().is_empty() {
        return Err(ApiError::Validation("category must not be empty".to_string()));
    }
    Ok(())
}
