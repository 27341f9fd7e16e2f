// handlers/public/auth.rs - POST /api/register and POST /api/login

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::User;
use crate::middleware::{ApiResult, WebResponse};
use crate::services::{LoginInput, LoginOutcome, RegisterInput};
use crate::state::AppState;

/// POST /api/register - Create a user account
///
/// Expected Input:
/// ```json
/// { "name": "Alice", "email": "alice@example.com", "password": "Str0ng!pass" }
/// ```
///
/// The password must be at least 8 characters with an uppercase letter, a
/// lowercase letter, a digit and a symbol. A taken email answers 409 with
/// `errors.email` set.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let user = state.users.register(input).await?;
    Ok(WebResponse::created(user).with_message("registration successful"))
}

/// POST /api/login - Exchange credentials for a bearer token
///
/// Expected Output (Success):
/// ```json
/// {
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "expires_at": "2025-01-01T13:00:00Z",
///     "user": { "id": 1, "name": "Alice", "email": "alice@example.com", "created_at": "..." }
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<LoginOutcome> {
    let Json(input) = payload?;
    let outcome = state.users.login(input).await?;
    Ok(WebResponse::success(outcome))
}
