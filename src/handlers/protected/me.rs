// handlers/protected/me.rs - GET /api/me

use axum::{extract::State, Extension};

use crate::database::models::User;
use crate::middleware::{ApiResult, AuthUser, WebResponse};
use crate::state::AppState;

/// GET /api/me - Profile of the token's owner
pub async fn whoami(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<User> {
    Ok(WebResponse::success(state.users.find_by_id(user.user_id).await?))
}
