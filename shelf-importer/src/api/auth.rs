//! Acting-user resolution
//!
//! Session handling lives in front of this service; requests name the acting
//! user in the `X-User-Id` header. The resolved [`User`] is stored in the
//! request extensions for handlers to extract.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::db::users;
use crate::error::ApiError;
use crate::models::User;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Reject requests without a known user with 401
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?
        .to_string();

    let user: User = {
        let mut conn = state.db.acquire().await?;
        users::find_by_id(&mut conn, &user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?
    };

    debug!(user_id = %user.id, "Resolved acting user");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
