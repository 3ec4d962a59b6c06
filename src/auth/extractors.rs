use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use super::repo::User;
use super::services::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Like [`AuthUser`], but additionally requires the admin flag on the
/// user record. Admin status lives in the database, not in the token, so
/// revoking it takes effect immediately.
pub struct AdminUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

        if !user.is_admin {
            warn!(user_id = %user_id, "admin route rejected");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }

        Ok(AdminUser(user_id))
    }
}
