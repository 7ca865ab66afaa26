//! Current-user endpoint: identity, credit balance, subscription state.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use deckgen_core::error::CoreError;
use deckgen_db::models::user::UserResponse;
use deckgen_db::repositories::UserRepo;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: UserResponse,
    pub subscribed: bool,
}

/// GET /api/v1/users/me
///
/// Clients poll this after generation or cancellation to show the
/// up-to-date credit balance.
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: auth.user_id,
        }))?;

    let subscribed = user.is_subscribed();
    Ok(Json(DataResponse {
        data: CurrentUser {
            user: user.into(),
            subscribed,
        },
    }))
}
