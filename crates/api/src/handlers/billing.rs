//! Billing webhook: external credit grants.
//!
//! The billing provider's webhook relay calls this with a shared secret.
//! Grants compose with pipeline refunds without double-counting because
//! both are single UPDATEs against the persisted balance.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use deckgen_core::credits::signup_grant;
use deckgen_core::error::CoreError;
use deckgen_core::types::DbId;
use deckgen_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GrantCredits {
    pub user_id: DbId,
    /// Explicit amount, or omitted to grant the plan's signup amount.
    pub amount: Option<i32>,
    /// Plan name used when `amount` is omitted.
    pub plan: Option<String>,
    /// `true` sets the balance outright (plan renewal); `false` adds.
    #[serde(default)]
    pub replace: bool,
}

/// POST /api/v1/billing/credits
///
/// Requires the `x-webhook-secret` header to match the configured
/// billing webhook secret.
pub async fn grant_credits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<GrantCredits>,
) -> AppResult<impl IntoResponse> {
    let secret = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if secret != state.config.billing_webhook_secret {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook secret".to_string(),
        )));
    }

    let amount = match (input.amount, input.plan.as_deref()) {
        (Some(amount), _) if amount >= 0 => amount,
        (None, Some(plan)) => signup_grant(plan),
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "Either a non-negative amount or a plan name is required".to_string(),
            )))
        }
    };

    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: input.user_id,
        }))?;
    UserRepo::grant_credits(&state.pool, input.user_id, amount, input.replace).await?;

    tracing::info!(
        user_id = input.user_id,
        amount,
        replace = input.replace,
        "Credits granted via billing webhook"
    );
    Ok(Json(DataResponse {
        data: json!({ "granted": amount, "replace": input.replace }),
    }))
}
