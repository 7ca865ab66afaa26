//! User entity model: account identity plus the credit ledger and
//! subscription fields mutated by the billing webhook.

use serde::Serialize;
use sqlx::FromRow;

use deckgen_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    /// Non-negative credit balance. Debits are rejected when the requested
    /// amount exceeds the balance; refunds are additive and never rejected.
    pub credits_remaining: i32,
    /// Plan name, e.g. `"free"`, `"pro"`, `"creator"`.
    pub subscription_plan_name: Option<String>,
    /// Subscription status, e.g. `"active"`, `"trialing"`, `"past_due"`.
    pub subscription_status: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: Timestamp,
}

impl User {
    /// Whether the user has an active or trialing subscription.
    pub fn is_subscribed(&self) -> bool {
        matches!(
            self.subscription_status.as_deref(),
            Some("active") | Some("trialing")
        )
    }
}

/// Safe user representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub credits_remaining: i32,
    pub subscription_plan_name: Option<String>,
    pub subscription_status: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            credits_remaining: user.credits_remaining,
            subscription_plan_name: user.subscription_plan_name,
            subscription_status: user.subscription_status,
        }
    }
}
