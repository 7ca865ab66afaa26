//! Repository for the `users` table: lookups and the credit ledger.
//!
//! The balance invariant (`credits_remaining >= 0`) is enforced here, not
//! by callers: a debit is a single conditional UPDATE so the check and the
//! mutation cannot be separated by a concurrent writer.

use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use deckgen_core::types::DbId;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "\
    id, email, name, credits_remaining, \
    subscription_plan_name, subscription_status, \
    stripe_customer_id, stripe_subscription_id, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically debit `amount` credits if the balance covers it.
    ///
    /// Returns `true` when the debit was applied, `false` when the balance
    /// was insufficient (no mutation in that case). Check-then-act happens
    /// inside the single UPDATE, so concurrent debits cannot overdraw.
    pub async fn debit_credits<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        amount: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users \
             SET credits_remaining = credits_remaining - $2 \
             WHERE id = $1 AND credits_remaining >= $2",
        )
        .bind(user_id)
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Additively refund credits. Never rejected; a refund may land after
    /// the balance has already changed through other debits.
    pub async fn refund_credits<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        amount: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET credits_remaining = credits_remaining + $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Grant credits from the billing subsystem.
    ///
    /// `replace = true` sets the balance outright (plan renewal);
    /// `replace = false` adds to it (top-up). Composes with pipeline
    /// refunds without double-counting because both are single UPDATEs
    /// against the persisted row.
    pub async fn grant_credits(
        pool: &PgPool,
        user_id: DbId,
        amount: i32,
        replace: bool,
    ) -> Result<(), sqlx::Error> {
        let sql = if replace {
            "UPDATE users SET credits_remaining = $2 WHERE id = $1"
        } else {
            "UPDATE users SET credits_remaining = credits_remaining + $2 WHERE id = $1"
        };
        sqlx::query(sql).bind(user_id).bind(amount).execute(pool).await?;
        Ok(())
    }
}
