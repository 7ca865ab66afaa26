//! Repository for the `presentations` table.
//!
//! Owns every status mutation so the state machine in
//! `deckgen_core::status` has a single enforcement point. The
//! `batch_token` column doubles as the refund guard: claiming it is an
//! atomic clear-if-set, so two finalizer runs can never both refund.

use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;

use crate::models::presentation::{BatchProgress, CreatePresentation, Presentation};

/// Column list for `presentations` queries.
const COLUMNS: &str = "\
    id, user_id, title, status, batch_token, presenter_name, \
    style_prompt, font_choice, creativity_score, created_at, last_edited_at";

pub struct PresentationRepo;

impl PresentationRepo {
    /// Create a presentation in `pending_text`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreatePresentation,
    ) -> Result<Presentation, sqlx::Error> {
        let query = format!(
            "INSERT INTO presentations \
                 (user_id, title, status, presenter_name, style_prompt, font_choice, \
                  creativity_score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Presentation>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(PresentationStatus::PendingText.as_str())
            .bind(&input.presenter_name)
            .bind(&input.style_prompt)
            .bind(&input.font_choice)
            .bind(input.creativity_score)
            .fetch_one(pool)
            .await
    }

    /// Find a presentation by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Presentation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presentations WHERE id = $1");
        sqlx::query_as::<_, Presentation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record the submitted batch: status `pending_visuals` plus the batch
    /// correlation token, in one statement.
    pub async fn begin_batch(
        pool: &PgPool,
        id: DbId,
        token: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE presentations \
             SET status = $2, batch_token = $3, last_edited_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(PresentationStatus::PendingVisuals.as_str())
        .bind(token)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Atomically claim (clear) the batch token.
    ///
    /// Returns `true` if the token was still set. A redelivered finalize
    /// sees `false` here and skips the refund.
    pub async fn claim_batch_token<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presentations SET batch_token = NULL \
             WHERE id = $1 AND batch_token IS NOT NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the terminal status of a finished batch, touch the last-edited
    /// timestamp, and clear the batch token.
    ///
    /// Guarded: applies only while the presentation is still
    /// `pending_visuals`, so a settlement that lost the race against a
    /// concurrent cancel (or vice versa) cannot overwrite the winner's
    /// terminal state. Returns whether a row was updated.
    pub async fn finalize_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: PresentationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presentations \
             SET status = $2, batch_token = NULL, last_edited_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(PresentationStatus::PendingVisuals.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Force `generation_failed` only if the presentation is still in
    /// `pending_visuals`. Used by the retries-exhausted fast-fail and the
    /// finalizer's fallback pass. Returns whether a row was updated.
    pub async fn fail_if_pending<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        Self::finalize_status(executor, id, PresentationStatus::GenerationFailed).await
    }

    /// Read-only generation progress projection for status polling.
    pub async fn progress(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BatchProgress>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT p.status, \
                    COUNT(s.id), \
                    COUNT(s.id) FILTER (WHERE s.image_url IS NOT NULL) \
             FROM presentations p \
             LEFT JOIN slides s ON s.presentation_id = p.id \
             WHERE p.id = $1 \
             GROUP BY p.status",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map(|row| {
            row.map(|(status, total_slides, completed_slides)| BatchProgress {
                status,
                total_slides,
                completed_slides,
            })
        })
    }
}
