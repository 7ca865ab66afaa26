//! Repository for the `slides` table.
//!
//! Each slide row is mutated by exactly one generation job, so there is no
//! cross-job contention here; the only subtlety is that a successful
//! generation persists all image fields and the idempotency flag in a
//! single UPDATE.

use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use deckgen_core::types::DbId;

use crate::models::slide::{CreateSlide, Slide, SlideImage};

/// Column list for `slides` queries.
const COLUMNS: &str = "\
    id, presentation_id, slide_number, title, text_content, \
    image_key, image_url, image_gen_prompt, applied_style_info, \
    image_generated, created_at";

pub struct SlideRepo;

impl SlideRepo {
    /// Bulk-create the slides of a presentation, ordered by `slide_number`.
    pub async fn create_many(
        pool: &PgPool,
        presentation_id: DbId,
        slides: &[CreateSlide],
    ) -> Result<Vec<Slide>, sqlx::Error> {
        let query = format!(
            "INSERT INTO slides (presentation_id, slide_number, title, text_content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let mut created = Vec::with_capacity(slides.len());
        let mut tx = pool.begin().await?;
        for slide in slides {
            let row = sqlx::query_as::<_, Slide>(&query)
                .bind(presentation_id)
                .bind(slide.slide_number)
                .bind(&slide.title)
                .bind(slide.content.to_storage())
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// List a presentation's slides in deck order.
    pub async fn list_for_presentation(
        pool: &PgPool,
        presentation_id: DbId,
    ) -> Result<Vec<Slide>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slides WHERE presentation_id = $1 ORDER BY slide_number"
        );
        sqlx::query_as::<_, Slide>(&query)
            .bind(presentation_id)
            .fetch_all(pool)
            .await
    }

    /// Find a slide by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Slide>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slides WHERE id = $1");
        sqlx::query_as::<_, Slide>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist a successful generation: image reference, the prompt used,
    /// the applied style, and the idempotency flag, atomically.
    pub async fn set_image<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        image: &SlideImage<'_>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE slides \
             SET image_key = $2, image_url = $3, image_gen_prompt = $4, \
                 applied_style_info = $5, image_generated = TRUE \
             WHERE id = $1",
        )
        .bind(id)
        .bind(image.image_key)
        .bind(image.image_url)
        .bind(image.image_gen_prompt)
        .bind(image.applied_style_info)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Update a slide's title and body text (user edit before regenerate).
    pub async fn update_text(
        pool: &PgPool,
        id: DbId,
        title: &str,
        text_content: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE slides SET title = $2, text_content = $3 WHERE id = $1")
            .bind(id)
            .bind(title)
            .bind(text_content)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Count slides for a presentation.
    pub async fn count_for_presentation<'e>(
        executor: impl PgExecutor<'e>,
        presentation_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM slides WHERE presentation_id = $1")
                .bind(presentation_id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    /// Count slides that actually have a persisted image reference.
    ///
    /// The finalizer checks this against reported job outcomes because a
    /// worker can crash between generating an image and committing the row.
    pub async fn count_with_image<'e>(
        executor: impl PgExecutor<'e>,
        presentation_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM slides \
             WHERE presentation_id = $1 AND image_url IS NOT NULL",
        )
        .bind(presentation_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
