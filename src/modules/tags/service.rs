use anyhow::anyhow;
use eduzas_core::{AppError, Paginated};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::tags::{CreateTagDto, Tag, TagCriteria, normalize_tag};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::utils::db::conflict_on_unique;

pub struct TagService;

impl TagService {
    #[instrument(skip(db))]
    pub async fn create_tag(db: &PgPool, dto: CreateTagDto) -> Result<Tag, AppError> {
        let text = normalize_tag(&dto.text)
            .ok_or_else(|| AppError::bad_request(anyhow!("Invalid tag")))?;

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (text) VALUES ($1) RETURNING text, created_at",
        )
        .bind(&text)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Tag already exists"))?;

        info!(tag = %tag.text, "Tag created");
        Ok(tag)
    }

    #[instrument(skip(db))]
    pub async fn search_tags(db: &PgPool, criteria: TagCriteria) -> Result<Paginated<Tag>, AppError> {
        let mut filters = Filters::new();
        filters.where_string_query("t.text", criteria.text.as_ref());

        let page = fetch_page::<Tag>(
            db,
            "SELECT t.text, t.created_at FROM tags t",
            "SELECT COUNT(*) FROM tags t",
            &filters,
            "t.text",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    /// Deleting a tag also removes it from every contact.
    #[instrument(skip(db))]
    pub async fn delete_tag(db: &PgPool, text: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE text = $1")
            .bind(text.trim())
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Tag not found")));
        }

        info!(tag = %text, "Tag deleted");
        Ok(())
    }
}
