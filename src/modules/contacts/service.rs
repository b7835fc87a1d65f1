use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_core::{AppError, Paginated};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::contacts::{
    AddContactTagDto, Contact, ContactCriteria, CreateContactDto, UpdateContactDto,
};
use eduzas_models::tags::normalize_tag;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::{conflict_on_unique, map_insert_error};

const CONTACT_SELECT: &str = "SELECT c.agenda_owner_id, c.user_id, c.alias, c.notes, u.email,
        ARRAY(SELECT ct.tag FROM contact_tags ct
              WHERE ct.agenda_owner_id = c.agenda_owner_id AND ct.user_id = c.user_id
              ORDER BY ct.tag) AS tags,
        c.created_at, c.modified_at
     FROM contacts c
     JOIN users u ON u.id = c.user_id";

const CONTACT_COUNT: &str = "SELECT COUNT(*) FROM contacts c";

const HAS_ALL_TAGS: &str = "NOT EXISTS (SELECT 1 FROM unnest(";
const HAS_ALL_TAGS_END: &str = "::text[]) AS wanted(tag)
     WHERE NOT EXISTS (SELECT 1 FROM contact_tags ct
                       WHERE ct.agenda_owner_id = c.agenda_owner_id
                         AND ct.user_id = c.user_id
                         AND ct.tag = wanted.tag))";

pub struct ContactService;

/// Trimmed, de-duplicated tags; invalid entries are dropped.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = tags.iter().filter_map(|t| normalize_tag(t)).collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    agenda_owner_id: Uuid,
    user_id: Uuid,
    tags: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tags (text) SELECT unnest($1::text[]) ON CONFLICT DO NOTHING")
        .bind(tags)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO contact_tags (agenda_owner_id, user_id, tag)
         SELECT $1, $2, unnest($3::text[])
         ON CONFLICT DO NOTHING",
    )
    .bind(agenda_owner_id)
    .bind(user_id)
    .bind(tags)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl ContactService {
    #[instrument(skip(db))]
    pub async fn get_contact(
        db: &PgPool,
        agenda_owner_id: Uuid,
        user_id: Uuid,
    ) -> Result<Contact, AppError> {
        sqlx::query_as::<_, Contact>(&format!(
            "{} WHERE c.agenda_owner_id = $1 AND c.user_id = $2",
            CONTACT_SELECT
        ))
        .bind(agenda_owner_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Contact not found")))
    }

    /// Adds `dto.user_id` to the caller's agenda, creating unknown tags.
    #[instrument(skip(db, dto), fields(user_id = %dto.user_id))]
    pub async fn create_contact(
        db: &PgPool,
        agenda_owner_id: Uuid,
        dto: CreateContactDto,
    ) -> Result<Contact, AppError> {
        if dto.user_id == agenda_owner_id {
            return Err(AppError::bad_request(anyhow!(
                "You cannot add yourself as a contact"
            )));
        }

        let tags = normalize_tags(&dto.tags);
        let mut tx = db.begin().await?;

        sqlx::query(
            "INSERT INTO contacts (agenda_owner_id, user_id, alias, notes) VALUES ($1, $2, $3, $4)",
        )
        .bind(agenda_owner_id)
        .bind(dto.user_id)
        .bind(dto.alias.trim())
        .bind(trimmed(dto.notes))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "Contact already exists", "User not found"))?;

        if !tags.is_empty() {
            attach_tags(&mut tx, agenda_owner_id, dto.user_id, &tags).await?;
        }

        tx.commit().await?;

        info!(agenda_owner_id = %agenda_owner_id, tags = tags.len(), "Contact created");
        Self::get_contact(db, agenda_owner_id, dto.user_id).await
    }

    /// Non-admins always search their own agenda.
    #[instrument(skip(db))]
    pub async fn search_contacts(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        criteria: ContactCriteria,
    ) -> Result<Paginated<Contact>, AppError> {
        let agenda_owner_id = if caller_role.is_admin() {
            criteria.agenda_owner_id
        } else {
            Some(caller_id)
        };
        // A tag no contact can carry matches nothing.
        let tags = match criteria.tags.as_deref() {
            Some(requested) if requested.iter().any(|t| normalize_tag(t).is_none()) => {
                return Ok(Paginated::empty(&criteria.pagination));
            }
            Some(requested) => Some(normalize_tags(requested)).filter(|tags| !tags.is_empty()),
            None => None,
        };

        let mut filters = Filters::new();
        filters
            .where_optional("c.agenda_owner_id", agenda_owner_id)
            .where_string_query("c.alias", criteria.alias.as_ref())
            .where_bound_optional(HAS_ALL_TAGS, tags, HAS_ALL_TAGS_END);

        let page = fetch_page::<Contact>(
            db,
            CONTACT_SELECT,
            CONTACT_COUNT,
            &filters,
            "c.alias, c.user_id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn update_contact(
        db: &PgPool,
        agenda_owner_id: Uuid,
        user_id: Uuid,
        dto: UpdateContactDto,
    ) -> Result<Contact, AppError> {
        let contact = Self::get_contact(db, agenda_owner_id, user_id).await?;
        let alias = dto
            .alias
            .map(|v| v.trim().to_string())
            .unwrap_or(contact.alias);
        let notes = match dto.notes {
            Some(value) => trimmed(value),
            None => contact.notes,
        };

        sqlx::query(
            "UPDATE contacts SET alias = $1, notes = $2, modified_at = NOW()
             WHERE agenda_owner_id = $3 AND user_id = $4",
        )
        .bind(&alias)
        .bind(&notes)
        .bind(agenda_owner_id)
        .bind(user_id)
        .execute(db)
        .await?;

        Self::get_contact(db, agenda_owner_id, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_contact(
        db: &PgPool,
        agenda_owner_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contacts WHERE agenda_owner_id = $1 AND user_id = $2")
            .bind(agenda_owner_id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Contact not found")));
        }

        info!(agenda_owner_id = %agenda_owner_id, user_id = %user_id, "Contact deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn add_tag(
        db: &PgPool,
        agenda_owner_id: Uuid,
        user_id: Uuid,
        dto: AddContactTagDto,
    ) -> Result<Contact, AppError> {
        let tag = normalize_tag(&dto.tag)
            .ok_or_else(|| AppError::bad_request(anyhow!("Invalid tag")))?;

        // 404 before touching the tags table.
        Self::get_contact(db, agenda_owner_id, user_id).await?;

        let mut tx = db.begin().await?;

        sqlx::query("INSERT INTO tags (text) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(&tag)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO contact_tags (agenda_owner_id, user_id, tag) VALUES ($1, $2, $3)")
            .bind(agenda_owner_id)
            .bind(user_id)
            .bind(&tag)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "Contact already has this tag"))?;

        tx.commit().await?;

        Self::get_contact(db, agenda_owner_id, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn remove_tag(
        db: &PgPool,
        agenda_owner_id: Uuid,
        user_id: Uuid,
        tag: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM contact_tags WHERE agenda_owner_id = $1 AND user_id = $2 AND tag = $3",
        )
        .bind(agenda_owner_id)
        .bind(user_id)
        .bind(tag.trim())
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Contact does not have this tag")));
        }
        Ok(())
    }
}
