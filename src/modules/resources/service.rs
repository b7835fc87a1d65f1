use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_auth::policy::{
    SearchScope, can_assign_to_class, can_create_content, can_manage_owned, can_moderate_class,
    can_view_class, scope_for,
};
use eduzas_core::{AppError, Paginated, PaginationParams};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::resources::{
    AssignResourceDto, ClassResource, CreateResourceDto, Resource, ResourceCriteria,
    ResourceInClass, UpdateResourceDto,
};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::class_access;
use crate::modules::users::service::UserService;
use crate::utils::db::map_insert_error;

const SHARED_WITH_STUDENT: &str = "EXISTS (SELECT 1 FROM class_resources cr
     JOIN class_students cs ON cs.class_id = cr.class_id
     WHERE cr.resource_id = r.id AND NOT cr.hidden AND cs.student_id = ";
const ATTACHED_TO_CLASS: &str =
    "EXISTS (SELECT 1 FROM class_resources cr WHERE cr.resource_id = r.id AND cr.class_id = ";

pub struct ResourceService;

impl ResourceService {
    async fn fetch_resource(db: &PgPool, id: Uuid) -> Result<Resource, AppError> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Resource not found")))
    }

    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_resource(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        dto: CreateResourceDto,
    ) -> Result<Resource, AppError> {
        if !can_create_content(caller_role) {
            return Err(AppError::forbidden("Only professors and admins can create resources"));
        }

        let professor_id = match (caller_role, dto.professor_id) {
            (Role::Admin, Some(professor_id)) => {
                UserService::ensure_role(db, professor_id, Role::Professor).await?;
                professor_id
            }
            (Role::Admin, None) => {
                return Err(AppError::bad_request(anyhow!(
                    "professor_id is required when an admin creates a resource"
                )));
            }
            _ => caller_id,
        };

        let resource = sqlx::query_as::<_, Resource>(
            "INSERT INTO resources (title, color, content, professor_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(dto.title.trim())
        .bind(dto.color.unwrap_or_default())
        .bind(Json(&dto.content))
        .bind(professor_id)
        .fetch_one(db)
        .await?;

        info!(resource_id = %resource.id, professor_id = %professor_id, "Resource created");
        Ok(resource)
    }

    #[instrument(skip(db))]
    pub async fn search_resources(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        criteria: ResourceCriteria,
    ) -> Result<Paginated<Resource>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_string_query("r.title", criteria.title.as_ref())
            .where_optional("r.active", criteria.active);

        match scope_for(caller_role, caller_id) {
            SearchScope::Student(student_id) => {
                match criteria.class_id {
                    Some(class_id) => filters.where_bound_pair(
                        SHARED_WITH_STUDENT,
                        student_id,
                        " AND cr.class_id = ",
                        class_id,
                        ")",
                    ),
                    None => filters.where_bound(SHARED_WITH_STUDENT, student_id, ")"),
                };
                filters.where_optional("r.professor_id", criteria.professor_id);
            }
            SearchScope::Professor(professor_id) => {
                filters
                    .where_optional("r.professor_id", Some(professor_id))
                    .where_bound_optional(ATTACHED_TO_CLASS, criteria.class_id, ")");
            }
            SearchScope::Everything => {
                filters
                    .where_optional("r.professor_id", criteria.professor_id)
                    .where_bound_optional(ATTACHED_TO_CLASS, criteria.class_id, ")");
            }
        }

        let page = fetch_page::<Resource>(
            db,
            "SELECT r.* FROM resources r",
            "SELECT COUNT(*) FROM resources r",
            &filters,
            "r.created_at DESC, r.id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn get_resource(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<Resource, AppError> {
        let resource = Self::fetch_resource(db, id).await?;
        if can_manage_owned(caller_role, resource.professor_id == caller_id) {
            return Ok(resource);
        }

        let shared: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM class_resources cr
                 JOIN class_students cs ON cs.class_id = cr.class_id
                 WHERE cr.resource_id = $1 AND NOT cr.hidden AND cs.student_id = $2
             )",
        )
        .bind(id)
        .bind(caller_id)
        .fetch_one(db)
        .await?;

        if !shared {
            return Err(AppError::forbidden("You cannot view this resource"));
        }
        Ok(resource)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_resource(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
        dto: UpdateResourceDto,
    ) -> Result<Resource, AppError> {
        let resource = Self::fetch_resource(db, id).await?;
        if !can_manage_owned(caller_role, resource.professor_id == caller_id) {
            return Err(AppError::forbidden("Only the owner of the resource can update it"));
        }

        let resource = sqlx::query_as::<_, Resource>(
            "UPDATE resources
             SET title = $1, color = $2, content = $3, active = $4, modified_at = NOW()
             WHERE id = $5
             RETURNING *",
        )
        .bind(
            dto.title
                .map(|v| v.trim().to_string())
                .unwrap_or(resource.title),
        )
        .bind(dto.color.unwrap_or(resource.color))
        .bind(dto.content.map(Json).unwrap_or(resource.content))
        .bind(dto.active.unwrap_or(resource.active))
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(resource)
    }

    #[instrument(skip(db))]
    pub async fn delete_resource(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<(), AppError> {
        let resource = Self::fetch_resource(db, id).await?;
        if !can_manage_owned(caller_role, resource.professor_id == caller_id) {
            return Err(AppError::forbidden("Only the owner of the resource can delete it"));
        }

        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        info!(resource_id = %id, "Resource deleted");
        Ok(())
    }

    async fn authorize_attachment(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        resource_id: Uuid,
        class_id: &str,
    ) -> Result<(), AppError> {
        let resource = Self::fetch_resource(db, resource_id).await?;
        let access = class_access(db, class_id, caller_id).await?;
        if !can_assign_to_class(caller_role, resource.professor_id == caller_id, access) {
            return Err(AppError::forbidden(
                "Only the owner of the resource who teaches the class can do this",
            ));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn attach_to_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        resource_id: Uuid,
        dto: AssignResourceDto,
    ) -> Result<ClassResource, AppError> {
        Self::authorize_attachment(db, caller_id, caller_role, resource_id, &dto.class_id).await?;

        let attachment = sqlx::query_as::<_, ClassResource>(
            "INSERT INTO class_resources (resource_id, class_id, hidden) VALUES ($1, $2, $3)
             RETURNING resource_id, class_id, hidden, created_at",
        )
        .bind(resource_id)
        .bind(&dto.class_id)
        .bind(dto.hidden)
        .fetch_one(db)
        .await
        .map_err(|e| {
            map_insert_error(e, "Resource is already shared with this class", "Class not found")
        })?;

        info!(resource_id = %resource_id, class_id = %dto.class_id, "Resource shared with class");
        Ok(attachment)
    }

    #[instrument(skip(db))]
    pub async fn set_hidden(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        resource_id: Uuid,
        class_id: &str,
        hidden: bool,
    ) -> Result<ClassResource, AppError> {
        Self::authorize_attachment(db, caller_id, caller_role, resource_id, class_id).await?;

        sqlx::query_as::<_, ClassResource>(
            "UPDATE class_resources SET hidden = $1 WHERE resource_id = $2 AND class_id = $3
             RETURNING resource_id, class_id, hidden, created_at",
        )
        .bind(hidden)
        .bind(resource_id)
        .bind(class_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Resource is not shared with this class")))
    }

    #[instrument(skip(db))]
    pub async fn detach_from_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        resource_id: Uuid,
        class_id: &str,
    ) -> Result<(), AppError> {
        Self::authorize_attachment(db, caller_id, caller_role, resource_id, class_id).await?;

        let result =
            sqlx::query("DELETE FROM class_resources WHERE resource_id = $1 AND class_id = $2")
                .bind(resource_id)
                .bind(class_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Resource is not shared with this class")));
        }
        Ok(())
    }

    /// Resources of a class. Students do not get hidden ones.
    #[instrument(skip(db))]
    pub async fn list_class_resources(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        pagination: PaginationParams,
    ) -> Result<Paginated<ResourceInClass>, AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_view_class(caller_role, access) {
            return Err(AppError::forbidden("You are not a member of this class"));
        }

        let mut filters = Filters::new();
        filters.where_bound("cr.class_id = ", class_id, "");
        if !can_moderate_class(caller_role, access) {
            filters.where_fixed("NOT cr.hidden");
        }

        let page = fetch_page::<ResourceInClass>(
            db,
            "SELECT r.*, cr.hidden FROM resources r JOIN class_resources cr ON cr.resource_id = r.id",
            "SELECT COUNT(*) FROM resources r JOIN class_resources cr ON cr.resource_id = r.id",
            &filters,
            "cr.created_at DESC, r.id",
            &pagination,
        )
        .await?;

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::classes::service::ClassService;
    use axum::http::StatusCode;
    use eduzas_models::Email;
    use eduzas_models::classes::CreateClassDto;
    use eduzas_models::users::{CreateUserDto, User};
    use serde_json::json;

    async fn user(pool: &PgPool, email: &str, role: Role) -> User {
        UserService::create_user(
            pool,
            CreateUserDto {
                email: Email::new(email).unwrap(),
                password: "password123".to_string(),
                first_name: "Test".to_string(),
                mid_name: None,
                father_lastname: "User".to_string(),
                mother_lastname: None,
                role,
            },
        )
        .await
        .unwrap()
    }

    fn resource_dto(title: &str, professor_id: Option<Uuid>) -> CreateResourceDto {
        CreateResourceDto {
            title: title.to_string(),
            color: None,
            content: json!({"links": ["https://example.com/notes.pdf"]}),
            professor_id,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_hidden_resources_are_not_shared(pool: PgPool) {
        let prof = user(&pool, "prof@example.com", Role::Professor).await;
        let student = user(&pool, "student@example.com", Role::Student).await;
        let class = ClassService::create_class(
            &pool,
            prof.id,
            Role::Professor,
            CreateClassDto {
                class_name: "Literature".to_string(),
                subject: None,
                section: None,
                color: None,
                owner_id: None,
            },
        )
        .await
        .unwrap();
        ClassService::enroll_student(&pool, student.id, Role::Student, &class.id, Default::default())
            .await
            .unwrap();

        let resource = ResourceService::create_resource(&pool, prof.id, Role::Professor, resource_dto("Notes", None))
            .await
            .unwrap();
        ResourceService::attach_to_class(
            &pool,
            prof.id,
            Role::Professor,
            resource.id,
            AssignResourceDto {
                class_id: class.id.clone(),
                hidden: true,
            },
        )
        .await
        .unwrap();

        let err = ResourceService::get_resource(&pool, student.id, Role::Student, resource.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        ResourceService::set_hidden(&pool, prof.id, Role::Professor, resource.id, &class.id, false)
            .await
            .unwrap();
        let seen = ResourceService::get_resource(&pool, student.id, Role::Student, resource.id)
            .await
            .unwrap();
        assert_eq!(seen.title, "Notes");

        let listed = ResourceService::list_class_resources(&pool, student.id, Role::Student, &class.id, Default::default())
            .await
            .unwrap();
        assert_eq!(listed.meta.total, 1);
        assert!(!listed.data[0].hidden);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_student_class_filter_requires_enrollment(pool: PgPool) {
        let prof = user(&pool, "prof@example.com", Role::Professor).await;
        let student = user(&pool, "student@example.com", Role::Student).await;
        let mut classes = Vec::new();
        for name in ["Literature", "History"] {
            let class = ClassService::create_class(
                &pool,
                prof.id,
                Role::Professor,
                CreateClassDto {
                    class_name: name.to_string(),
                    subject: None,
                    section: None,
                    color: None,
                    owner_id: None,
                },
            )
            .await
            .unwrap();
            classes.push(class.id);
        }
        ClassService::enroll_student(&pool, student.id, Role::Student, &classes[0], Default::default())
            .await
            .unwrap();

        let resource = ResourceService::create_resource(&pool, prof.id, Role::Professor, resource_dto("Reading list", None))
            .await
            .unwrap();
        for class_id in &classes {
            ResourceService::attach_to_class(
                &pool,
                prof.id,
                Role::Professor,
                resource.id,
                AssignResourceDto {
                    class_id: class_id.clone(),
                    hidden: false,
                },
            )
            .await
            .unwrap();
        }

        let criteria: ResourceCriteria =
            serde_json::from_value(json!({ "class_id": classes[1] })).unwrap();
        let page = ResourceService::search_resources(&pool, student.id, Role::Student, criteria)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);

        let criteria: ResourceCriteria =
            serde_json::from_value(json!({ "class_id": classes[0] })).unwrap();
        let page = ResourceService::search_resources(&pool, student.id, Role::Student, criteria)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_admin_creates_for_professor(pool: PgPool) {
        let admin = user(&pool, "admin@example.com", Role::Admin).await;
        let prof = user(&pool, "prof@example.com", Role::Professor).await;

        let err = ResourceService::create_resource(&pool, admin.id, Role::Admin, resource_dto("Slides", None))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let resource = ResourceService::create_resource(&pool, admin.id, Role::Admin, resource_dto("Slides", Some(prof.id)))
            .await
            .unwrap();
        assert_eq!(resource.professor_id, prof.id);
        assert_eq!(resource.color.as_str(), "#007BFF");
    }
}
